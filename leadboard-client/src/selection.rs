use std::collections::BTreeSet;

/// Lead ids chosen for a bulk action. Independent of the active filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips one id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn all_selected<'a>(&self, listed: impl IntoIterator<Item = &'a str>) -> bool {
        let mut any = false;
        for id in listed {
            any = true;
            if !self.ids.contains(id) {
                return false;
            }
        }
        any
    }

    /// Select-all toggle: empties the set when every listed id is already
    /// selected, otherwise the set becomes exactly the listed ids.
    pub fn toggle_all<'a>(&mut self, listed: impl IntoIterator<Item = &'a str> + Clone) {
        if self.all_selected(listed.clone()) {
            self.ids.clear();
        } else {
            self.ids = listed.into_iter().map(str::to_string).collect();
        }
    }

    /// Drops ids missing from `listed`. Returns how many were pruned.
    pub fn retain_listed<'a>(&mut self, listed: impl IntoIterator<Item = &'a str>) -> usize {
        let listed: BTreeSet<&str> = listed.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| listed.contains(id.as_str()));
        before - self.ids.len()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The selected id when exactly one is selected.
    pub fn single(&self) -> Option<&str> {
        match self.ids.len() {
            1 => self.ids.iter().next().map(String::as_str),
            _ => None,
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}
