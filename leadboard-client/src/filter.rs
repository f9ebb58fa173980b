use shared_types::{Lead, LeadPriority, LeadStage, ListLeadsQuery, Pagination};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Filter and pagination state of the lead views.
///
/// Immutable: every setter returns a new filter. Changing any filter
/// dimension resets the offset to the first page, so an old offset can never
/// point past the new result count. Only the page navigation methods move
/// the offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeadFilter {
    search: Option<String>,
    source: Option<String>,
    stage: Option<LeadStage>,
    priority: Option<LeadPriority>,
    offset: u32,
    limit: u32,
}

impl Default for LeadFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LeadFilter {
    pub fn new(limit: u32) -> Self {
        Self {
            search: None,
            source: None,
            stage: None,
            priority: None,
            offset: 0,
            limit: limit.max(1),
        }
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn stage(&self) -> Option<LeadStage> {
        self.stage
    }

    pub fn priority(&self) -> Option<LeadPriority> {
        self.priority
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn with_search(&self, search: Option<String>) -> Self {
        Self {
            search: non_empty(search),
            offset: 0,
            ..self.clone()
        }
    }

    pub fn with_source(&self, source: Option<String>) -> Self {
        Self {
            source: non_empty(source),
            offset: 0,
            ..self.clone()
        }
    }

    pub fn with_stage(&self, stage: Option<LeadStage>) -> Self {
        Self {
            stage,
            offset: 0,
            ..self.clone()
        }
    }

    pub fn with_priority(&self, priority: Option<LeadPriority>) -> Self {
        Self {
            priority,
            offset: 0,
            ..self.clone()
        }
    }

    pub fn with_limit(&self, limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            offset: 0,
            ..self.clone()
        }
    }

    /// Drops every filter dimension, keeping the page size.
    pub fn cleared(&self) -> Self {
        Self::new(self.limit)
    }

    pub fn is_active(&self) -> bool {
        self.search.is_some()
            || self.source.is_some()
            || self.stage.is_some()
            || self.priority.is_some()
    }

    pub fn with_offset(&self, offset: u32) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    /// Next page, if `pagination` says there is one.
    pub fn next_page(&self, pagination: &Pagination) -> Option<Self> {
        let next = self.offset.saturating_add(self.limit);
        (next < pagination.total).then(|| self.with_offset(next))
    }

    pub fn prev_page(&self) -> Option<Self> {
        (self.offset > 0).then(|| self.with_offset(self.offset.saturating_sub(self.limit)))
    }

    pub fn to_query(&self) -> ListLeadsQuery {
        ListLeadsQuery {
            search: self.search.clone(),
            source: self.source.clone(),
            stage: self.stage,
            priority: self.priority,
            offset: self.offset,
            limit: self.limit,
        }
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        self.to_query().matches(lead)
    }

    /// Client-side filtering that keeps the input order.
    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        let query = self.to_query();
        leads.iter().filter(|lead| query.matches(lead)).collect()
    }
}
