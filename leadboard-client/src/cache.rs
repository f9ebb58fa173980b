use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Lead,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagId {
    /// Every list query of the entity kind.
    List,
    Id(String),
}

/// Invalidation tag: entity kind plus id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: EntityKind,
    pub id: TagId,
}

impl Tag {
    pub fn lead(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Lead,
            id: TagId::Id(id.into()),
        }
    }

    pub fn lead_list() -> Self {
        Self {
            kind: EntityKind::Lead,
            id: TagId::List,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            EntityKind::Lead => "Lead",
        };
        match &self.id {
            TagId::List => write!(f, "{}:LIST", kind),
            TagId::Id(id) => write!(f, "{}:{}", kind, id),
        }
    }
}

/// Handed out when a fetch starts; a response is only stored if none of its
/// tags were invalidated after the ticket was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
}

#[derive(Clone)]
struct CachedEntry<V> {
    value: V,
    tags: HashSet<Tag>,
    fetched_at: DateTime<Utc>,
}

struct CacheState<K, V> {
    entries: HashMap<K, CachedEntry<V>>,
    invalidated_at: HashMap<Tag, u64>,
    /// Outstanding tickets per epoch.
    pending: BTreeMap<u64, usize>,
    epoch: u64,
}

impl<K, V> CacheState<K, V> {
    fn release(&mut self, ticket: FetchTicket) {
        if let Some(count) = self.pending.get_mut(&ticket.epoch) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(&ticket.epoch);
            }
        }
        self.prune_invalidations();
    }

    /// An invalidation only matters to tickets issued before it.
    fn prune_invalidations(&mut self) {
        let oldest = self.pending.keys().next().copied().unwrap_or(self.epoch);
        self.invalidated_at.retain(|_, epoch| *epoch > oldest);
    }
}

/// Read-through query cache with tag based invalidation.
///
/// Cached values are never patched in place: writers invalidate tags and the
/// next reader refetches.
pub struct QueryCache<K, V> {
    state: Arc<Mutex<CacheState<K, V>>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> QueryCache<K, V> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                invalidated_at: HashMap::new(),
                pending: BTreeMap::new(),
                epoch: 0,
            })),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub async fn query(&self, key: &K) -> Option<V> {
        let state = self.state.lock().await;
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    /// When the cached value for `key` was fetched, if present.
    pub async fn fetched_at(&self, key: &K) -> Option<DateTime<Utc>> {
        let state = self.state.lock().await;
        state.entries.get(key).map(|entry| entry.fetched_at)
    }

    /// Every ticket must end in [`QueryCache::store`] or [`QueryCache::abandon`].
    pub async fn begin_fetch(&self) -> FetchTicket {
        let mut state = self.state.lock().await;
        let epoch = state.epoch;
        *state.pending.entry(epoch).or_insert(0) += 1;
        FetchTicket { epoch }
    }

    /// Releases the ticket of a fetch that failed.
    pub async fn abandon(&self, ticket: FetchTicket) {
        self.state.lock().await.release(ticket);
    }

    /// Stores a fetched value. Returns `false` and drops the value when one of
    /// `tags` was invalidated after `ticket` was issued.
    pub async fn store(
        &self,
        key: K,
        ticket: FetchTicket,
        value: V,
        tags: impl IntoIterator<Item = Tag>,
    ) -> bool {
        let mut state = self.state.lock().await;
        let tags: HashSet<Tag> = tags.into_iter().collect();

        let stale = tags.iter().any(|tag| {
            state
                .invalidated_at
                .get(tag)
                .is_some_and(|epoch| *epoch > ticket.epoch)
        });
        state.release(ticket);
        if stale {
            return false;
        }

        state.entries.insert(
            key,
            CachedEntry {
                value,
                tags,
                fetched_at: Utc::now(),
            },
        );
        true
    }

    /// Drops every entry carrying one of `tags`. Returns the number of entries removed.
    pub async fn invalidate(&self, tags: &[Tag]) -> usize {
        let mut state = self.state.lock().await;
        state.epoch += 1;
        let epoch = state.epoch;
        for tag in tags {
            state.invalidated_at.insert(tag.clone(), epoch);
        }
        state.prune_invalidations();

        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| !tags.iter().any(|tag| entry.tags.contains(tag)));
        before - state.entries.len()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
