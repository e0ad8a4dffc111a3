//! Process-wide cache of rendered template results.
//!
//! When a chip unmounts, its last results are stored here under the hash of
//! its configuration. A chip mounted later with the same configuration shows
//! those results immediately instead of waiting for the backend.
//!
//! The store is bounded; inserting into a full cache evicts the entry that
//! was least recently read or written.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chipdeck_types::{FieldMap, TemplateResult};
use tracing::debug;

use crate::hash::ConfigHash;
use crate::utils::lock;

/// Default number of configurations kept.
pub const DEFAULT_CAPACITY: usize = 100;

/// Snapshot of every field's last result for one configuration.
pub type CachedResults = FieldMap<TemplateResult>;

struct Entry {
    results: CachedResults,
    last_used: u64,
}

struct LruStore {
    capacity: usize,
    /// Monotonic access counter
    clock: u64,
    entries: HashMap<ConfigHash, Entry>,
}

impl LruStore {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn least_recently_used(&self) -> Option<ConfigHash> {
        self.entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone())
    }
}

/// Bounded LRU store shared by handle between chip instances.
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<Mutex<LruStore>>,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` configurations.
    /// A capacity of zero disables caching.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            store: Arc::new(Mutex::new(LruStore {
                capacity,
                clock: 0,
                entries: HashMap::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            })),
        }
    }

    /// Look up results, marking the entry as recently used.
    #[must_use]
    pub fn get(&self, key: &ConfigHash) -> Option<CachedResults> {
        let mut store = lock(&self.store);
        let now = store.tick();
        let entry = store.entries.get_mut(key)?;
        entry.last_used = now;
        Some(entry.results.clone())
    }

    /// Check for an entry without touching its recency.
    #[must_use]
    pub fn contains(&self, key: &ConfigHash) -> bool {
        lock(&self.store).entries.contains_key(key)
    }

    /// Store results, returning the key evicted to make room, if any.
    pub fn put(&self, key: ConfigHash, results: CachedResults) -> Option<ConfigHash> {
        let mut store = lock(&self.store);
        if store.capacity == 0 {
            return None;
        }

        let now = store.tick();
        if let Some(entry) = store.entries.get_mut(&key) {
            entry.results = results;
            entry.last_used = now;
            return None;
        }

        let evicted = if store.entries.len() >= store.capacity {
            let oldest = store.least_recently_used();
            if let Some(oldest) = &oldest {
                store.entries.remove(oldest);
                debug!("Evicted cached template results for {}", oldest);
            }
            oldest
        } else {
            None
        };

        store.entries.insert(
            key,
            Entry {
                results,
                last_used: now,
            },
        );
        evicted
    }

    pub fn remove(&self, key: &ConfigHash) -> Option<CachedResults> {
        lock(&self.store)
            .entries
            .remove(key)
            .map(|entry| entry.results)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.store).entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.store).entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        lock(&self.store).capacity
    }

    pub fn clear(&self) {
        lock(&self.store).entries.clear();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = lock(&self.store);
        f.debug_struct("ResultCache")
            .field("capacity", &store.capacity)
            .field("len", &store.entries.len())
            .finish()
    }
}
