//! Keyed TTL cache over an injected clock.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Cache entry with the time it was stored
#[derive(Debug)]
struct CacheEntry<V> {
    value: Arc<V>,
    inserted_at: u64,
    ttl_secs: u64,
}

impl<V> CacheEntry<V> {
    /// Fresh while `now - inserted_at < ttl`. A clock that moved backwards
    /// past the insert time makes the entry stale.
    fn is_fresh(&self, now: u64) -> bool {
        now.checked_sub(self.inserted_at)
            .is_some_and(|age| age < self.ttl_secs)
    }
}

/// Concurrent cache of shared values with a single time-to-live.
///
/// Stale entries are treated as absent and dropped on the next lookup.
/// Values are handed out as `Arc`s, so a reader keeps its snapshot even if
/// the entry is replaced or invalidated meanwhile.
#[derive(Debug)]
pub struct TtlCache<V> {
    name: &'static str,
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V> TtlCache<V> {
    /// Create an empty cache. `name` only appears in logs.
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Time-to-live of new entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &str, now: u64) -> Option<Arc<V>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_fresh(now) {
                return Some(Arc::clone(&entry.value));
            }
            drop(entry);
            // Only evict if nobody refreshed it between the two lookups
            self.entries.remove_if(key, |_, e| !e.is_fresh(now));
            debug!(cache = self.name, key, "Evicted stale cache entry");
        }
        None
    }

    /// Store `value` under `key`, replacing any previous entry
    pub fn insert(&self, key: impl Into<String>, value: V, now: u64) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.insert(
            key.into(),
            CacheEntry {
                value: Arc::clone(&value),
                inserted_at: now,
                ttl_secs: self.ttl.as_secs(),
            },
        );
        value
    }

    /// Drop the entry for `key`. Returns true if one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self, now: u64) -> CacheStats {
        let total_entries = self.entries.len();
        let valid_entries = self.entries.iter().filter(|e| e.is_fresh(now)).count();
        CacheStats {
            total_entries,
            expired_entries: total_entries.saturating_sub(valid_entries),
            valid_entries,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of cache entries
    pub total_entries: usize,

    /// Number of expired entries
    pub expired_entries: usize,

    /// Number of valid entries
    pub valid_entries: usize,
}
