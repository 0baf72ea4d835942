//! In-process cache of key hashes confirmed valid

use std::time::{Duration, Instant};

use dashmap::DashSet;
use parking_lot::RwLock;

/// Set of key hashes known to be valid, with a staleness clock
///
/// Only hashes that passed a store check are inserted. A stale cache is
/// refreshed in place: the clock resets and the contents are kept.
pub struct ApiKeyCache {
    valid: DashSet<String>,
    last_refresh: RwLock<Instant>,
    staleness: Duration,
}

impl ApiKeyCache {
    pub fn new(staleness: Duration) -> Self {
        Self {
            valid: DashSet::new(),
            last_refresh: RwLock::new(Instant::now()),
            staleness,
        }
    }

    /// Whether `key_hash` is cached as valid
    pub fn contains(&self, key_hash: &str) -> bool {
        if self.is_stale() {
            self.refresh();
        }
        self.valid.contains(key_hash)
    }

    pub fn insert(&self, key_hash: impl Into<String>) {
        self.valid.insert(key_hash.into());
    }

    /// Evict a hash; returns whether it was cached
    pub fn remove(&self, key_hash: &str) -> bool {
        self.valid.remove(key_hash).is_some()
    }

    pub fn is_stale(&self) -> bool {
        self.last_refresh.read().elapsed() >= self.staleness
    }

    /// Reset the staleness clock
    pub fn refresh(&self) {
        *self.last_refresh.write() = Instant::now();
        tracing::trace!(cached = self.valid.len(), "API key cache refreshed");
    }

    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_contains_remove() {
        let cache = ApiKeyCache::new(Duration::from_secs(300));
        assert!(!cache.contains("h1"));

        cache.insert("h1");
        assert!(cache.contains("h1"));
        assert_eq!(cache.len(), 1);

        assert!(cache.remove("h1"));
        assert!(!cache.remove("h1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stale_refresh_keeps_entries() {
        let cache = ApiKeyCache::new(Duration::from_millis(200));
        cache.insert("h1");
        std::thread::sleep(Duration::from_millis(250));
        assert!(cache.is_stale());

        // Lookup on a stale cache resets the clock and keeps entries
        assert!(cache.contains("h1"));
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_refresh_resets_clock() {
        let cache = ApiKeyCache::new(Duration::from_secs(300));
        assert!(!cache.is_stale());
        cache.refresh();
        assert!(!cache.is_stale());
    }
}
