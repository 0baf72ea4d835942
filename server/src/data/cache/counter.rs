//! Expiring atomic counters keyed by string

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Sweep expired entries every this many increments
const INLINE_SWEEP_EVERY: u64 = 256;

struct CounterEntry {
    count: AtomicI64,
    expires_at: Instant,
}

/// Counter value and the instant its window closes
#[derive(Debug, Clone, Copy)]
pub struct CounterSnapshot {
    pub count: i64,
    pub expires_at: Instant,
}

/// Fixed-window counters
///
/// A counter starts at 1 on the first increment and resets once its window
/// has elapsed.
#[derive(Default)]
pub struct WindowCounters {
    counters: DashMap<String, CounterEntry>,
    ops: AtomicU64,
}

impl WindowCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `key`, opening a new window of `ttl` when none is live
    pub fn incr(&self, key: &str, ttl: Duration) -> CounterSnapshot {
        let now = Instant::now();

        let snapshot = match self.counters.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let counter = occupied.get_mut();
                if now >= counter.expires_at {
                    counter.count.store(1, Ordering::SeqCst);
                    counter.expires_at = now + ttl;
                    CounterSnapshot {
                        count: 1,
                        expires_at: counter.expires_at,
                    }
                } else {
                    CounterSnapshot {
                        count: counter.count.fetch_add(1, Ordering::SeqCst) + 1,
                        expires_at: counter.expires_at,
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let expires_at = now + ttl;
                vacant.insert(CounterEntry {
                    count: AtomicI64::new(1),
                    expires_at,
                });
                CounterSnapshot {
                    count: 1,
                    expires_at,
                }
            }
        };

        let ops = self.ops.fetch_add(1, Ordering::Relaxed);
        if ops > 0 && ops.is_multiple_of(INLINE_SWEEP_EVERY) {
            self.sweep();
        }

        snapshot
    }

    /// Drop expired counters; returns how many were removed
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.counters.len();
        self.counters.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.counters.len())
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incr_counts_within_window() {
        let counters = WindowCounters::new();
        let ttl = Duration::from_secs(60);
        assert_eq!(counters.incr("a", ttl).count, 1);
        assert_eq!(counters.incr("a", ttl).count, 2);
        assert_eq!(counters.incr("b", ttl).count, 1);
        assert_eq!(counters.len(), 2);
    }

    #[test]
    fn test_expired_window_resets() {
        let counters = WindowCounters::new();
        counters.incr("a", Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(counters.incr("a", Duration::from_secs(60)).count, 1);
    }

    #[test]
    fn test_sweep_removes_expired() {
        let counters = WindowCounters::new();
        counters.incr("old", Duration::from_millis(1));
        counters.incr("live", Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(counters.sweep(), 1);
        assert_eq!(counters.len(), 1);
        assert_eq!(counters.incr("live", Duration::from_secs(60)).count, 2);
    }
}
