//! Local Tier Statistics Module
//!
//! Tracks per-group local-tier activity: lookups, hits, misses, writes and deletes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stat Counters ==
/// Lock-free counters owned by one TTL store group.
#[derive(Debug, Default)]
pub struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
}

impl StatCounters {
    /// Creates counters starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the miss counter (absent or stale entry).
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the write counter.
    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the delete counter.
    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self, entries: usize) -> LocalStats {
        LocalStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            entries,
        }
    }
}

// == Local Stats ==
/// Snapshot of one group's local-tier activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocalStats {
    /// Lookups that returned a fresh entry
    pub hits: u64,
    /// Lookups that found nothing or only a stale entry
    pub misses: u64,
    /// Writes (fill-on-read and explicit sets)
    pub sets: u64,
    /// Delete calls, whether or not an entry was present
    pub deletes: u64,
    /// Entries currently held, stale ones included
    pub entries: usize,
}

impl LocalStats {
    /// Total number of lookups.
    pub fn gets(&self) -> u64 {
        self.hits + self.misses
    }

    /// Total number of calls of any kind.
    pub fn operations(&self) -> u64 {
        self.gets() + self.sets + self.deletes
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.gets();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = StatCounters::new().snapshot(0);
        assert_eq!(stats, LocalStats::default());
        assert_eq!(stats.operations(), 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = StatCounters::new().snapshot(0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = StatCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();

        let stats = counters.snapshot(3);
        assert_eq!(stats.gets(), 4);
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.entries, 3);
    }

    #[test]
    fn test_operations_counts_everything() {
        let counters = StatCounters::new();
        counters.record_miss();
        counters.record_set();
        counters.record_delete();
        counters.record_delete();

        let stats = counters.snapshot(0);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.deletes, 2);
        assert_eq!(stats.operations(), 4);
    }
}
