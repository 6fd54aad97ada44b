//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Counters ==
/// Live counters shared by all threads using a cache.
///
/// Relaxed atomics: the numbers are statistics, never inputs to a decision.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    lookups: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub(crate) fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub(crate) fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub(crate) fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.lookups.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters into a [`CacheStats`] value.
    pub(crate) fn snapshot(&self, capacity: Option<usize>, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits(),
            misses: self.misses(),
            lookups: self.lookups(),
            evictions: self.evictions(),
            capacity,
            total_entries,
        }
    }
}

// == Cache Stats ==
/// Point-in-time copy of a cache's performance metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of retrievals attempted
    pub lookups: u64,
    /// Number of live entries evicted to make room for new keys
    pub evictions: u64,
    /// Fixed capacity, None for unbounded caches
    pub capacity: Option<usize>,
    /// Current number of entries in the lookup table
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
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
    fn test_counters_new() {
        let stats = StatsCounters::new().snapshot(Some(8), 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.lookups, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.capacity, Some(8));
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = StatsCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.snapshot(None, 0).hit_rate(), 0.75);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let counters = StatsCounters::new();
        counters.record_lookup();
        counters.record_hit();
        counters.record_miss();
        counters.record_eviction();
        counters.reset();
        let expected = CacheStats {
            capacity: Some(1),
            ..CacheStats::default()
        };
        assert_eq!(counters.snapshot(Some(1), 0), expected);
    }
}
