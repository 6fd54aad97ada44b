//! Cache Module
//!
//! Provides thread-shared caches that approximate LRU eviction with the
//! CLOCK (second-chance) algorithm, with and without expiration.

use std::time::Duration;

mod entry;
mod expiring;
mod lru;
mod ring;
mod stats;
mod unbounded;


// Re-export public types
pub use entry::{CacheEntry, ExpiringEntry, Slot};
pub use expiring::ExpiringClockCache;
pub use lru::ClockCache;
pub use stats::CacheStats;
pub use unbounded::UnboundedCache;

// == Public Constants ==
/// Probes the eviction scan makes before forcing out the slot under the hand
pub const MAX_SCAN_PROBES: usize = 107;

/// Default entry lifetime for expiring caches: 2^60 seconds, close enough to never
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1 << 60);

// == Cache Trait ==
/// Operations shared by every cache variant.
///
/// Implementations are safe to share between threads. Lookups and
/// invalidations report absence as a normal value; insertions never fail.
pub trait Cache<K, V>: Send + Sync {
    /// Returns a clone of the value stored for `key`, if any.
    fn get(&self, key: &K) -> Option<V>;

    /// Returns the value stored for `key`, or `default` when absent.
    fn get_or(&self, key: &K, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Stores `value` under `key`, evicting another entry if needed.
    fn put(&self, key: K, value: V);

    /// Removes `key`. Removing an absent key does nothing.
    fn invalidate(&self, key: &K);

    /// Removes every entry and resets the statistics.
    fn clear(&self);
}
