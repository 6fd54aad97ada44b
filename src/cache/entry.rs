//! Cache Entry Module
//!
//! Defines the lookup-table entries for the CLOCK caches.

use std::fmt;
use std::time::Duration;

// == Slot ==
/// Position in a cache's fixed-size slot arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(usize);

impl Slot {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the array index of this slot.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

// == Cache Entry ==
/// Entry of a [`ClockCache`](crate::cache::ClockCache): the slot holding the
/// key and the stored value.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub slot: Slot,
    pub value: V,
}

impl<V> CacheEntry<V> {
    pub fn new(slot: Slot, value: V) -> Self {
        Self { slot, value }
    }
}

// == Expiring Entry ==
/// Entry of an [`ExpiringClockCache`](crate::cache::ExpiringClockCache).
#[derive(Debug, Clone)]
pub struct ExpiringEntry<V> {
    /// Slot holding the key
    pub slot: Slot,
    /// The stored value
    pub value: V,
    /// Absolute expiration time (since the Unix epoch)
    pub expires_at: Duration,
}

impl<V> ExpiringEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `timeout` after `now`.
    ///
    /// # Arguments
    /// * `slot` - Slot holding the key
    /// * `value` - The value to store
    /// * `now` - Current absolute time
    /// * `timeout` - Lifetime of the entry; saturates instead of overflowing
    pub fn new(slot: Slot, value: V, now: Duration, timeout: Duration) -> Self {
        Self {
            slot,
            value,
            expires_at: now.saturating_add(timeout),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is live only while `now` is strictly before its expiration
    /// time, so a zero timeout produces an entry that is already expired.
    pub fn is_expired(&self, now: Duration) -> bool {
        now >= self.expires_at
    }

    /// Returns remaining lifetime at `now`, zero once expired.
    pub fn ttl_remaining(&self, now: Duration) -> Duration {
        self.expires_at.saturating_sub(now)
    }
}
