//! Expiring Clock Cache Module
//!
//! CLOCK cache whose entries carry an absolute expiration time.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::ring::{ReferenceFlags, SlotRing};
use crate::cache::stats::StatsCounters;
use crate::cache::{Cache, CacheStats, ExpiringEntry, DEFAULT_TIMEOUT, MAX_SCAN_PROBES};
use crate::error::{CacheError, Result};
use crate::time::{SystemTimeSource, TimeSource};

// == Expiring Clock Cache ==
/// Fixed-capacity CLOCK cache with per-entry expiration.
///
/// Expired entries read as absent and count as misses. They are not removed
/// by `get`; instead their slot is demoted so the next eviction scan that
/// reaches it reclaims it. There is no background sweeper.
///
/// Locking is the same as [`ClockCache`](crate::cache::ClockCache): `get` and
/// `invalidate` are lock-free, `put` and `clear` hold the cache mutex.
pub struct ExpiringClockCache<K, V> {
    /// Key to (slot, value, expires_at)
    data: DashMap<K, ExpiringEntry<V>>,
    ring: Mutex<SlotRing<K>>,
    referenced: ReferenceFlags,
    stats: StatsCounters,
    capacity: usize,
    /// Lifetime used when `put` is given no timeout
    default_timeout: Duration,
    clock: Arc<dyn TimeSource>,
}

impl<K, V> ExpiringClockCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructors ==
    /// Creates a cache whose entries live for [`DEFAULT_TIMEOUT`] unless a
    /// timeout is given per `put`.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidCapacity` if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_default_timeout(capacity, DEFAULT_TIMEOUT)
    }

    /// Creates a cache with the given default entry lifetime.
    pub fn with_default_timeout(capacity: usize, default_timeout: Duration) -> Result<Self> {
        Self::with_time_source(capacity, default_timeout, Arc::new(SystemTimeSource))
    }

    /// Creates a cache reading the current time from `clock`.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, at least 1
    /// * `default_timeout` - Lifetime used when `put` is given no timeout
    /// * `clock` - Absolute time source used to stamp and check entries
    pub fn with_time_source(
        capacity: usize,
        default_timeout: Duration,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        Self::build(capacity, default_timeout, MAX_SCAN_PROBES, clock)
    }

    /// Like [`with_time_source`](Self::with_time_source) with a custom probe
    /// bound for the eviction scan.
    pub fn with_scan_limit(
        capacity: usize,
        default_timeout: Duration,
        scan_limit: usize,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        Self::build(capacity, default_timeout, scan_limit, clock)
    }

    fn build(
        capacity: usize,
        default_timeout: Duration,
        scan_limit: usize,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        if capacity < 1 {
            return Err(CacheError::InvalidCapacity(capacity));
        }
        debug!(
            capacity,
            scan_limit,
            default_timeout_secs = default_timeout.as_secs(),
            "Creating expiring clock cache"
        );
        Ok(Self {
            data: DashMap::with_capacity(capacity),
            ring: Mutex::new(SlotRing::new(capacity, scan_limit)),
            referenced: ReferenceFlags::new(capacity),
            stats: StatsCounters::new(),
            capacity,
            default_timeout,
            clock,
        })
    }

    // == Get ==
    /// Retrieves a clone of the value for `key` if present and not expired.
    ///
    /// An expired entry counts as a miss and its slot is demoted, but the
    /// entry itself stays in the table until the scan reclaims the slot.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.stats.record_lookup();
        let now = self.clock.now();
        match self.data.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.stats.record_hit();
                self.referenced.mark(entry.slot);
                Some(entry.value.clone())
            }
            Some(entry) => {
                self.stats.record_miss();
                self.referenced.unmark(entry.slot);
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key` with the default timeout.
    pub fn put(&self, key: K, value: V) {
        self.put_with_timeout(key, value, None)
    }

    /// Stores `value` under `key`, expiring `timeout` from now.
    ///
    /// A `None` timeout uses the cache default. Re-putting an existing key
    /// refreshes both its value and its expiration time.
    pub fn put_with_timeout(&self, key: K, value: V, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let mut ring = self.ring.lock();
        let now = self.clock.now();

        if let Some(mut entry) = self.data.get_mut(&key) {
            let slot = entry.slot;
            *entry = ExpiringEntry::new(slot, value, now, timeout);
            self.referenced.mark(slot);
            return;
        }

        let slot = ring.sweep(&self.referenced);
        if let Some(previous) = ring.install(slot, key.clone()) {
            if self
                .data
                .remove_if(&previous, |_, entry| entry.slot == slot)
                .is_some()
            {
                self.stats.record_eviction();
                trace!(%slot, "Evicted entry");
            }
        }
        self.data
            .insert(key, ExpiringEntry::new(slot, value, now, timeout));
    }

    // == Invalidate ==
    /// Removes `key` and demotes its former slot. Absent keys are ignored.
    pub fn invalidate<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some((_, entry)) = self.data.remove(key) {
            self.referenced.unmark(entry.slot);
        }
    }

    // == Clear ==
    /// Removes all entries and resets the hand and statistics.
    pub fn clear(&self) {
        let mut ring = self.ring.lock();
        self.data.clear();
        ring.reset();
        self.referenced.reset();
        self.stats.reset();
        debug!(capacity = self.capacity, "Cleared expiring clock cache");
    }

    /// Checks whether `key` is still in the table, expired or not.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.contains_key(key)
    }

    /// Remaining lifetime of `key`, None if absent. Zero once expired.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.data.get(key).map(|entry| entry.ttl_remaining(now))
    }

    // == Stats ==
    /// Returns current cache statistics. Expired entries still count
    /// towards `total_entries` until reclaimed.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(Some(self.capacity), self.data.len())
    }

    pub fn hits(&self) -> u64 {
        self.stats.hits()
    }

    pub fn misses(&self) -> u64 {
        self.stats.misses()
    }

    pub fn lookups(&self) -> u64 {
        self.stats.lookups()
    }

    pub fn evictions(&self) -> u64 {
        self.stats.evictions()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K, V> Cache<K, V> for ExpiringClockCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        ExpiringClockCache::get(self, key)
    }

    fn put(&self, key: K, value: V) {
        ExpiringClockCache::put(self, key, value)
    }

    fn invalidate(&self, key: &K) {
        ExpiringClockCache::invalidate(self, key)
    }

    fn clear(&self) {
        ExpiringClockCache::clear(self)
    }
}

impl<K, V> fmt::Debug for ExpiringClockCache<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringClockCache")
            .field("capacity", &self.capacity)
            .field("len", &self.data.len())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}
