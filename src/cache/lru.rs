//! Clock Cache Module
//!
//! Fixed-capacity cache with approximate-LRU eviction via CLOCK.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::ring::{ReferenceFlags, SlotRing};
use crate::cache::stats::StatsCounters;
use crate::cache::{Cache, CacheEntry, CacheStats, MAX_SCAN_PROBES};
use crate::error::{CacheError, Result};

// == Clock Cache ==
/// Fixed-capacity cache that approximates LRU with the CLOCK algorithm.
///
/// `get` and `invalidate` never take the cache lock: they work on the
/// concurrent lookup table and the per-slot referenced bits directly. `put`
/// and `clear` are serialized by a single mutex that also guards the
/// slot-to-key array and the clock hand.
///
/// Once `capacity` keys are held, every `put` of a new key evicts exactly one
/// existing key.
pub struct ClockCache<K, V> {
    /// Key to (slot, value); the single source of truth for presence
    data: DashMap<K, CacheEntry<V>>,
    /// Slot keys and clock hand, held for the whole of put and clear
    ring: Mutex<SlotRing<K>>,
    /// Eviction hint bits, touched without the lock
    referenced: ReferenceFlags,
    /// Performance statistics
    stats: StatsCounters,
    capacity: usize,
}

impl<K, V> ClockCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidCapacity` if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_scan_limit(capacity, MAX_SCAN_PROBES)
    }

    /// Creates a cache whose eviction scan gives up after `scan_limit` probes.
    ///
    /// A limit of 0 is treated as 1.
    pub fn with_scan_limit(capacity: usize, scan_limit: usize) -> Result<Self> {
        if capacity < 1 {
            return Err(CacheError::InvalidCapacity(capacity));
        }
        debug!(capacity, scan_limit, "Creating clock cache");
        Ok(Self {
            data: DashMap::with_capacity(capacity),
            ring: Mutex::new(SlotRing::new(capacity, scan_limit)),
            referenced: ReferenceFlags::new(capacity),
            stats: StatsCounters::new(),
            capacity,
        })
    }

    // == Get ==
    /// Retrieves a clone of the value stored for `key`.
    ///
    /// A hit marks the entry's slot as referenced.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.stats.record_lookup();
        match self.data.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                self.referenced.mark(entry.slot);
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key`.
    ///
    /// An existing key is updated in place and marked referenced, without
    /// moving the hand. A new key takes the slot chosen by the clock scan;
    /// whatever key still occupied that slot is evicted.
    pub fn put(&self, key: K, value: V) {
        let mut ring = self.ring.lock();

        if let Some(mut entry) = self.data.get_mut(&key) {
            entry.value = value;
            self.referenced.mark(entry.slot);
            return;
        }

        let slot = ring.sweep(&self.referenced);
        if let Some(previous) = ring.install(slot, key.clone()) {
            // The previous key may already be gone through invalidate, or
            // live on in another slot after being invalidated and re-added.
            if self
                .data
                .remove_if(&previous, |_, entry| entry.slot == slot)
                .is_some()
            {
                self.stats.record_eviction();
                trace!(%slot, "Evicted entry");
            }
        }
        self.data.insert(key, CacheEntry::new(slot, value));
    }

    // == Invalidate ==
    /// Removes `key` and demotes its former slot. Absent keys are ignored.
    pub fn invalidate<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // No lock: at worst this demotes a slot already reused by a new key
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
        debug!(capacity = self.capacity, "Cleared clock cache");
    }

    /// Checks whether `key` is present without touching stats or bits.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.contains_key(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
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

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K, V> Cache<K, V> for ClockCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        ClockCache::get(self, key)
    }

    fn put(&self, key: K, value: V) {
        ClockCache::put(self, key, value)
    }

    fn invalidate(&self, key: &K) {
        ClockCache::invalidate(self, key)
    }

    fn clear(&self) {
        ClockCache::clear(self)
    }
}

impl<K, V> fmt::Debug for ClockCache<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockCache")
            .field("capacity", &self.capacity)
            .field("len", &self.data.len())
            .field("evictions", &self.stats.evictions())
            .finish()
    }
}
