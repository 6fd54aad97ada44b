//! Unbounded Cache Module
//!
//! A plain concurrent map with the cache interface and no eviction.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use dashmap::DashMap;
use tracing::debug;

use crate::cache::stats::StatsCounters;
use crate::cache::{Cache, CacheStats};

/// Cache without a capacity bound. Entries stay until invalidated or cleared.
pub struct UnboundedCache<K, V> {
    data: DashMap<K, V>,
    stats: StatsCounters,
}

impl<K, V> UnboundedCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            stats: StatsCounters::new(),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.stats.record_lookup();
        match self.data.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    pub fn put(&self, key: K, value: V) {
        self.data.insert(key, value);
    }

    pub fn invalidate<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.remove(key);
    }

    pub fn clear(&self) {
        self.data.clear();
        self.stats.reset();
        debug!("Cleared unbounded cache");
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(None, self.data.len())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K, V> Default for UnboundedCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Cache<K, V> for UnboundedCache<K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        UnboundedCache::get(self, key)
    }

    fn put(&self, key: K, value: V) {
        UnboundedCache::put(self, key, value)
    }

    fn invalidate(&self, key: &K) {
        UnboundedCache::invalidate(self, key)
    }

    fn clear(&self) {
        UnboundedCache::clear(self)
    }
}

impl<K, V> fmt::Debug for UnboundedCache<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnboundedCache")
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_evicts() {
        let cache = UnboundedCache::new();
        for i in 0..1_000u32 {
            cache.put(i, i * 2);
        }

        assert_eq!(cache.len(), 1_000);
        assert_eq!(cache.get(&999), Some(1_998));
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.stats().capacity, None);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache: UnboundedCache<String, u8> = UnboundedCache::default();
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);

        cache.invalidate("a");
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().lookups, 0);
    }
}
