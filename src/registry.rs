//! Cache Registry Module
//!
//! Creates caches under unique names and clears them later, singly or in bulk.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::{ClockCache, ExpiringClockCache, UnboundedCache, MAX_SCAN_PROBES};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::time::SystemTimeSource;

// == Clear Handle ==
/// Type-erased handle the registry keeps to clear a cache.
pub trait ClearHandle: Send + Sync {
    fn clear_entries(&self);
}

impl<K, V> ClearHandle for UnboundedCache<K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    fn clear_entries(&self) {
        self.clear()
    }
}

impl<K, V> ClearHandle for ClockCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn clear_entries(&self) {
        self.clear()
    }
}

impl<K, V> ClearHandle for ExpiringClockCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn clear_entries(&self) {
        self.clear()
    }
}

// == Cache Registry ==
/// Factory for named caches sharing default settings.
///
/// Every cache created through the registry can later be cleared by name
/// with [`CacheRegistry::clear`].
pub struct CacheRegistry {
    /// Capacity used when a call site gives none
    default_maxsize: Option<usize>,
    /// Entry lifetime used by expiring caches when a call site gives none
    default_timeout: Duration,
    scan_limit: usize,
    caches: Mutex<HashMap<String, Arc<dyn ClearHandle>>>,
}

impl CacheRegistry {
    // == Constructors ==
    /// Creates a registry with the given defaults.
    ///
    /// # Arguments
    /// * `default_maxsize` - Capacity for caches created without one
    /// * `default_timeout` - Default lifetime for expiring caches
    pub fn new(default_maxsize: Option<usize>, default_timeout: Duration) -> Self {
        Self {
            default_maxsize,
            default_timeout,
            scan_limit: MAX_SCAN_PROBES,
            caches: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a registry from loaded configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            scan_limit: config.scan_limit,
            ..Self::new(config.default_maxsize, config.default_timeout)
        }
    }

    // == Unbounded ==
    /// Creates an unbounded cache, for full memoization.
    pub fn memoized<K, V>(&self, name: Option<&str>) -> Result<Arc<UnboundedCache<K, V>>>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mut caches = self.caches.lock();
        let name = Self::claim_name(&caches, name)?;
        let cache = Arc::new(UnboundedCache::new());
        caches.insert(name.clone(), cache.clone());
        debug!(name = %name, "Registered unbounded cache");
        Ok(cache)
    }

    // == Fixed Capacity ==
    /// Creates a [`ClockCache`].
    ///
    /// # Errors
    /// * `CacheError::NameInUse` if `name` is already registered
    /// * `CacheError::MissingMaxsize` if neither `maxsize` nor the registry
    ///   default is set
    /// * `CacheError::InvalidCapacity` if the resolved maxsize is 0
    pub fn lru_cache<K, V>(
        &self,
        name: Option<&str>,
        maxsize: Option<usize>,
    ) -> Result<Arc<ClockCache<K, V>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mut caches = self.caches.lock();
        let name = Self::claim_name(&caches, name)?;
        let maxsize = self.resolve_maxsize(&name, maxsize)?;
        let cache = Arc::new(ClockCache::with_scan_limit(maxsize, self.scan_limit)?);
        caches.insert(name.clone(), cache.clone());
        debug!(name = %name, maxsize, "Registered clock cache");
        Ok(cache)
    }

    // == Expiring ==
    /// Creates an [`ExpiringClockCache`]; `timeout` overrides the registry
    /// default lifetime.
    ///
    /// # Errors
    /// Same as [`CacheRegistry::lru_cache`].
    pub fn expiring_lru_cache<K, V>(
        &self,
        name: Option<&str>,
        maxsize: Option<usize>,
        timeout: Option<Duration>,
    ) -> Result<Arc<ExpiringClockCache<K, V>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mut caches = self.caches.lock();
        let name = Self::claim_name(&caches, name)?;
        let maxsize = self.resolve_maxsize(&name, maxsize)?;
        let timeout = timeout.unwrap_or(self.default_timeout);
        let cache = Arc::new(ExpiringClockCache::with_scan_limit(
            maxsize,
            timeout,
            self.scan_limit,
            Arc::new(SystemTimeSource),
        )?);
        caches.insert(name.clone(), cache.clone());
        debug!(
            name = %name,
            maxsize,
            timeout_secs = timeout.as_secs(),
            "Registered expiring clock cache"
        );
        Ok(cache)
    }

    // == Clear ==
    /// Clears the named caches, or every registered cache if `names` is empty.
    ///
    /// # Errors
    /// Returns `CacheError::UnknownCache` for a name that was never
    /// registered; no cache is cleared in that case.
    pub fn clear(&self, names: &[&str]) -> Result<()> {
        let targets: Vec<Arc<dyn ClearHandle>> = {
            let caches = self.caches.lock();
            if names.is_empty() {
                caches.values().cloned().collect()
            } else {
                names
                    .iter()
                    .map(|name| {
                        caches
                            .get(*name)
                            .cloned()
                            .ok_or_else(|| CacheError::UnknownCache(name.to_string()))
                    })
                    .collect::<Result<_>>()?
            }
        };

        for cache in &targets {
            cache.clear_entries();
        }
        info!(count = targets.len(), "Cleared registered caches");
        Ok(())
    }

    /// Returns the names of all registered caches, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.caches.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.lock().is_empty()
    }

    fn claim_name(
        caches: &HashMap<String, Arc<dyn ClearHandle>>,
        name: Option<&str>,
    ) -> Result<String> {
        match name {
            Some(name) if caches.contains_key(name) => {
                Err(CacheError::NameInUse(name.to_string()))
            }
            Some(name) => Ok(name.to_string()),
            None => loop {
                let candidate = Uuid::new_v4().to_string();
                if !caches.contains_key(&candidate) {
                    break Ok(candidate);
                }
            },
        }
    }

    fn resolve_maxsize(&self, name: &str, maxsize: Option<usize>) -> Result<usize> {
        maxsize
            .or(self.default_maxsize)
            .ok_or_else(|| CacheError::MissingMaxsize(name.to_string()))
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_caches_are_registered() {
        let registry = CacheRegistry::new(Some(10), Duration::from_secs(60));
        registry.memoized::<u32, u32>(Some("memo")).unwrap();
        registry.lru_cache::<u32, u32>(Some("lru"), None).unwrap();
        registry
            .expiring_lru_cache::<u32, u32>(Some("expiring"), None, None)
            .unwrap();

        assert_eq!(registry.names(), vec!["expiring", "lru", "memo"]);
    }

    #[test]
    fn test_name_reuse_is_rejected() {
        let registry = CacheRegistry::new(Some(10), Duration::from_secs(60));
        registry.lru_cache::<u32, u32>(Some("users"), None).unwrap();

        let result = registry.memoized::<u32, u32>(Some("users"));
        assert!(matches!(result, Err(CacheError::NameInUse(name)) if name == "users"));
    }

    #[test]
    fn test_missing_maxsize_is_rejected() {
        let registry = CacheRegistry::new(None, Duration::from_secs(60));

        let result = registry.lru_cache::<u32, u32>(Some("lru"), None);
        assert!(matches!(result, Err(CacheError::MissingMaxsize(_))));
        let result = registry.expiring_lru_cache::<u32, u32>(None, None, None);
        assert!(matches!(result, Err(CacheError::MissingMaxsize(_))));

        // Unbounded caches need no maxsize
        assert!(registry.memoized::<u32, u32>(None).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_call_site_maxsize_overrides_default() {
        let registry = CacheRegistry::new(Some(10), Duration::from_secs(60));
        let cache = registry.lru_cache::<u32, u32>(None, Some(3)).unwrap();
        assert_eq!(cache.capacity(), 3);

        let expiring = registry
            .expiring_lru_cache::<u32, u32>(None, None, Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(expiring.capacity(), 10);
        assert_eq!(expiring.default_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_anonymous_names_are_unique() {
        let registry = CacheRegistry::new(Some(4), Duration::from_secs(60));
        for _ in 0..5 {
            registry.lru_cache::<u8, u8>(None, None).unwrap();
        }
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_clear_selected_and_all() {
        let registry = CacheRegistry::new(Some(4), Duration::from_secs(60));
        let first = registry.lru_cache::<u8, u8>(Some("first"), None).unwrap();
        let second = registry.memoized::<u8, u8>(Some("second")).unwrap();
        first.put(1, 1);
        second.put(2, 2);

        registry.clear(&["first"]).unwrap();
        assert!(first.is_empty());
        assert_eq!(second.get(&2), Some(2));

        registry.clear(&[]).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_clear_unknown_name_clears_nothing() {
        let registry = CacheRegistry::new(Some(4), Duration::from_secs(60));
        let cache = registry.lru_cache::<u8, u8>(Some("known"), None).unwrap();
        cache.put(1, 1);

        let result = registry.clear(&["known", "missing"]);

        assert!(matches!(result, Err(CacheError::UnknownCache(name)) if name == "missing"));
        assert_eq!(cache.get(&1), Some(1));
    }

    #[test]
    fn test_from_config_uses_defaults() {
        let config = CacheConfig {
            default_maxsize: Some(7),
            default_timeout: Duration::from_secs(9),
            scan_limit: 3,
        };
        let registry = CacheRegistry::from_config(&config);
        let cache = registry
            .expiring_lru_cache::<u8, u8>(None, None, None)
            .unwrap();

        assert_eq!(cache.capacity(), 7);
        assert_eq!(cache.default_timeout(), Duration::from_secs(9));
    }
}
