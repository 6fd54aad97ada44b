//! Memoization Module
//!
//! Wraps a function so repeated calls with equal arguments are answered
//! from a cache.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::cache::{Cache, ClockCache, ExpiringClockCache, UnboundedCache};
use crate::error::{CacheError, Result};

// == Args Key ==
/// Cache key built from a call's arguments.
///
/// Named arguments are kept sorted by name, so two calls passing the same
/// names and values in different orders produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArgsKey<T> {
    positional: Vec<T>,
    named: BTreeMap<String, T>,
}

impl<T> ArgsKey<T> {
    pub fn new(positional: Vec<T>) -> Self {
        Self {
            positional,
            named: BTreeMap::new(),
        }
    }

    /// Adds a named argument; a repeated name keeps the last value.
    pub fn with_named(mut self, name: impl Into<String>, value: T) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    pub fn positional(&self) -> &[T] {
        &self.positional
    }

    pub fn named(&self) -> &BTreeMap<String, T> {
        &self.named
    }
}

// == Memoized ==
/// A function paired with a cache of its results.
///
/// `key_fn` maps call arguments to a cache key. It returns an error when the
/// arguments cannot serve as a key; such calls fail with that error, or run
/// the function uncached when [`ignore_unhashable`](Self::ignore_unhashable)
/// is set.
pub struct Memoized<A: ?Sized, K, V, F, KF> {
    func: F,
    key_fn: KF,
    cache: Arc<dyn Cache<K, V>>,
    ignore_unhashable: bool,
    _args: PhantomData<fn(&A)>,
}

impl<A, K, V, F, KF> Memoized<A, K, V, F, KF>
where
    A: ?Sized,
    V: Clone,
    KF: Fn(&A) -> Result<K>,
{
    // == Constructor ==
    /// Wraps `func`, storing its results in `cache`.
    pub fn new(func: F, key_fn: KF, cache: Arc<dyn Cache<K, V>>) -> Self {
        Self {
            func,
            key_fn,
            cache,
            ignore_unhashable: false,
            _args: PhantomData,
        }
    }

    /// Makes calls with unkeyable arguments bypass the cache instead of failing.
    pub fn ignore_unhashable(mut self, ignore: bool) -> Self {
        self.ignore_unhashable = ignore;
        self
    }

    /// Returns the cache holding this function's results.
    pub fn cache(&self) -> &Arc<dyn Cache<K, V>> {
        &self.cache
    }

    fn key_for(&self, args: &A) -> Result<Option<K>> {
        match (self.key_fn)(args) {
            Ok(key) => Ok(Some(key)),
            Err(err) if self.ignore_unhashable => {
                trace!(error = %err, "Bypassing cache for unkeyable arguments");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    // == Call ==
    /// Returns the cached result for `args`, computing and storing it on a miss.
    ///
    /// # Errors
    /// Returns the key function's error for unkeyable arguments unless
    /// those are ignored.
    pub fn call(&self, args: &A) -> Result<V>
    where
        F: Fn(&A) -> V,
    {
        let Some(key) = self.key_for(args)? else {
            return Ok((self.func)(args));
        };
        if let Some(value) = self.cache.get(&key) {
            return Ok(value);
        }
        let value = (self.func)(args);
        self.cache.put(key, value.clone());
        Ok(value)
    }

    /// Like [`call`](Self::call) for fallible functions.
    ///
    /// Errors returned by the function are passed through unchanged and
    /// nothing is cached for that call.
    pub fn try_call<E>(&self, args: &A) -> std::result::Result<V, E>
    where
        F: Fn(&A) -> std::result::Result<V, E>,
        E: From<CacheError>,
    {
        let Some(key) = self.key_for(args)? else {
            return (self.func)(args);
        };
        if let Some(value) = self.cache.get(&key) {
            return Ok(value);
        }
        let value = (self.func)(args)?;
        self.cache.put(key, value.clone());
        Ok(value)
    }
}

impl<A, K, V, F, KF> Memoized<A, K, V, F, KF>
where
    A: ?Sized,
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    KF: Fn(&A) -> Result<K>,
{
    /// Wraps `func` with a cache chosen from the settings: unbounded without
    /// a maxsize, a [`ClockCache`] without a timeout, otherwise an
    /// [`ExpiringClockCache`] using `timeout` as its default.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidCapacity` for a maxsize of 0.
    pub fn with_settings(
        func: F,
        key_fn: KF,
        maxsize: Option<usize>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let cache: Arc<dyn Cache<K, V>> = match (maxsize, timeout) {
            (None, _) => Arc::new(UnboundedCache::<K, V>::new()),
            (Some(size), None) => Arc::new(ClockCache::<K, V>::new(size)?),
            (Some(size), Some(timeout)) => {
                Arc::new(ExpiringClockCache::<K, V>::with_default_timeout(size, timeout)?)
            }
        };
        Ok(Self::new(func, key_fn, cache))
    }
}

impl<A: ?Sized, K, V, F, KF> fmt::Debug for Memoized<A, K, V, F, KF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("ignore_unhashable", &self.ignore_unhashable)
            .finish_non_exhaustive()
    }
}
