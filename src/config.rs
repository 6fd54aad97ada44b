//! Configuration Module
//!
//! Handles loading cache defaults from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_TIMEOUT, MAX_SCAN_PROBES};

/// Cache defaults used by the registry when a call site leaves them out.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Default capacity for fixed-size caches, None = must be given per cache
    pub default_maxsize: Option<usize>,
    /// Default lifetime of entries in expiring caches
    pub default_timeout: Duration,
    /// Probe bound for the eviction scan
    pub scan_limit: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAXSIZE` - Default capacity (default: unset)
    /// - `CACHE_DEFAULT_TIMEOUT` - Default entry lifetime in seconds (default: 2^60)
    /// - `CACHE_SCAN_LIMIT` - Eviction scan probe bound (default: 107)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            default_maxsize: lookup("CACHE_MAXSIZE")
                .and_then(|v| v.trim().parse().ok())
                .filter(|size: &usize| *size > 0),
            default_timeout: lookup("CACHE_DEFAULT_TIMEOUT")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            scan_limit: lookup("CACHE_SCAN_LIMIT")
                .and_then(|v| v.trim().parse().ok())
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(defaults.scan_limit),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_maxsize: None,
            default_timeout: DEFAULT_TIMEOUT,
            scan_limit: MAX_SCAN_PROBES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.default_maxsize, None);
        assert_eq!(config.default_timeout, Duration::from_secs(1 << 60));
        assert_eq!(config.scan_limit, 107);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("CACHE_MAXSIZE", "500"),
            ("CACHE_DEFAULT_TIMEOUT", "30"),
            ("CACHE_SCAN_LIMIT", "16"),
        ]));
        assert_eq!(config.default_maxsize, Some(500));
        assert_eq!(config.default_timeout, Duration::from_secs(30));
        assert_eq!(config.scan_limit, 16);
    }

    #[test]
    fn test_config_invalid_values_fall_back() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("CACHE_MAXSIZE", "0"),
            ("CACHE_DEFAULT_TIMEOUT", "soon"),
            ("CACHE_SCAN_LIMIT", "-3"),
        ]));
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_MAXSIZE");
        env::remove_var("CACHE_DEFAULT_TIMEOUT");
        env::remove_var("CACHE_SCAN_LIMIT");

        let config = CacheConfig::from_env();
        assert_eq!(config, CacheConfig::default());
    }
}
