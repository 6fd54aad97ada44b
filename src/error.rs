//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction, the registry and memoization.
///
/// Lookups, insertions and invalidations never fail; absence is reported as
/// `None` and a full cache evicts instead of rejecting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity below one
    #[error("Invalid capacity: {0} (must be > 0)")]
    InvalidCapacity(usize),

    /// No maxsize given at the call site and no registry default
    #[error("Cache must have a maxsize set: {0}")]
    MissingMaxsize(String),

    /// Registry name already taken
    #[error("Cache name already in use: {0}")]
    NameInUse(String),

    /// Registry has no cache under this name
    #[error("Unknown cache: {0}")]
    UnknownCache(String),

    /// Call arguments could not be turned into a cache key
    #[error("Unhashable arguments: {0}")]
    UnhashableKey(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache library.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CacheError::InvalidCapacity(0).to_string(),
            "Invalid capacity: 0 (must be > 0)"
        );
        assert_eq!(
            CacheError::NameInUse("users".to_string()).to_string(),
            "Cache name already in use: users"
        );
    }
}
