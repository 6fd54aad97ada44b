//! Clock Cache - thread-shared caches with CLOCK eviction
//!
//! Fixed-capacity caches approximating LRU with the CLOCK (second-chance)
//! algorithm, with and without per-entry expiration, plus a memoization
//! wrapper and a registry of named caches.

pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod registry;
pub mod time;

pub use cache::{Cache, CacheStats, ClockCache, ExpiringClockCache, UnboundedCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use memo::{ArgsKey, Memoized};
pub use registry::CacheRegistry;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
