//! Time Source Module
//!
//! Absolute clocks used by the expiring cache to stamp and check entries.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

// == Time Source ==
/// Provides the current absolute time as a duration since the Unix epoch.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        // A clock set before 1970 reads as the epoch
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

// == Manual Time Source ==
/// Settable time source for simulating the passage of time.
///
/// Clones share the same underlying instant, so a handle kept by a test can
/// advance the clock seen by a cache.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Arc<Mutex<Duration>>,
}

impl ManualTimeSource {
    /// Creates a manual clock reading `start`.
    pub fn new(start: Duration) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock to an absolute instant.
    pub fn set(&self, now: Duration) {
        *self.now.lock() = now;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(by);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}
