//! # Time Source
//!
//! Clock abstraction so stall detection, consent expiry and revocation
//! timestamps can be driven deterministically in tests.

use crate::entities::Timestamp;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

/// Time source for consistent timestamp handling.
pub trait TimeSource: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Manually driven clock for tests.
#[derive(Debug)]
pub struct MockTimeSource {
    time: Mutex<Timestamp>,
}

impl MockTimeSource {
    /// Creates a clock frozen at `initial`.
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: Mutex::new(initial),
        }
    }

    /// Creates a clock frozen at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut time = self.time.lock();
        *time += by;
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, time: Timestamp) {
        *self.time.lock() = time;
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        *self.time.lock()
    }
}
