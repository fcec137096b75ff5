//! Nullable clock for deterministic time in tests.

use prime_types::{Clock, Timestamp, SECONDS_PER_DAY};
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to. Shareable across threads so the
/// same instance can be handed to the machine and kept by the test.
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    /// Advance time by a number of seconds and return the new time.
    ///
    /// Returns `None` and leaves the clock untouched if the result would
    /// not fit in a `u64`.
    pub fn advance(&self, secs: u64) -> Option<Timestamp> {
        self.current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                now.checked_add(secs)
            })
            .ok()
            .map(|previous| Timestamp::new(previous + secs))
    }

    /// Advance time by whole days. Same overflow rule as [`NullClock::advance`].
    pub fn advance_days(&self, days: u64) -> Option<Timestamp> {
        self.advance(days.checked_mul(SECONDS_PER_DAY)?)
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.current.store(secs, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }
}
