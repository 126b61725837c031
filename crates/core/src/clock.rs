// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
///
/// Object safe so a session can hold `Arc<dyn Clock>` without becoming generic.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;

    /// Wall-clock time in whole seconds, as carried in packet timestamps.
    fn epoch_secs(&self) -> i64 {
        (self.epoch_ms() / 1000) as i64
    }
}

/// Real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Clock;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct FakeClockState {
        instant: Instant,
        epoch_ms: u64,
    }

    /// Manually driven clock. Clones share the same time.
    #[derive(Clone)]
    pub struct FakeClock {
        inner: Arc<Mutex<FakeClockState>>,
    }

    impl FakeClock {
        /// Starts at epoch 1_700_000_000_000 ms (2023-11-14T22:13:20Z).
        pub fn new() -> Self {
            Self::at_epoch_ms(1_700_000_000_000)
        }

        pub fn at_epoch_ms(epoch_ms: u64) -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeClockState { instant: Instant::now(), epoch_ms })),
            }
        }

        /// Move both the monotonic and the wall clock forward.
        pub fn advance(&self, duration: Duration) {
            let mut state = self.inner.lock();
            state.instant += duration;
            state.epoch_ms += duration.as_millis() as u64;
        }

        pub fn set_epoch_ms(&self, ms: u64) {
            self.inner.lock().epoch_ms = ms;
        }
    }

    impl Default for FakeClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.inner.lock().instant
        }

        fn epoch_ms(&self) -> u64 {
            self.inner.lock().epoch_ms
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeClock;

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
