// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock driven by the tokio timer.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use wl_core::Clock;

/// Wall-clock time measured from a fixed origin with tokio's monotonic clock.
///
/// Under a paused test runtime, advancing tokio time advances `epoch_ms` too,
/// so scheduler deadlines and the wait loop agree on what "now" is.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    origin: tokio::time::Instant,
    origin_epoch_ms: u64,
}

impl RuntimeClock {
    pub fn new() -> Self {
        let origin_epoch_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64;
        Self::starting_at(origin_epoch_ms)
    }

    /// Clock that reads `epoch_ms` right now.
    pub fn starting_at(epoch_ms: u64) -> Self {
        Self { origin: tokio::time::Instant::now(), origin_epoch_ms: epoch_ms }
    }
}

impl Default for RuntimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RuntimeClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn epoch_ms(&self) -> u64 {
        self.origin_epoch_ms + self.origin.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
