// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn epoch_follows_paused_tokio_time() {
    let clock = RuntimeClock::starting_at(1_000_000);
    assert_eq!(clock.epoch_ms(), 1_000_000);
    assert_eq!(clock.epoch_secs(), 1_000);

    tokio::time::advance(Duration::from_millis(2_500)).await;
    assert_eq!(clock.epoch_ms(), 1_002_500);
    assert_eq!(clock.epoch_secs(), 1_002);
}

#[tokio::test]
async fn new_clock_is_near_system_time() {
    let system = wl_core::SystemClock.epoch_ms();
    let clock = RuntimeClock::new();
    assert!(clock.epoch_ms().abs_diff(system) < 1_000);
}
