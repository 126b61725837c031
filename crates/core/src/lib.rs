// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wl-core: shared types for the Warlock agent runtime

pub mod macros;

pub mod clock;
pub mod cron;
pub mod heartbeat;
pub mod id;
pub mod status;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
pub use cron::{CronError, CronExpr};
pub use heartbeat::Heartbeat;
pub use id::{EntryId, SessionId};
pub use status::AgentStatus;
