// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wl-control: locate, autostart, stop and query a Warlock broker.

mod config;
mod control;
mod process;
mod registry;

pub use config::ControlConfig;
pub use control::{Connector, Control, ControlError};
pub use process::{find_broker_binary, parse_startup_error, read_pid, STARTUP_MARKER};
pub use registry::{ControlRegistry, SharedControl};
