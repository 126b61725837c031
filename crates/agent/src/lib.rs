// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wl-agent: the Warlock agent runtime.
//!
//! An [`Agent`] drives a [`Service`] through the connection state machine.
//! Everything the service touches while running goes through its
//! [`Session`]: subscriptions, the local scheduler, broker RPCs and the
//! remote key-value store.

mod agent;
mod callback;
mod clock;
pub mod config;
pub mod env;
mod memory;
mod scheduler;
mod service;
mod session;
mod signals;
#[cfg(test)]
mod test_support;

pub use agent::{Agent, AgentError, AgentOptions};
pub use callback::{Action, ActionError, Callback, Task};
pub use clock::RuntimeClock;
pub use config::{AgentConfig, AuthConfig, ConfigError, ControlSettings, ScheduleItem, ServerConfig};
pub use scheduler::{EntryKind, ScheduleEntry, ScheduleError, Scheduler};
pub use service::{Service, Tick};
pub use session::{KvStore, RemoteTask, Session};
pub use signals::SignalContext;

pub use wl_adapters::{Link, RpcError, Transport, TransportError};
pub use wl_core::AgentStatus;
