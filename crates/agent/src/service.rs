// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User hooks driven by the agent.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::callback::ActionError;
use crate::session::Session;

/// What the agent should do after one `run` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Wait up to this long, draining packets and scheduled work meanwhile
    Sleep(Duration),
    /// Drain anything pending without blocking, then run again
    Continue,
    Stop,
}

/// Application logic hosted by an [`Agent`](crate::Agent).
///
/// Every hook has a default, so a service that only reacts to events and
/// schedules needs nothing but `invoke`.
#[async_trait]
pub trait Service: Send + 'static {
    fn name(&self) -> &str {
        "agent"
    }

    /// Runs once, on the first successful connect. Returning `false` is fatal.
    async fn init(&mut self, _session: &mut Session) -> bool {
        true
    }

    /// Called on every pass while running.
    async fn run(&mut self, _session: &mut Session) -> Result<Tick, ActionError> {
        Ok(Tick::Sleep(Duration::from_secs(60)))
    }

    /// Called once while stopping, before the connection is closed.
    async fn shutdown(&mut self, _session: &mut Session) {}

    /// Resolve and run a named callback.
    async fn invoke(
        &mut self,
        action: &str,
        _args: &[Value],
        _session: &mut Session,
    ) -> Result<(), ActionError> {
        Err(ActionError::Unknown(action.to_string()))
    }

    /// Gate for named event callbacks. Returning `false` skips the callback.
    fn before_event(&mut self, _event: &str, _payload: &Value) -> bool {
        true
    }

    fn after_event(&mut self, _event: &str, _payload: &Value) {}
}
