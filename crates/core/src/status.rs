// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an agent.
///
/// Numeric codes for the service states (`Error` through `Stopped`) match what
/// brokers already expect in heartbeats; the connection states sit above them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Error,
    Init,
    Ready,
    Running,
    Sleep,
    Stopping,
    Stopped,
    Starting,
    Reconnect,
    Connect,
}

impl AgentStatus {
    pub fn code(self) -> i32 {
        match self {
            AgentStatus::Error => -1,
            AgentStatus::Init => 0,
            AgentStatus::Ready => 1,
            AgentStatus::Running => 2,
            AgentStatus::Sleep => 3,
            AgentStatus::Stopping => 4,
            AgentStatus::Stopped => 5,
            AgentStatus::Starting => 6,
            AgentStatus::Reconnect => 7,
            AgentStatus::Connect => 8,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            -1 => AgentStatus::Error,
            0 => AgentStatus::Init,
            1 => AgentStatus::Ready,
            2 => AgentStatus::Running,
            3 => AgentStatus::Sleep,
            4 => AgentStatus::Stopping,
            5 => AgentStatus::Stopped,
            6 => AgentStatus::Starting,
            7 => AgentStatus::Reconnect,
            8 => AgentStatus::Connect,
            _ => return None,
        })
    }

    /// Human readable label reported in heartbeats.
    pub fn label(self) -> &'static str {
        match self {
            AgentStatus::Error => "Error",
            AgentStatus::Init => "Initializing",
            AgentStatus::Ready => "Ready",
            AgentStatus::Running => "Running",
            AgentStatus::Sleep => "Sleeping",
            AgentStatus::Stopping => "Stopping",
            AgentStatus::Stopped => "Stopped",
            AgentStatus::Starting => "Starting",
            AgentStatus::Reconnect => "Reconnecting",
            AgentStatus::Connect => "Connecting",
        }
    }

    /// No further transitions happen out of these states.
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Stopped | AgentStatus::Error)
    }

    /// The control loop keeps iterating while in one of these.
    pub fn is_active(self) -> bool {
        matches!(self, AgentStatus::Running | AgentStatus::Sleep)
    }
}

crate::simple_display! {
    AgentStatus {
        Error => "error",
        Init => "init",
        Ready => "ready",
        Running => "running",
        Sleep => "sleep",
        Stopping => "stopping",
        Stopped => "stopped",
        Starting => "starting",
        Reconnect => "reconnect",
        Connect => "connect",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
