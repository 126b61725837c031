// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::status::AgentStatus;

/// Liveness record pushed to the broker as a STATUS payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub pid: u32,
    pub name: String,
    /// Agent start time, unix seconds
    pub start: i64,
    pub state_code: i32,
    pub state: String,
    /// Resident memory in bytes
    pub mem: u64,
    /// Peak resident memory in bytes
    pub peak: u64,
}

impl Heartbeat {
    pub fn new(name: impl Into<String>, start: i64, status: AgentStatus) -> Self {
        Self {
            pid: std::process::id(),
            name: name.into(),
            start,
            state_code: status.code(),
            state: status.label().to_string(),
            mem: 0,
            peak: 0,
        }
    }

    pub fn with_memory(mut self, mem: u64, peak: u64) -> Self {
        self.mem = mem;
        self.peak = peak;
        self
    }

    pub fn status(&self) -> Option<AgentStatus> {
        AgentStatus::from_code(self.state_code)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
