// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where a broker lives and how to launch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the PID file and broker log
    pub runtime_path: PathBuf,
    pub pid_file: String,
    pub log_file: String,
    /// Executable name, looked up next to the current binary and then on PATH
    pub broker_binary: String,
    /// `APPLICATION_PATH` for the broker; defaults to the working directory
    pub app_path: Option<PathBuf>,
    /// `APPLICATION_ENV` for the broker
    pub app_env: String,
    pub autostart: bool,
    pub connect_timeout: Duration,
    pub encoded: bool,
    /// Session id used on the control connection
    pub session_id: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 13080,
            runtime_path: std::env::temp_dir().join("warlock"),
            pid_file: "warlock.pid".to_string(),
            log_file: "warlock.log".to_string(),
            broker_binary: "warlockd".to_string(),
            app_path: None,
            app_env: "development".to_string(),
            autostart: false,
            connect_timeout: Duration::from_secs(5),
            encoded: false,
            session_id: "control".to_string(),
        }
    }
}

impl ControlConfig {
    pub fn pid_path(&self) -> PathBuf {
        self.runtime_path.join(&self.pid_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.runtime_path.join(&self.log_file)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
