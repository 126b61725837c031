// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration: TOML file plus environment overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use wl_core::CronExpr;

use crate::env;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 13080 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

/// `[control]`: where the supervisor finds and how it launches the broker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlSettings {
    pub runtime_path: Option<PathBuf>,
    pub pid_file: String,
    pub log_file: String,
    pub broker_binary: String,
    pub autostart: bool,
    pub connect_timeout_secs: u64,
    pub app_path: Option<PathBuf>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            runtime_path: None,
            pid_file: "warlock.pid".to_string(),
            log_file: "warlock.log".to_string(),
            broker_binary: "warlockd".to_string(),
            autostart: false,
            connect_timeout_secs: 5,
            app_path: None,
        }
    }
}

/// One `[[schedule]]` entry. Exactly one of `interval`, `delay` or `when`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleItem {
    pub action: String,
    pub args: Vec<Value>,
    /// Seconds between runs
    pub interval: Option<u64>,
    /// Seconds until a single run
    pub delay: Option<u64>,
    /// Cron expression, or `@reboot` for once shortly after startup
    pub when: Option<String>,
    pub label: Option<String>,
    pub tag: Option<String>,
    pub overwrite: bool,
}

impl ScheduleItem {
    pub fn is_reboot(&self) -> bool {
        self.when.as_deref().is_some_and(|w| w.trim().eq_ignore_ascii_case("@reboot"))
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let invalid = |msg: &str| ConfigError::Invalid(format!("schedule[{index}]: {msg}"));
        if self.action.trim().is_empty() {
            return Err(invalid("action is required"));
        }
        let set = [self.interval.is_some(), self.delay.is_some(), self.when.is_some()];
        if set.iter().filter(|s| **s).count() != 1 {
            return Err(invalid("exactly one of interval, delay or when is required"));
        }
        if self.interval == Some(0) {
            return Err(invalid("interval must be greater than zero"));
        }
        if let Some(when) = &self.when {
            if !self.is_reboot() {
                CronExpr::parse(when).map_err(|e| invalid(&e.to_string()))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Session id; random when unset
    pub id: Option<String>,
    pub name: String,
    pub encoded: bool,
    pub reconnect: bool,
    pub single_attempt: bool,
    /// Wait for the broker to echo fire-and-forget packets
    pub acknowledged: bool,
    pub heartbeat_secs: u64,
    pub connect_backoff_ms: u64,
    pub rpc_timeout_ms: u64,
    pub boot_delay_secs: u64,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub app_env: Option<String>,
    pub server: ServerConfig,
    pub auth: Option<AuthConfig>,
    pub control: ControlSettings,
    pub schedule: Vec<ScheduleItem>,
    /// Event name to action name
    pub subscribe: BTreeMap<String, String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: None,
            name: "agent".to_string(),
            encoded: false,
            reconnect: true,
            single_attempt: false,
            acknowledged: false,
            heartbeat_secs: 60,
            connect_backoff_ms: 1000,
            rpc_timeout_ms: 3000,
            boot_delay_secs: 5,
            log_level: "info".to_string(),
            log_dir: None,
            app_env: None,
            server: ServerConfig::default(),
            auth: None,
            control: ControlSettings::default(),
            schedule: Vec::new(),
            subscribe: BTreeMap::new(),
        }
    }
}

impl AgentConfig {
    /// Read a TOML file, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let mut config = Self::from_toml(&text)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// `$WARLOCK_CONFIG` when set, otherwise defaults; env overrides applied either way.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::config_path() {
            Some(path) => Self::load(&path),
            None => {
                let mut config = Self::default();
                config.apply_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_env(&mut self) {
        if let Some(host) = env::host() {
            self.server.host = host;
        }
        if let Some(port) = env::port() {
            self.server.port = port;
        }
        if let Some(encoded) = env::encoded() {
            self.encoded = encoded;
        }
        if let Some(id) = env::session_id() {
            self.id = Some(id);
        }
        if let Some(level) = env::log_level() {
            self.log_level = level;
        }
        if let Some(dir) = env::runtime_dir() {
            self.control.runtime_path = Some(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".into()));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".into()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        if self.heartbeat_secs == 0 {
            return Err(ConfigError::Invalid("heartbeat_secs must be greater than zero".into()));
        }
        for (index, item) in self.schedule.iter().enumerate() {
            item.validate(index)?;
        }
        let blank = self.subscribe.iter().find(|(_, action)| action.trim().is_empty());
        if let Some((event, _)) = blank {
            return Err(ConfigError::Invalid(format!("subscribe.{event}: action is required")));
        }
        Ok(())
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn connect_backoff(&self) -> Duration {
        Duration::from_millis(self.connect_backoff_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn boot_delay(&self) -> Duration {
        Duration::from_secs(self.boot_delay_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
