// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor handle for one broker.

use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use wl_adapters::{Link, RpcError, TcpTransport, Transport, TransportError};
use wl_core::SystemClock;
use wl_wire::{PacketType, Protocol};

use crate::config::ControlConfig;
use crate::process::{self, STARTUP_MARKER};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("broker at {addr} is running but unreachable: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: TransportError,
    },

    #[error("failed to launch {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("broker failed to start: {0}")]
    StartFailed(String),

    #[error("broker is not running")]
    NotRunning,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Builds the transport for a control connection.
pub type Connector = Arc<dyn Fn(&ControlConfig) -> Box<dyn Transport> + Send + Sync>;

fn tcp_connector() -> Connector {
    Arc::new(|config: &ControlConfig| {
        let transport = TcpTransport::new(&config.host, config.port)
            .with_connect_timeout(config.connect_timeout);
        Box::new(transport) as Box<dyn Transport>
    })
}

pub struct Control {
    config: ControlConfig,
    connector: Connector,
    link: Option<Link>,
}

impl Control {
    pub fn new(config: ControlConfig) -> Self {
        Self { config, connector: tcp_connector(), link: None }
    }

    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = connector;
        self
    }

    /// Open a handle, connecting if the broker is up and launching it first
    /// when it is down and autostart is set.
    pub async fn acquire(config: ControlConfig) -> Result<Self, ControlError> {
        let mut control = Self::new(config);
        control.open().await?;
        Ok(control)
    }

    pub async fn open(&mut self) -> Result<(), ControlError> {
        if self.is_running() {
            self.connect().await?;
        } else if self.config.autostart {
            info!(addr = %self.config.addr(), "broker not running, starting");
            self.start(self.config.connect_timeout).await?;
            self.connect().await.map_err(|e| ControlError::StartFailed(e.to_string()))?;
        } else {
            debug!(addr = %self.config.addr(), "broker not running");
        }
        Ok(())
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn connected(&self) -> bool {
        self.link.as_ref().is_some_and(Link::connected)
    }

    /// PID file names a live process running the broker binary.
    pub fn is_running(&self) -> bool {
        match process::read_pid(&self.config.pid_path()) {
            Some(pid) => process::process_matches(pid, &self.config.broker_binary),
            None => false,
        }
    }

    pub async fn connect(&mut self) -> Result<(), ControlError> {
        if self.connected() {
            return Ok(());
        }
        let transport = (self.connector)(&self.config);
        let protocol = Protocol::new(self.config.session_id.clone(), self.config.encoded);
        let mut link = Link::new(transport, protocol, Arc::new(SystemClock));
        link.connect()
            .await
            .map_err(|source| ControlError::Unreachable { addr: self.config.addr(), source })?;
        self.link = Some(link);
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.disconnect().await;
        }
    }

    /// Launch the broker detached and wait until its PID file appears.
    ///
    /// Returns `Ok(false)` when it was already running.
    pub async fn start(&mut self, timeout: Duration) -> Result<bool, ControlError> {
        if self.is_running() {
            return Ok(false);
        }

        std::fs::create_dir_all(&self.config.runtime_path)?;
        let log_path = self.config.log_path();
        let mut log = OpenOptions::new().create(true).append(true).open(&log_path)?;
        let binary = process::find_broker_binary(&self.config.broker_binary);
        writeln!(log, "{STARTUP_MARKER} {} ---", binary.display())?;

        let app_path = match &self.config.app_path {
            Some(path) => path.clone(),
            None => std::env::current_dir()?,
        };
        let mut child = Command::new(&binary)
            .current_dir(&app_path)
            .env("APPLICATION_PATH", &app_path)
            .env("APPLICATION_ENV", &self.config.app_env)
            .env("WARLOCK_EXEC", "1")
            .env("WARLOCK_OUTPUT", "file")
            .env("WARLOCK_RUNTIME_DIR", &self.config.runtime_path)
            .stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log)
            .process_group(0)
            .spawn()
            .map_err(|source| ControlError::Spawn { binary: binary.clone(), source })?;
        info!(pid = child.id(), binary = %binary.display(), "launched broker");

        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.is_running() {
                return Ok(true);
            }
            if let Ok(Some(status)) = child.try_wait() {
                warn!(%status, "broker exited during startup");
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        let reason = std::fs::read_to_string(&log_path)
            .ok()
            .and_then(|log| process::parse_startup_error(&log))
            .unwrap_or_else(|| format!("not running after {timeout:?}"));
        Err(ControlError::StartFailed(reason))
    }

    /// Ask the broker to shut down. Returns `Ok(false)` if it was not running.
    pub async fn stop(&mut self) -> Result<bool, ControlError> {
        if !self.is_running() {
            return Ok(false);
        }
        self.connect().await?;
        let link = self.link.as_mut().ok_or(ControlError::NotRunning)?;
        link.request(PacketType::Shutdown, None, PacketType::Ok).await?;
        info!(addr = %self.config.addr(), "broker acknowledged shutdown");
        self.disconnect().await;
        Ok(true)
    }

    /// Broker status payload, or `{"state": "stopped"}` when it is down.
    pub async fn status(&mut self) -> Result<Value, ControlError> {
        if !self.is_running() {
            return Ok(json!({ "state": "stopped" }));
        }
        self.connect().await?;
        let link = self.link.as_mut().ok_or(ControlError::NotRunning)?;
        let reply = link.request(PacketType::Status, None, PacketType::Status).await?;
        Ok(reply.payload.unwrap_or(Value::Null))
    }

    /// Stop (if running) then start.
    pub async fn restart(&mut self, timeout: Duration) -> Result<(), ControlError> {
        if self.stop().await? {
            let deadline = Instant::now() + timeout;
            while self.is_running() && Instant::now() < deadline {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
        self.start(timeout).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
