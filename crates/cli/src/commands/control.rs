// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warlock control` - local broker management

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{json, Value};
use wl_agent::AgentConfig;
use wl_control::{Control, ControlConfig, ControlRegistry};

use crate::output::{format_or_json, render_object, OutputFormat};

#[derive(Args)]
pub struct ControlArgs {
    #[command(subcommand)]
    pub command: ControlCommand,
}

#[derive(Subcommand)]
pub enum ControlCommand {
    /// Start the broker in the background
    Start {
        /// Seconds to wait for the broker to come up
        #[arg(long, default_value = "5")]
        timeout: u64,
    },
    /// Ask the broker to shut down
    Stop,
    /// Show broker status
    Status,
    /// Stop and start the broker
    Restart {
        /// Seconds to wait for the broker to come up
        #[arg(long, default_value = "5")]
        timeout: u64,
    },
}

/// Supervisor settings derived from `[server]`, `[control]` and the agent's
/// identity.
pub fn control_config(config: &AgentConfig) -> ControlConfig {
    let defaults = ControlConfig::default();
    let control = &config.control;
    ControlConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        runtime_path: control.runtime_path.clone().unwrap_or(defaults.runtime_path),
        pid_file: control.pid_file.clone(),
        log_file: control.log_file.clone(),
        broker_binary: control.broker_binary.clone(),
        app_path: control.app_path.clone(),
        app_env: config.app_env.clone().unwrap_or(defaults.app_env),
        autostart: control.autostart,
        connect_timeout: Duration::from_secs(control.connect_timeout_secs),
        encoded: config.encoded,
        session_id: config.id.clone().unwrap_or(defaults.session_id),
    }
}

pub async fn handle(
    command: ControlCommand,
    config: &AgentConfig,
    format: OutputFormat,
) -> Result<()> {
    let control_config = control_config(config);
    let addr = control_config.addr();
    let shared = ControlRegistry::global().insert(Control::new(control_config));
    let mut control = shared.lock().await;

    match command {
        ControlCommand::Start { timeout } => {
            let started = control.start(Duration::from_secs(timeout)).await?;
            let obj = json!({ "started": started, "addr": addr });
            format_or_json(format, &obj, || {
                if started {
                    println!("Broker started ({addr})");
                } else {
                    println!("Broker already running ({addr})");
                }
            })
        }
        ControlCommand::Stop => {
            let stopped = control.stop().await?;
            let obj = json!({ "stopped": stopped, "addr": addr });
            format_or_json(format, &obj, || {
                if stopped {
                    println!("Broker stopped");
                } else {
                    println!("Broker not running");
                }
            })
        }
        ControlCommand::Status => {
            let status = control.status().await?;
            format_or_json(format, &status, || print_status(&addr, &status))
        }
        ControlCommand::Restart { timeout } => {
            control.restart(Duration::from_secs(timeout)).await?;
            let obj = json!({ "restarted": true, "addr": addr });
            format_or_json(format, &obj, || println!("Broker restarted ({addr})"))
        }
    }
}

fn print_status(addr: &str, status: &Value) {
    println!("broker: {addr}");
    match status.as_object() {
        Some(map) => {
            for line in render_object(map) {
                println!("{line}");
            }
        }
        None => println!("{status}"),
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
