// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warlock agent` - run an agent whose actions come from configuration

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use serde_json::Value;
use tokio::process::Command;
use wl_adapters::{PipeTransport, TcpTransport};
use wl_agent::{ActionError, Agent, AgentConfig, Service, Session, SignalContext, Transport};

use crate::output::render_value;

#[derive(Args)]
pub struct AgentArgs {
    /// Stop when the connection drops and give up after one failed connect
    #[arg(long)]
    pub once: bool,

    /// Talk to the broker over stdin/stdout instead of TCP
    #[arg(long)]
    pub stdio: bool,
}

/// Runs until stopped; returns the agent's exit code.
pub async fn run(args: AgentArgs, mut config: AgentConfig) -> Result<i32> {
    if args.once {
        config.reconnect = false;
        config.single_attempt = true;
    }
    let transport: Box<dyn Transport> = if args.stdio {
        Box::new(PipeTransport::stdio())
    } else {
        let timeout = Duration::from_secs(config.control.connect_timeout_secs);
        Box::new(
            TcpTransport::new(&config.server.host, config.server.port)
                .with_connect_timeout(timeout),
        )
    };

    let mut agent = Agent::from_config(ActionService::new(&config.name), transport, &config)?;
    let _signals = SignalContext::install(agent.stop_token())?;
    tracing::info!(
        name = %config.name,
        server = %format!("{}:{}", config.server.host, config.server.port),
        schedule = config.schedule.len(),
        subscriptions = config.subscribe.len(),
        "starting agent"
    );
    Ok(agent.main().await)
}

/// Named actions available to `[[schedule]]` and `[subscribe]` entries.
///
/// - `log MESSAGE [LEVEL]`: write to the broker log
/// - `trigger EVENT [DATA]`: fire an event
/// - `exec COMMAND [ARGS...]`: run a shell command; extra arguments are
///   passed as JSON in `WARLOCK_ARGS`
/// - `debug [DATA...]`: send the arguments to the broker's debug channel
pub struct ActionService {
    name: String,
}

impl ActionService {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl Service for ActionService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &mut self,
        action: &str,
        args: &[Value],
        session: &mut Session,
    ) -> Result<(), ActionError> {
        match action {
            "log" => {
                let message = args
                    .first()
                    .map(render_value)
                    .ok_or_else(|| bad_args(action, "missing message"))?;
                let level = args.get(1).and_then(Value::as_str).unwrap_or("info");
                let level = level
                    .parse::<tracing::Level>()
                    .map_err(|_| bad_args(action, "unknown level"))?;
                tracing::info!(%message, "log action");
                session.log(level, &message, None).await?;
                Ok(())
            }
            "trigger" => {
                let event = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| bad_args(action, "missing event"))?;
                session.trigger(event, args.get(1).cloned(), false).await?;
                Ok(())
            }
            "exec" => {
                let command = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| bad_args(action, "missing command"))?;
                exec(command, &args[1..]).await
            }
            "debug" => {
                session.debug(Value::Array(args.to_vec()), None).await?;
                Ok(())
            }
            other => Err(ActionError::Unknown(other.to_string())),
        }
    }
}

fn bad_args(action: &str, reason: &str) -> ActionError {
    ActionError::BadArgs { action: action.to_string(), reason: reason.to_string() }
}

async fn exec(command: &str, rest: &[Value]) -> Result<(), ActionError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .env("WARLOCK_ARGS", Value::Array(rest.to_vec()).to_string())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ActionError::failed(format!("failed to run `{command}`: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        tracing::debug!(%command, stdout = %stdout.trim_end(), "exec output");
    }
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(ActionError::failed(format!(
        "`{command}` exited with {}: {}",
        output.status,
        stderr.trim()
    )))
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
