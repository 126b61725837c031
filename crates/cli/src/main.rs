// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warlock: run agents and talk to a Warlock broker.

mod client;
mod commands;
mod exit_error;
mod logging;
mod output;
#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use wl_agent::AgentConfig;

use commands::{agent::AgentArgs, control::ControlArgs, kv::KvArgs};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "warlock", version, about = "Warlock agent runtime and broker control")]
struct Cli {
    /// Configuration file (defaults to $WARLOCK_CONFIG)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long = "output", global = true, value_enum, default_value_t)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an agent until it is stopped
    Agent(AgentArgs),
    /// Start, stop and inspect the local broker
    Control(ControlArgs),
    /// Read and write the broker's key-value store
    Kv(KvArgs),
    /// Fire an event through the broker
    Trigger {
        event: String,
        /// Event data (JSON, or a plain string)
        data: Option<String>,
        /// Also deliver to this session if subscribed
        #[arg(long)]
        echo: bool,
    },
    /// Measure the round trip to the broker
    Ping,
}

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_error::exit_code(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;
    let long_running = matches!(cli.command, Commands::Agent(_));
    // one-shot commands keep stderr quiet unless asked
    let level = if long_running { config.log_level.as_str() } else { "warn" };
    let log_dir = if long_running { config.log_dir.as_deref() } else { None };
    let _guard = logging::init(level, log_dir)?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(dispatch(cli.command, config, cli.output))
}

async fn dispatch(command: Commands, config: AgentConfig, format: OutputFormat) -> Result<i32> {
    match command {
        Commands::Agent(args) => return commands::agent::run(args, config).await,
        Commands::Control(args) => commands::control::handle(args.command, &config, format).await?,
        Commands::Kv(args) => {
            let mut session = client::connect(&config).await?;
            commands::kv::handle(args, &mut session, format).await?;
        }
        Commands::Trigger { event, data, echo } => {
            let mut session = client::connect(&config).await?;
            commands::event::trigger(&mut session, &event, data.as_deref(), echo, format).await?;
        }
        Commands::Ping => {
            let mut session = client::connect(&config).await?;
            commands::event::ping(&mut session, format).await?;
        }
    }
    Ok(0)
}

/// `--config` wins over `$WARLOCK_CONFIG`; environment overrides apply either way.
fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    let config = match path {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::from_env()?,
    };
    Ok(config)
}
