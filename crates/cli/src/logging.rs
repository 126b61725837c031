// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File written under the configured log directory
pub const LOG_FILE: &str = "agent.log";

/// `RUST_LOG` when set, otherwise `level`.
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for_level(level))
}

/// Filter for a configured level string, `info` if it does not parse.
pub fn filter_for_level(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. With a log directory, output goes to a
/// non-blocking file writer whose guard must be held until exit; otherwise
/// to stderr so stdout stays free for command output and the stdio transport.
pub fn init(level: &str, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let registry = tracing_subscriber::registry().with(filter(level));
    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry.with(fmt::layer().with_writer(writer).with_ansi(false)).try_init()?;
            Ok(Some(guard))
        }
        None => {
            registry.with(fmt::layer().with_writer(std::io::stderr)).try_init()?;
            Ok(None)
        }
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
