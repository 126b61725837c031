// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the agent crate.

use std::path::PathBuf;

/// Config file path override
pub fn config_path() -> Option<PathBuf> {
    std::env::var("WARLOCK_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

pub fn host() -> Option<String> {
    std::env::var("WARLOCK_HOST").ok().filter(|s| !s.is_empty())
}

pub fn port() -> Option<u16> {
    std::env::var("WARLOCK_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// Base64 packet armor. Accepts `1`/`true`/`yes` and `0`/`false`/`no`.
pub fn encoded() -> Option<bool> {
    std::env::var("WARLOCK_ENCODED").ok().and_then(|s| parse_flag(&s))
}

/// Fixed session id
pub fn session_id() -> Option<String> {
    std::env::var("WARLOCK_ID").ok().filter(|s| !s.is_empty())
}

/// Log filter, e.g. `debug` or `wl_agent=trace`
pub fn log_level() -> Option<String> {
    std::env::var("WARLOCK_LOG").ok().filter(|s| !s.is_empty())
}

/// Supervisor runtime directory (PID file, broker log)
pub fn runtime_dir() -> Option<PathBuf> {
    std::env::var("WARLOCK_RUNTIME_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
