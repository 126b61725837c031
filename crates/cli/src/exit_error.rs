// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, so `main()` owns process termination.

use thiserror::Error;

/// Generic failure
pub const EXIT_FAILURE: i32 = 1;
/// The broker could not be reached
pub const EXIT_UNREACHABLE: i32 = 2;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn unreachable(addr: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(EXIT_UNREACHABLE, format!("cannot reach broker at {addr}: {reason}"))
    }
}

/// Exit code for a top-level error.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ExitError>().map(|e| e.code).unwrap_or(EXIT_FAILURE)
}
