// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process signals turned into cooperative cancellation.

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels a token on SIGINT, SIGTERM or SIGQUIT.
///
/// Create one at startup and hand its token to the agent. The listener task
/// is aborted when the context is dropped.
pub struct SignalContext {
    token: CancellationToken,
    listener: JoinHandle<()>,
}

impl SignalContext {
    /// Must be called from within a tokio runtime.
    pub fn install(token: CancellationToken) -> std::io::Result<Self> {
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let mut quit = signal(SignalKind::quit())?;

        let cancel = token.clone();
        let listener = tokio::spawn(async move {
            let name = tokio::select! {
                _ = interrupt.recv() => "SIGINT",
                _ = terminate.recv() => "SIGTERM",
                _ = quit.recv() => "SIGQUIT",
                _ = cancel.cancelled() => return,
            };
            tracing::info!(signal = name, "signal received, stopping");
            cancel.cancel();
        });

        Ok(Self { token, listener })
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for SignalContext {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
