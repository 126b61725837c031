// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short-lived broker sessions for one-shot commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use wl_adapters::TcpTransport;
use wl_agent::{AgentConfig, Link, Session, Transport};
use wl_core::{SessionId, SystemClock};
use wl_wire::Protocol;

use crate::exit_error::{ExitError, EXIT_FAILURE};

/// Connect to the configured broker over TCP.
pub async fn connect(config: &AgentConfig) -> Result<Session> {
    let timeout = Duration::from_secs(config.control.connect_timeout_secs);
    let transport =
        TcpTransport::new(&config.server.host, config.server.port).with_connect_timeout(timeout);
    connect_with(Box::new(transport), config).await
}

/// Connect over `transport` and authenticate when credentials are configured.
pub async fn connect_with(transport: Box<dyn Transport>, config: &AgentConfig) -> Result<Session> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let session_id = config.id.clone().unwrap_or_else(|| SessionId::new().to_string());
    let protocol = Protocol::new(session_id, config.encoded);
    let mut link = Link::new(transport, protocol, Arc::new(SystemClock))
        .with_rpc_timeout(config.rpc_timeout());
    link.connect().await.map_err(|e| ExitError::unreachable(&addr, e))?;

    let mut session =
        Session::new(link, config.name.clone()).with_acknowledged(config.acknowledged);
    if let Some(auth) = &config.auth {
        if !session.authenticate(&auth.username, &auth.password).await? {
            let message = format!("broker at {addr} rejected credentials");
            return Err(ExitError::new(EXIT_FAILURE, message).into());
        }
    }
    Ok(session)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
