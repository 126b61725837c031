// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte channels carrying encoded packets, one frame per line.

mod pipe;
mod tcp;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use wl_wire::ProtocolError;

pub use pipe::PipeTransport;
pub use tcp::TcpTransport;

/// Errors from transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    Closed,

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connect to {0} timed out")]
    ConnectTimeout(String),

    #[error("bad frame: {0}")]
    Frame(#[source] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProtocolError> for TransportError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::ConnectionClosed => TransportError::Closed,
            ProtocolError::Io(io) => TransportError::Io(io),
            other => TransportError::Frame(other),
        }
    }
}

impl TransportError {
    /// The peer is gone; the caller should reconnect or stop.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            TransportError::Closed
                | TransportError::NotConnected
                | TransportError::Io(_)
                | TransportError::Connect { .. }
                | TransportError::ConnectTimeout(_)
        )
    }
}

/// A bidirectional frame channel to the broker.
///
/// `recv` returns `Ok(None)` when the timeout elapses with no complete frame
/// and `Err(TransportError::Closed)` once the peer has gone away.
#[async_trait]
pub trait Transport: Send + 'static {
    async fn connect(&mut self) -> Result<(), TransportError>;

    async fn disconnect(&mut self);

    fn connected(&self) -> bool;

    async fn send(&mut self, frame: &str) -> Result<(), TransportError>;

    async fn recv(&mut self, timeout: Duration) -> Result<Option<String>, TransportError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
mod stub;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransport, TransportCall};
#[cfg(any(test, feature = "test-support"))]
pub use stub::StubBroker;
