// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A transport paired with a protocol codec.
//!
//! `Link` is the only place that turns frames into packets. It also owns the
//! request/reply helper: one request in flight at a time, answered by the next
//! reply packet of the expected type.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use wl_core::Clock;
use wl_wire::{Packet, PacketType, Protocol, ProtocolError};

use crate::transport::{Transport, TransportError};

/// Default wait for a reply
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors from sending packets or waiting for replies
#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("no {expected} reply within {timeout:?}")]
    Timeout { expected: PacketType, timeout: Duration },

    #[error("expected {expected} reply, got {got}")]
    UnexpectedReply { expected: PacketType, got: PacketType },

    #[error("broker error: {0}")]
    Remote(String),

    #[error("reply is missing field {0:?}")]
    MissingField(&'static str),
}

impl RpcError {
    pub fn is_disconnect(&self) -> bool {
        matches!(self, RpcError::Transport(e) if e.is_disconnect())
    }
}

/// Packets the broker may push at any time. They are held back while a
/// request waits for its reply and handed out by the next `recv`.
fn is_unsolicited(kind: PacketType) -> bool {
    matches!(
        kind,
        PacketType::Event
            | PacketType::Cancel
            | PacketType::Ping
            | PacketType::Pong
            | PacketType::Status
            | PacketType::Shutdown
            | PacketType::Delay
            | PacketType::Interval
            | PacketType::Schedule
            | PacketType::Exec
    )
}

pub struct Link {
    transport: Box<dyn Transport>,
    protocol: Protocol,
    clock: Arc<dyn Clock>,
    rpc_timeout: Duration,
    held: VecDeque<Packet>,
}

impl Link {
    pub fn new(transport: Box<dyn Transport>, protocol: Protocol, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            protocol,
            clock,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            held: VecDeque::new(),
        }
    }

    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    pub fn session_id(&self) -> &str {
        self.protocol.session_id()
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub async fn connect(&mut self) -> Result<(), TransportError> {
        self.transport.connect().await
    }

    pub async fn disconnect(&mut self) {
        self.held.clear();
        self.transport.disconnect().await;
    }

    pub fn connected(&self) -> bool {
        self.transport.connected()
    }

    /// Encode and send one packet.
    pub async fn send(&mut self, kind: PacketType, payload: Option<Value>) -> Result<(), RpcError> {
        let frame = self.protocol.encode_at(kind, payload.as_ref(), self.clock.epoch_secs())?;
        tracing::trace!(packet = %kind, "send");
        self.transport.send(&frame).await?;
        Ok(())
    }

    /// Receive one packet, waiting at most `timeout`.
    ///
    /// Held-back pushes are returned first. A frame that fails to decode is
    /// reported as `RpcError::Protocol`; the link stays usable.
    pub async fn recv(&mut self, timeout: Duration) -> Result<Option<Packet>, RpcError> {
        if let Some(packet) = self.held.pop_front() {
            return Ok(Some(packet));
        }
        match self.transport.recv(timeout).await? {
            None => Ok(None),
            Some(frame) => {
                let packet = self.protocol.decode(&frame)?;
                tracing::trace!(packet = %packet.kind, "recv");
                Ok(Some(packet))
            }
        }
    }

    /// Send a request and wait for the reply of type `expect`.
    ///
    /// An ERROR reply becomes `RpcError::Remote`; any other reply type is
    /// `RpcError::UnexpectedReply`. Nothing is retried.
    pub async fn request(
        &mut self,
        kind: PacketType,
        payload: Option<Value>,
        expect: PacketType,
    ) -> Result<Packet, RpcError> {
        self.send(kind, payload).await?;

        let deadline = Instant::now() + self.rpc_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RpcError::Timeout { expected: expect, timeout: self.rpc_timeout });
            }
            let frame = match self.transport.recv(remaining).await? {
                Some(frame) => frame,
                None => continue,
            };
            let packet = match self.protocol.decode(&frame) {
                Ok(packet) => packet,
                Err(e) => {
                    tracing::warn!(error = %e, request = %kind, "dropping undecodable reply frame");
                    continue;
                }
            };

            if packet.kind == expect {
                return Ok(packet);
            }
            match packet.kind {
                PacketType::Error => {
                    let reason = packet.reason().unwrap_or("unknown error").to_string();
                    return Err(RpcError::Remote(reason));
                }
                other if is_unsolicited(other) => {
                    tracing::debug!(
                        packet = %other,
                        request = %kind,
                        "holding push during request"
                    );
                    self.held.push_back(packet);
                }
                other => return Err(RpcError::UnexpectedReply { expected: expect, got: other }),
            }
        }
    }
}

#[cfg(test)]
#[path = "link_tests.rs"]
mod tests;
