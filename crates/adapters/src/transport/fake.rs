// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory transport for tests.
//!
//! Inbound frames are queued by the test (or produced by a responder that
//! plays the broker); outbound frames are recorded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use wl_wire::{Packet, PacketType, Protocol};

use super::{Transport, TransportError};

/// Recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect,
    Disconnect,
    Send(String),
}

enum Inbound {
    Frame(String),
    Close,
}

type Responder = Arc<dyn Fn(&Packet) -> Vec<(PacketType, Option<Value>)> + Send + Sync>;

struct FakeTransportState {
    connected: bool,
    refuse_connects: usize,
    refuse_all: bool,
    inbound: VecDeque<Inbound>,
    calls: Vec<TransportCall>,
    codec: Protocol,
    responder: Option<Responder>,
}

/// Fake transport. Clones share state, so a test keeps one handle while the
/// agent owns another.
#[derive(Clone)]
pub struct FakeTransport {
    inner: Arc<Mutex<FakeTransportState>>,
    wake: Arc<Notify>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::with_encoding(false)
    }

    /// Frames pushed with `push_packet` and decoded by `sent_packets` use
    /// this armor setting.
    pub fn with_encoding(encoded: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeTransportState {
                connected: false,
                refuse_connects: 0,
                refuse_all: false,
                inbound: VecDeque::new(),
                calls: Vec::new(),
                codec: Protocol::new("broker", encoded),
                responder: None,
            })),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Fail the next `n` connect attempts.
    pub fn refuse_connects(&self, n: usize) {
        self.inner.lock().refuse_connects = n;
    }

    /// Fail every connect attempt.
    pub fn refuse_all_connects(&self) {
        self.inner.lock().refuse_all = true;
    }

    /// Queue a raw inbound frame.
    pub fn push_frame(&self, frame: impl Into<String>) {
        self.inner.lock().inbound.push_back(Inbound::Frame(frame.into()));
        self.wake.notify_one();
    }

    /// Queue an inbound packet from the broker.
    pub fn push_packet(&self, kind: PacketType, payload: Option<Value>) {
        let frame = {
            let state = self.inner.lock();
            state.codec.encode_at(kind, payload.as_ref(), 0)
        };
        if let Ok(frame) = frame {
            self.push_frame(frame);
        }
    }

    /// Queue a close; frames queued earlier are delivered first.
    pub fn push_close(&self) {
        self.inner.lock().inbound.push_back(Inbound::Close);
        self.wake.notify_one();
    }

    /// Answer every decoded outbound packet with the packets the closure returns.
    pub fn respond_with(
        &self,
        f: impl Fn(&Packet) -> Vec<(PacketType, Option<Value>)> + Send + Sync + 'static,
    ) {
        self.inner.lock().responder = Some(Arc::new(f));
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner.lock().calls.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, TransportCall::Connect)).count()
    }

    pub fn sent_frames(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TransportCall::Send(frame) => Some(frame),
                _ => None,
            })
            .collect()
    }

    /// Outbound frames that decode as packets.
    pub fn sent_packets(&self) -> Vec<Packet> {
        let frames = self.sent_frames();
        let mut codec = self.inner.lock().codec.clone();
        frames.iter().filter_map(|f| codec.decode(f).ok()).collect()
    }

    pub fn sent_of(&self, kind: PacketType) -> Vec<Packet> {
        self.sent_packets().into_iter().filter(|p| p.kind == kind).collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn pending_inbound(&self) -> usize {
        self.inner.lock().inbound.len()
    }

    fn respond(&self, frame: &str) {
        let mut state = self.inner.lock();
        let Some(responder) = state.responder.clone() else {
            return;
        };
        let Ok(packet) = state.codec.decode(frame) else {
            return;
        };
        for (kind, payload) in responder(&packet) {
            if let Ok(reply) = state.codec.encode_at(kind, payload.as_ref(), packet.timestamp) {
                state.inbound.push_back(Inbound::Frame(reply));
            }
        }
        drop(state);
        self.wake.notify_one();
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let mut state = self.inner.lock();
        state.calls.push(TransportCall::Connect);
        if state.refuse_all || state.refuse_connects > 0 {
            state.refuse_connects = state.refuse_connects.saturating_sub(1);
            return Err(TransportError::Connect {
                addr: "fake".into(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        let mut state = self.inner.lock();
        state.calls.push(TransportCall::Disconnect);
        state.connected = false;
    }

    fn connected(&self) -> bool {
        self.inner.lock().connected
    }

    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        {
            let mut state = self.inner.lock();
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            state.calls.push(TransportCall::Send(frame.to_string()));
        }
        self.respond(frame);
        Ok(())
    }

    async fn recv(&mut self, timeout: Duration) -> Result<Option<String>, TransportError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.wake.notified();
            {
                let mut state = self.inner.lock();
                if !state.connected {
                    return Err(TransportError::Closed);
                }
                match state.inbound.pop_front() {
                    Some(Inbound::Frame(frame)) => return Ok(Some(frame)),
                    Some(Inbound::Close) => {
                        state.connected = false;
                        return Err(TransportError::Closed);
                    }
                    None => {}
                }
            }
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep_until(deadline) => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
