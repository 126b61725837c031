// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted broker for tests.
//!
//! Keeps a key-value map, answers PING and SHUTDOWN, accepts AUTH, and echoes
//! TRIGGER back as EVENT when the sender asked for it and is subscribed.
//! Attach it to a [`FakeTransport`] or serve it over TCP.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use wl_wire::{write_frame, FrameReader, Packet, PacketType, Protocol};

use super::FakeTransport;

type Reply = (PacketType, Option<Value>);

#[derive(Default)]
struct StubState {
    store: Map<String, Value>,
    subscriptions: BTreeSet<String>,
    received: Vec<Packet>,
    credentials: Option<(String, String)>,
}

/// Clones share state.
#[derive(Clone, Default)]
pub struct StubBroker {
    inner: Arc<Mutex<StubState>>,
    encoded: bool,
}

impl StubBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the base64-armored codec when serving over TCP.
    pub fn with_encoding(mut self, encoded: bool) -> Self {
        self.encoded = encoded;
        self
    }

    /// Reject AUTH unless it carries these credentials.
    pub fn with_credentials(self, username: &str, password: &str) -> Self {
        self.inner.lock().credentials = Some((username.to_string(), password.to_string()));
        self
    }

    /// Answer requests sent through `transport`.
    pub fn attach(&self, transport: &FakeTransport) {
        let broker = self.clone();
        transport.respond_with(move |packet| broker.handle(packet));
    }

    pub fn received(&self) -> Vec<Packet> {
        self.inner.lock().received.clone()
    }

    pub fn received_of(&self, kind: PacketType) -> Vec<Packet> {
        self.inner.lock().received.iter().filter(|p| p.kind == kind).cloned().collect()
    }

    /// Stored value for `key` in `namespace`.
    pub fn value(&self, namespace: Option<&str>, key: &str) -> Option<Value> {
        self.inner.lock().store.get(&store_key(namespace, key)).cloned()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.inner.lock().subscriptions.iter().cloned().collect()
    }

    /// Replies for one inbound packet.
    pub fn handle(&self, packet: &Packet) -> Vec<Reply> {
        let mut state = self.inner.lock();
        state.received.push(packet.clone());
        if packet.kind.is_kv() {
            let reply = kv_reply(&mut state.store, packet);
            return vec![(packet.kind, Some(reply))];
        }
        match packet.kind {
            PacketType::Ping => vec![(PacketType::Pong, packet.payload.clone())],
            // a bare STATUS is a query; one with a payload is a heartbeat
            PacketType::Status if packet.payload.is_none() => {
                vec![(PacketType::Status, Some(json!({ "state": "running" })))]
            }
            PacketType::Shutdown => vec![(PacketType::Ok, None)],
            PacketType::Auth => {
                let user = packet.str_field("username").unwrap_or_default();
                let pass = packet.str_field("password").unwrap_or_default();
                match &state.credentials {
                    Some((u, p)) if u != user || p != pass => {
                        vec![(PacketType::Error, Some(json!({ "reason": "invalid credentials" })))]
                    }
                    _ => vec![(PacketType::Auth, Some(json!(true)))],
                }
            }
            PacketType::Subscribe => {
                if let Some(id) = packet.str_field("id") {
                    state.subscriptions.insert(id.to_string());
                }
                Vec::new()
            }
            PacketType::Unsubscribe => {
                if let Some(id) = packet.str_field("id") {
                    state.subscriptions.remove(id);
                }
                Vec::new()
            }
            PacketType::Trigger => {
                let id = packet.str_field("id").unwrap_or_default();
                let echo = packet.field("echo").and_then(Value::as_bool).unwrap_or(false);
                if echo && state.subscriptions.contains(id) {
                    let data = packet.field("data").cloned().unwrap_or(Value::Null);
                    vec![(PacketType::Event, Some(json!({ "id": id, "data": data })))]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    /// Accept connections until the listener fails. Each connection is
    /// served on its own task.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, _) = listener.accept().await?;
            let broker = self.clone();
            tokio::spawn(async move {
                if let Err(e) = broker.serve_connection(stream).await {
                    tracing::debug!(error = %e, "stub broker connection ended");
                }
            });
        }
    }

    async fn serve_connection(&self, stream: TcpStream) -> Result<(), wl_wire::ProtocolError> {
        let (read, mut write) = stream.into_split();
        let mut reader = FrameReader::new(BufReader::new(read));
        let mut codec = Protocol::new("broker", self.encoded);
        loop {
            let frame = reader.next_frame().await?;
            let Ok(packet) = codec.decode(&frame) else {
                continue;
            };
            for (kind, payload) in self.handle(&packet) {
                let reply = codec.encode_at(kind, payload.as_ref(), packet.timestamp)?;
                write_frame(&mut write, &reply).await?;
            }
        }
    }
}

fn store_key(namespace: Option<&str>, key: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}:{key}"),
        None => key.to_string(),
    }
}

fn kv_reply(store: &mut Map<String, Value>, packet: &Packet) -> Value {
    let namespace = packet.str_field("n");
    let key = store_key(namespace, packet.str_field("k").unwrap_or_default());
    let prefix = namespace.map(|ns| format!("{ns}:"));
    let in_namespace = |k: &str| match &prefix {
        Some(p) => k.strip_prefix(p.as_str()).map(str::to_string),
        None => (!k.contains(':')).then(|| k.to_string()),
    };
    let value = packet.field("v").cloned().unwrap_or(Value::Null);

    match packet.kind {
        PacketType::KvGet => store.get(&key).cloned().unwrap_or(Value::Null),
        PacketType::KvSet => {
            store.insert(key, value);
            json!(true)
        }
        PacketType::KvHas => json!(store.contains_key(&key)),
        PacketType::KvDel => json!(store.remove(&key).is_some()),
        PacketType::KvPull => store.remove(&key).unwrap_or(Value::Null),
        PacketType::KvList => {
            let listed: Map<String, Value> = store
                .iter()
                .filter_map(|(k, v)| in_namespace(k).map(|short| (short, v.clone())))
                .collect();
            Value::Object(listed)
        }
        PacketType::KvKeys => {
            json!(store.keys().filter_map(|k| in_namespace(k)).collect::<Vec<_>>())
        }
        PacketType::KvVals => {
            let vals: Vec<Value> = store
                .iter()
                .filter(|(k, _)| in_namespace(k).is_some())
                .map(|(_, v)| v.clone())
                .collect();
            json!(vals)
        }
        PacketType::KvClear => {
            store.retain(|k, _| in_namespace(k).is_none());
            json!(true)
        }
        PacketType::KvIncr | PacketType::KvDecr => {
            let step = packet.field("s").and_then(Value::as_i64).unwrap_or(1);
            let step = if packet.kind == PacketType::KvDecr { -step } else { step };
            let next = store.get(&key).and_then(Value::as_i64).unwrap_or(0) + step;
            store.insert(key, json!(next));
            json!(next)
        }
        PacketType::KvPush | PacketType::KvUnshift => {
            let entry = store.entry(key).or_insert_with(|| json!([]));
            if !entry.is_array() {
                *entry = json!([]);
            }
            match entry.as_array_mut() {
                Some(items) => {
                    if packet.kind == PacketType::KvPush {
                        items.push(value);
                    } else {
                        items.insert(0, value);
                    }
                    json!(items.len())
                }
                None => Value::Null,
            }
        }
        PacketType::KvPop | PacketType::KvShift => {
            let Some(items) = store.get_mut(&key).and_then(Value::as_array_mut) else {
                return Value::Null;
            };
            if items.is_empty() {
                return Value::Null;
            }
            if packet.kind == PacketType::KvPop {
                items.pop().unwrap_or(Value::Null)
            } else {
                items.remove(0)
            }
        }
        PacketType::KvCount => {
            store
                .get(&key)
                .and_then(Value::as_array)
                .map(|items| json!(items.len()))
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

#[cfg(test)]
#[path = "stub_tests.rs"]
mod tests;
