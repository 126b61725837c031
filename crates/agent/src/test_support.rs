// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for agent tests.

use std::sync::Arc;

use serde_json::{json, Value};
use wl_adapters::{FakeTransport, Link};
use wl_wire::{Packet, PacketType, Protocol};

use crate::clock::RuntimeClock;
use crate::session::Session;

pub const START_MS: u64 = 1_700_000_000_000;

pub fn link(transport: &FakeTransport) -> Link {
    Link::new(
        Box::new(transport.clone()),
        Protocol::new("ses-test", false),
        Arc::new(RuntimeClock::starting_at(START_MS)),
    )
}

/// A session over a fake transport, not yet connected.
pub fn session() -> (Session, FakeTransport) {
    let transport = FakeTransport::new();
    (Session::new(link(&transport), "test"), transport)
}

/// A session whose link is already connected.
pub async fn connected_session() -> (Session, FakeTransport) {
    let (mut session, transport) = session();
    session.link_mut().connect().await.unwrap();
    (session, transport)
}

/// Responder that keeps a map and answers KV requests like the broker does.
pub fn kv_broker(transport: &FakeTransport) {
    let store = Arc::new(parking_lot::Mutex::new(serde_json::Map::new()));
    transport.respond_with(move |packet: &Packet| {
        if !packet.kind.is_kv() {
            return Vec::new();
        }
        let mut store = store.lock();
        let key = packet.str_field("k").unwrap_or_default().to_string();
        let reply: Value = match packet.kind {
            PacketType::KvSet => {
                store.insert(key, packet.field("v").cloned().unwrap_or(Value::Null));
                json!(true)
            }
            PacketType::KvGet => store.get(&key).cloned().unwrap_or(Value::Null),
            PacketType::KvHas => json!(store.contains_key(&key)),
            PacketType::KvDel => json!(store.remove(&key).is_some()),
            PacketType::KvKeys => json!(store.keys().collect::<Vec<_>>()),
            PacketType::KvList => Value::Object(store.clone()),
            PacketType::KvIncr => {
                let step = packet.field("s").and_then(Value::as_i64).unwrap_or(1);
                let next = store.get(&key).and_then(Value::as_i64).unwrap_or(0) + step;
                store.insert(key, json!(next));
                json!(next)
            }
            _ => Value::Null,
        };
        vec![(packet.kind, Some(reply))]
    });
}
