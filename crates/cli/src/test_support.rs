// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use wl_adapters::{FakeTransport, StubBroker};
use wl_agent::{AgentConfig, Session};

/// Connected session backed by a stub broker.
pub async fn stub_session() -> (Session, StubBroker, FakeTransport) {
    let transport = FakeTransport::new();
    let broker = StubBroker::new();
    broker.attach(&transport);
    let session = crate::client::connect_with(Box::new(transport.clone()), &AgentConfig::default())
        .await
        .unwrap();
    (session, broker, transport)
}
