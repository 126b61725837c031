// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warlock trigger` and `warlock ping` specs

use serde_json::json;

use crate::prelude::*;

#[test]
fn trigger_reaches_broker() {
    let broker = Broker::start();

    broker
        .cli()
        .args(&["trigger", "deploy", r#"{"rev":"abc"}"#])
        .passes()
        .stdout_has("Triggered 'deploy'");

    let arrived =
        wait_for(SPEC_WAIT_MAX_MS, || !broker.stub.received_of(PacketType::Trigger).is_empty());
    assert!(arrived, "trigger never reached the broker");
    let sent = &broker.stub.received_of(PacketType::Trigger)[0];
    assert_eq!(sent.payload, Some(json!({"id": "deploy", "echo": false, "data": {"rev": "abc"}})));
}

#[test]
fn ping_reports_latency() {
    let broker = Broker::start();

    broker.cli().args(&["ping"]).passes().stdout_has("pong");
    let out = broker.cli().args(&["--output", "json", "ping"]).passes();

    assert!(out.json()["latency_ms"].is_u64());
}

#[test]
fn armored_codec_from_environment() {
    let broker = Broker::start_with(StubBroker::new().with_encoding(true));

    broker.cli().env("WARLOCK_ENCODED", "1").args(&["ping"]).passes().stdout_has("pong");
}
