// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warlock kv` specs

use serde_json::json;

use crate::prelude::*;

#[test]
fn set_then_get_across_invocations() {
    let broker = Broker::start();

    broker.cli().args(&["kv", "set", "greeting", "hello"]).passes().stdout_eq("true\n");
    broker.cli().args(&["kv", "get", "greeting"]).passes().stdout_eq("hello\n");

    assert_eq!(broker.stub.value(None, "greeting"), Some(json!("hello")));
}

#[test]
fn values_are_parsed_as_json() {
    let broker = Broker::start();

    broker.cli().args(&["kv", "set", "cfg", r#"{"retries":3}"#]).passes();
    let out = broker.cli().args(&["--output", "json", "kv", "get", "cfg"]).passes();

    assert_eq!(out.json(), json!({"retries": 3}));
}

#[test]
fn missing_key_prints_nil() {
    let broker = Broker::start();
    broker.cli().args(&["kv", "get", "nope"]).passes().stdout_eq("(nil)\n");
}

#[test]
fn counters_accumulate() {
    let broker = Broker::start();

    broker.cli().args(&["kv", "incr", "hits"]).passes().stdout_eq("1\n");
    broker.cli().args(&["kv", "incr", "hits", "10"]).passes().stdout_eq("11\n");
    broker.cli().args(&["kv", "decr", "hits"]).passes().stdout_eq("10\n");
}

#[test]
fn namespace_scopes_keys() {
    let broker = Broker::start();

    broker.cli().args(&["kv", "--namespace", "jobs", "set", "a", "1"]).passes();
    broker.cli().args(&["kv", "set", "b", "2"]).passes();

    broker.cli().args(&["kv", "keys", "--namespace", "jobs"]).passes().stdout_eq("a\n");
    broker.cli().args(&["kv", "list"]).passes().stdout_eq("b: 2\n");
    assert_eq!(broker.stub.value(Some("jobs"), "a"), Some(json!(1)));
}

#[test]
fn list_values_behave_like_a_queue() {
    let broker = Broker::start();

    broker.cli().args(&["kv", "push", "q", "first"]).passes();
    broker.cli().args(&["kv", "push", "q", "second"]).passes().stdout_eq("2\n");
    broker.cli().args(&["kv", "shift", "q"]).passes().stdout_eq("first\n");
    broker.cli().args(&["kv", "count", "q"]).passes().stdout_eq("1\n");
}

#[test]
fn unreachable_broker_exits_2() {
    cli()
        .env("WARLOCK_PORT", closed_port().to_string())
        .args(&["kv", "get", "k"])
        .fails()
        .code_is(2)
        .stderr_has("cannot reach broker");
}
