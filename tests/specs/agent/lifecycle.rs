// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warlock agent` process lifecycle specs

use std::process::{Command, Stdio};

use crate::prelude::*;

fn agent_config(port: u16, extra: &str) -> String {
    format!(
        r#"
name = "sampler-agent"
heartbeat_secs = 1
boot_delay_secs = 0

[server]
host = "127.0.0.1"
port = {port}
{extra}
"#
    )
}

fn warlock_path() -> std::path::PathBuf {
    assert_cmd::cargo::cargo_bin("warlock")
}

#[test]
fn once_against_closed_port_exits_1() {
    let project = Project::empty();
    let config = project.config(&agent_config(closed_port(), ""));

    cli().args(&["--config", config.to_str().unwrap(), "agent", "--once"]).fails().code_is(1);
}

#[test]
fn scheduled_actions_run_and_sigterm_stops_cleanly() {
    let broker = Broker::start();
    let project = Project::empty();
    let config = project.config(&agent_config(
        broker.port,
        r#"
[[schedule]]
action = "trigger"
interval = 1
args = ["tick", {"n": 1}]

[[schedule]]
action = "log"
when = "@reboot"
args = ["booted"]
"#,
    ));

    let mut child = Command::new(warlock_path())
        .args(["--config", config.to_str().unwrap(), "agent"])
        .env_remove("WARLOCK_CONFIG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let ticked =
        wait_for(SPEC_WAIT_MAX_MS, || broker.stub.received_of(PacketType::Trigger).len() >= 2);
    let booted =
        wait_for(SPEC_WAIT_MAX_MS, || !broker.stub.received_of(PacketType::Log).is_empty());
    let heartbeats = broker.stub.received_of(PacketType::Status);

    Command::new("kill").args(["-TERM", &child.id().to_string()]).status().unwrap();
    let status = child.wait().unwrap();

    assert!(ticked, "interval action never fired twice");
    assert!(booted, "@reboot action never ran");
    assert!(!heartbeats.is_empty(), "no heartbeat sent");
    assert_eq!(heartbeats[0].field("name"), Some(&serde_json::json!("sampler-agent")));
    assert_eq!(status.code(), Some(0));
}
