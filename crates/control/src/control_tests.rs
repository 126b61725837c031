// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::os::unix::fs::PermissionsExt;

use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;
use wl_adapters::{FakeTransport, TransportCall};

use super::*;

fn own_binary_name() -> String {
    let exe = std::env::current_exe().unwrap();
    exe.file_name().unwrap().to_string_lossy().into_owned()
}

fn config_in(dir: &TempDir) -> ControlConfig {
    ControlConfig {
        runtime_path: dir.path().to_path_buf(),
        broker_binary: own_binary_name(),
        connect_timeout: Duration::from_secs(2),
        ..ControlConfig::default()
    }
}

/// Make the PID file point at this test process, which runs a binary
/// matching `broker_binary`.
fn mark_running(config: &ControlConfig) {
    std::fs::write(config.pid_path(), std::process::id().to_string()).unwrap();
}

fn control_with(config: ControlConfig, transport: &FakeTransport) -> Control {
    let fake = transport.clone();
    Control::new(config).with_connector(Arc::new(move |_: &ControlConfig| {
        Box::new(fake.clone()) as Box<dyn Transport>
    }))
}

#[test]
fn not_running_without_pid_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!Control::new(config_in(&dir)).is_running());
}

#[test]
fn running_when_pid_file_names_matching_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    mark_running(&config);
    assert!(Control::new(config).is_running());
}

#[test]
fn not_running_when_process_is_something_else() {
    let dir = tempfile::tempdir().unwrap();
    let config = ControlConfig { broker_binary: "warlockd-elsewhere".into(), ..config_in(&dir) };
    mark_running(&config);
    assert!(!Control::new(config).is_running());
}

#[tokio::test]
async fn status_when_stopped_does_not_connect() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new();
    let mut control = control_with(config_in(&dir), &transport);

    let status = control.status().await.unwrap();

    assert_eq!(status, json!({ "state": "stopped" }));
    assert_eq!(transport.connect_count(), 0);
}

#[tokio::test]
async fn status_queries_running_broker() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    mark_running(&config);
    let transport = FakeTransport::new();
    transport.respond_with(|packet| match packet.kind {
        PacketType::Status => {
            vec![(PacketType::Status, Some(json!({ "state": "running", "workers": 3 })))]
        }
        _ => vec![],
    });
    let mut control = control_with(config, &transport);

    let status = control.status().await.unwrap();

    assert_eq!(status["state"], "running");
    assert_eq!(status["workers"], 3);
    assert!(control.connected());
}

#[tokio::test]
async fn stop_when_not_running_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new();
    let mut control = control_with(config_in(&dir), &transport);

    assert!(!control.stop().await.unwrap());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn stop_sends_shutdown_and_disconnects() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    mark_running(&config);
    let transport = FakeTransport::new();
    transport.respond_with(|packet| match packet.kind {
        PacketType::Shutdown => vec![(PacketType::Ok, None)],
        _ => vec![],
    });
    let mut control = control_with(config, &transport);

    assert!(control.stop().await.unwrap());

    assert_eq!(transport.sent_of(PacketType::Shutdown).len(), 1);
    assert_eq!(transport.calls().last(), Some(&TransportCall::Disconnect));
    assert!(!control.connected());
}

#[tokio::test]
async fn stop_surfaces_broker_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    mark_running(&config);
    let transport = FakeTransport::new();
    transport.respond_with(|_| vec![(PacketType::Error, Some(json!({ "reason": "busy" })))]);
    let mut control = control_with(config, &transport);

    let err = control.stop().await.unwrap_err();
    assert!(
        matches!(err, ControlError::Rpc(RpcError::Remote(ref reason)) if reason == "busy"),
        "{err}"
    );
}

#[tokio::test]
async fn open_without_autostart_leaves_handle_disconnected() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new();
    let mut control = control_with(config_in(&dir), &transport);

    control.open().await.unwrap();

    assert!(!control.connected());
    assert_eq!(transport.connect_count(), 0);
}

#[tokio::test]
async fn open_connects_to_running_broker() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    mark_running(&config);
    let transport = FakeTransport::new();
    let mut control = control_with(config, &transport);

    control.open().await.unwrap();

    assert!(control.connected());
}

#[tokio::test]
async fn open_reports_unreachable_broker() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    mark_running(&config);
    let transport = FakeTransport::new();
    transport.refuse_all_connects();
    let mut control = control_with(config, &transport);

    let err = control.open().await.unwrap_err();
    assert!(matches!(err, ControlError::Unreachable { .. }), "{err}");
}

#[tokio::test]
async fn start_is_noop_when_already_running() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    mark_running(&config);
    let mut control = Control::new(config);

    assert!(!control.start(Duration::from_secs(1)).await.unwrap());
}

#[tokio::test]
async fn start_fails_when_binary_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config = ControlConfig {
        broker_binary: dir.path().join("no-such-broker").display().to_string(),
        ..config_in(&dir)
    };
    let mut control = Control::new(config);

    let err = control.start(Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, ControlError::Spawn { .. }), "{err}");
}

#[tokio::test]
#[serial(spawn)]
async fn start_reports_error_from_broker_log() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("failing-broker");
    let body = "#!/bin/sh\necho \"ERROR Failed to start broker: port 13080 in use\"\nexit 1\n";
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    let config = ControlConfig {
        broker_binary: script.display().to_string(),
        app_path: Some(dir.path().to_path_buf()),
        ..config_in(&dir)
    };
    let log_path = config.log_path();
    let mut control = Control::new(config);

    let err = control.start(Duration::from_secs(5)).await.unwrap_err();

    match err {
        ControlError::StartFailed(reason) => assert_eq!(reason, "port 13080 in use"),
        other => panic!("unexpected error: {other}"),
    }
    let log = std::fs::read_to_string(log_path).unwrap();
    assert!(log.starts_with(STARTUP_MARKER), "{log}");
}
