// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warlock control` specs

use crate::prelude::*;

#[test]
fn status_without_broker_reports_stopped() {
    let project = Project::empty();

    cli()
        .env("WARLOCK_RUNTIME_DIR", project.path())
        .args(&["control", "status"])
        .passes()
        .stdout_has("state: stopped");
}

#[test]
fn stop_without_broker_is_noop() {
    let project = Project::empty();

    cli()
        .env("WARLOCK_RUNTIME_DIR", project.path())
        .args(&["control", "stop"])
        .passes()
        .stdout_has("Broker not running");
}

#[test]
fn stale_pid_file_counts_as_stopped() {
    let project = Project::empty();
    project.file("warlock.pid", "999999999\n");

    let out = cli()
        .env("WARLOCK_RUNTIME_DIR", project.path())
        .args(&["--output", "json", "control", "status"])
        .passes();
    assert_eq!(out.json()["state"], "stopped");
}

#[test]
fn start_with_missing_broker_binary_fails() {
    let project = Project::empty();
    let config = project.config("[control]\nbroker_binary = \"/nonexistent/warlockd\"\n");

    cli()
        .env("WARLOCK_RUNTIME_DIR", project.path())
        .args(&["--config", config.to_str().unwrap(), "control", "start", "--timeout", "1"])
        .fails()
        .stderr_has("failed to launch");
}
