// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration loading specs

use crate::prelude::*;

#[test]
fn config_file_selects_broker() {
    let broker = Broker::start();
    let project = Project::empty();
    let config =
        project.config(&format!("[server]\nhost = \"127.0.0.1\"\nport = {}\n", broker.port));

    cli().args(&["--config", config.to_str().unwrap(), "ping"]).passes().stdout_has("pong");
}

#[test]
fn config_from_environment_variable() {
    let broker = Broker::start();
    let project = Project::empty();
    let config = project.config(&format!("[server]\nport = {}\n", broker.port));

    cli().env("WARLOCK_CONFIG", &config).args(&["ping"]).passes();
}

#[test]
fn environment_overrides_config_file() {
    let broker = Broker::start();
    let project = Project::empty();
    let config = project.config(&format!("[server]\nport = {}\n", closed_port()));

    broker.cli().args(&["--config", config.to_str().unwrap(), "ping"]).passes();
}

#[test]
fn unknown_field_is_rejected() {
    let project = Project::empty();
    let config = project.config("nmae = \"typo\"\n");

    cli().args(&["--config", config.to_str().unwrap(), "ping"]).fails().stderr_has("nmae");
}

#[test]
fn invalid_schedule_is_rejected() {
    let project = Project::empty();
    let config = project.config("[[schedule]]\naction = \"log\"\nwhen = \"not a cron\"\n");

    cli().args(&["--config", config.to_str().unwrap(), "agent"]).fails().stderr_has("schedule[0]");
}

#[test]
fn missing_config_file_is_reported() {
    cli()
        .args(&["--config", "/nonexistent/warlock.toml", "ping"])
        .fails()
        .stderr_has("warlock.toml");
}
