// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output specs

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_fails() {
    cli().fails().code_is(2).stderr_has("Usage:");
}

#[test]
fn help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("agent")
        .stdout_has("control")
        .stdout_has("kv")
        .stdout_has("trigger")
        .stdout_has("ping");
}

#[test]
fn control_help_shows_subcommands() {
    cli()
        .args(&["control", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("status")
        .stdout_has("restart");
}

#[test]
fn kv_help_shows_subcommands() {
    cli()
        .args(&["kv", "--help"])
        .passes()
        .stdout_has("get")
        .stdout_has("incr")
        .stdout_has("unshift");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn unknown_output_format_is_rejected() {
    cli().args(&["--output", "yaml", "ping"]).fails().stderr_has("yaml");
}
