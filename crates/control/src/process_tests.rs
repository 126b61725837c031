// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_startup_error_with_blank_line_separator() {
    let log = "\
--- warlock: starting warlockd ---

ERROR Failed to start broker: address already in use
";
    assert_eq!(parse_startup_error(log).unwrap(), "address already in use");
}

#[test]
fn parse_startup_error_no_error() {
    let log = "\
--- warlock: starting warlockd ---

2026-01-01 INFO listening on 127.0.0.1:13080
";
    assert!(parse_startup_error(log).is_none());
}

#[test]
fn parse_startup_error_multiple_startups_picks_last() {
    let log = "\
--- warlock: starting warlockd ---
ERROR Failed to start broker: first failure
--- warlock: starting warlockd ---
ERROR Failed to start broker: second failure
";
    assert_eq!(parse_startup_error(log).unwrap(), "second failure");
}

#[test]
fn parse_startup_error_ignores_errors_before_marker() {
    let log = "\
ERROR Failed to start broker: stale
--- warlock: starting warlockd ---
INFO ready
";
    assert!(parse_startup_error(log).is_none());
}

#[test]
fn parse_startup_error_no_marker() {
    assert!(parse_startup_error("some random log content\n").is_none());
}

#[yare::parameterized(
    missing  = { None, None },
    empty    = { Some(""), None },
    garbage  = { Some("abc"), None },
    zero     = { Some("0"), None },
    negative = { Some("-5"), None },
    valid    = { Some("4242\n"), Some(4242) },
)]
fn read_pid_cases(contents: Option<&str>, expected: Option<i32>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warlock.pid");
    if let Some(contents) = contents {
        std::fs::write(&path, contents).unwrap();
    }
    assert_eq!(read_pid(&path), expected);
}

#[test]
fn cmdline_matching() {
    let cmdline = b"/usr/bin/php\0/opt/app/bin/warlockd\0--daemon\0";
    assert!(cmdline_matches(cmdline, "warlockd"));
    assert!(cmdline_matches(cmdline, "php"));
    assert!(!cmdline_matches(cmdline, "nginx"));
    assert!(!cmdline_matches(b"", "warlockd"));
}

#[test]
fn current_process_matches_its_own_binary() {
    let exe = std::env::current_exe().unwrap();
    let name = exe.file_name().unwrap().to_string_lossy().into_owned();
    let pid = std::process::id() as i32;
    assert!(process_matches(pid, &name));
}

#[test]
fn dead_pid_does_not_match() {
    // pid_max on Linux is at most 2^22
    assert!(!process_matches(i32::MAX - 1, "warlockd"));
}

#[test]
fn broker_path_with_directory_is_used_verbatim() {
    assert_eq!(find_broker_binary("./bin/warlockd"), PathBuf::from("./bin/warlockd"));
    assert_eq!(
        find_broker_binary("definitely-not-installed"),
        PathBuf::from("definitely-not-installed")
    );
}
