// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PID files, process table lookups and broker log parsing.

use std::path::{Path, PathBuf};

use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Written to the broker log before each launch.
pub const STARTUP_MARKER: &str = "--- warlock: starting";

/// PID recorded in a PID file, if the file exists and holds a positive integer.
pub fn read_pid(path: &Path) -> Option<i32> {
    let text = std::fs::read_to_string(path).ok()?;
    let pid = text.trim().parse::<i32>().ok()?;
    (pid > 0).then_some(pid)
}

/// Whether `pid` is alive and, where the OS exposes command lines, running
/// a binary whose name contains `expected`.
pub fn process_matches(pid: i32, expected: &str) -> bool {
    let proc_root = Path::new("/proc");
    if proc_root.is_dir() {
        let Ok(cmdline) = std::fs::read(proc_root.join(pid.to_string()).join("cmdline")) else {
            return false;
        };
        return cmdline_matches(&cmdline, expected);
    }
    // no /proc: liveness only
    kill(Pid::from_raw(pid), None).is_ok()
}

/// `cmdline` is NUL-separated argv. Any argument whose file name contains
/// `expected` counts, so interpreters running a script also match.
fn cmdline_matches(cmdline: &[u8], expected: &str) -> bool {
    cmdline.split(|b| *b == 0).filter(|arg| !arg.is_empty()).any(|arg| {
        let arg = String::from_utf8_lossy(arg);
        Path::new(arg.as_ref())
            .file_name()
            .map(|name| name.to_string_lossy().contains(expected))
            .unwrap_or(false)
    })
}

/// Resolve the broker executable: an absolute or relative path is used
/// as-is, a bare name is looked up next to the current executable, then
/// left for PATH lookup.
pub fn find_broker_binary(name: &str) -> PathBuf {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.to_path_buf();
    }
    if let Some(dir) = std::env::current_exe().ok().as_deref().and_then(Path::parent) {
        let sibling = dir.join(name);
        if sibling.exists() {
            return sibling;
        }
    }
    PathBuf::from(name)
}

/// The reason for the most recent failed start: the last `ERROR` line after
/// the last startup marker in the broker log.
pub fn parse_startup_error(log: &str) -> Option<String> {
    let start = log.rfind(STARTUP_MARKER)?;
    let line = log[start..].lines().skip(1).filter(|l| l.contains("ERROR")).last()?;
    let message = line.split_once("ERROR").map(|(_, rest)| rest).unwrap_or(line).trim();
    let message = message.rsplit_once(": ").map(|(_, reason)| reason).unwrap_or(message);
    Some(message.trim().to_string())
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
