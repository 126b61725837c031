// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resident memory figures for heartbeats.

/// Current and peak resident set size in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub current: u64,
    pub peak: u64,
}

/// Read from `/proc/self/status` where available, otherwise fall back to
/// `getrusage`, which only knows the peak.
pub fn usage() -> MemoryUsage {
    if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
        let parsed = parse_proc_status(&status);
        if parsed.current > 0 {
            return parsed;
        }
    }
    let peak = peak_from_rusage();
    MemoryUsage { current: peak, peak }
}

fn parse_proc_status(status: &str) -> MemoryUsage {
    let mut usage = MemoryUsage::default();
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            usage.current = parse_kb(rest);
        } else if let Some(rest) = line.strip_prefix("VmHWM:") {
            usage.peak = parse_kb(rest);
        }
    }
    usage.peak = usage.peak.max(usage.current);
    usage
}

fn parse_kb(field: &str) -> u64 {
    field.split_whitespace().next().and_then(|n| n.parse::<u64>().ok()).unwrap_or(0) * 1024
}

fn peak_from_rusage() -> u64 {
    use nix::sys::resource::{getrusage, UsageWho};

    match getrusage(UsageWho::RUSAGE_SELF) {
        // ru_maxrss is kilobytes on Linux and bytes on macOS
        Ok(usage) if cfg!(target_os = "macos") => usage.max_rss() as u64,
        Ok(usage) => usage.max_rss() as u64 * 1024,
        Err(e) => {
            tracing::debug!(error = %e, "getrusage failed");
            0
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
