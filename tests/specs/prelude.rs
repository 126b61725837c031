// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for specs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::net::TcpListener;
pub use wl_adapters::StubBroker;
pub use wl_wire::PacketType;

/// Upper bound for polling waits
pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// `warlock` with a clean environment: no `WARLOCK_*` or `RUST_LOG` leaks
/// in from the caller.
pub fn cli() -> CliBuilder {
    let mut cmd = assert_cmd::Command::cargo_bin("warlock").expect("warlock binary");
    for (key, _) in std::env::vars() {
        if key.starts_with("WARLOCK_") || key == "RUST_LOG" {
            cmd.env_remove(key);
        }
    }
    cmd.env("NO_COLOR", "1");
    CliBuilder { cmd }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Run and require exit status 0.
    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().expect("run warlock");
        let run = RunAssert::from(output);
        assert_eq!(
            run.code,
            Some(0),
            "expected success\nstdout:\n{}\nstderr:\n{}",
            run.stdout,
            run.stderr
        );
        run
    }

    /// Run and require a non-zero exit status.
    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.output().expect("run warlock");
        let run = RunAssert::from(output);
        assert_ne!(
            run.code,
            Some(0),
            "expected failure\nstdout:\n{}\nstderr:\n{}",
            run.stdout,
            run.stderr
        );
        run
    }
}

pub struct RunAssert {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl From<std::process::Output> for RunAssert {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        self.stdout.clone()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(
            !self.stdout.contains(needle),
            "stdout unexpectedly has {needle:?}:\n{}",
            self.stdout
        );
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout, expected);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn code_is(self, code: i32) -> Self {
        assert_eq!(self.code, Some(code), "stderr:\n{}", self.stderr);
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).expect("stdout is JSON")
    }
}

/// A stub broker listening on an ephemeral local port, served from its own
/// thread so blocking CLI runs do not starve it.
pub struct Broker {
    pub port: u16,
    pub stub: StubBroker,
}

impl Broker {
    pub fn start() -> Self {
        Self::start_with(StubBroker::new())
    }

    pub fn start_with(stub: StubBroker) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        let serving = stub.clone();
        std::thread::spawn(move || {
            let runtime =
                tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap().port()).unwrap();
                let _ = serving.serve(listener).await;
            });
        });
        let port = rx.recv().expect("stub broker port");
        Self { port, stub }
    }

    /// `warlock` pointed at this broker.
    pub fn cli(&self) -> CliBuilder {
        cli().env("WARLOCK_HOST", "127.0.0.1").env("WARLOCK_PORT", self.port.to_string())
    }
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Temp directory holding a `warlock.toml`.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn config(&self, contents: &str) -> PathBuf {
        self.file("warlock.toml", contents)
    }
}

/// Poll `check` until it holds or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    check()
}
