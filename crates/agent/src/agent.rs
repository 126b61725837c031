// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent state machine.
//!
//! ```text
//! Starting -> Reconnect -> Connect --(fail: backoff, retry)--> Connect
//!                            |
//!                            +--(ok)--> Init --(init() false)--> Error
//!                                        |
//!                                        +--> Ready -> Running <-> Sleep
//!
//! any state --(cancel)--> Stopping -> Stopped
//! Running --(connection lost)--> Reconnect (or Stopping without reconnect)
//! ```
//!
//! One task drives everything: the service's `run` hook, inbound packet
//! dispatch, heartbeats and the scheduler all interleave inside [`Agent::wait`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wl_adapters::{Link, RpcError, Transport};
use wl_core::{AgentStatus, EntryId, SessionId};
use wl_wire::{Packet, PacketType, Protocol};

use crate::callback::{ActionError, Callback, Task};
use crate::clock::RuntimeClock;
use crate::config::{AgentConfig, AuthConfig, ScheduleItem};
use crate::scheduler::ScheduleError;
use crate::service::{Service, Tick};
use crate::session::{self, Session};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("schedule[{index}] ({action}): {source}")]
    Schedule {
        index: usize,
        action: String,
        #[source]
        source: ScheduleError,
    },
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Reconnect after the connection drops; otherwise stop.
    pub reconnect: bool,
    /// Give up (Error) after the first failed connect.
    pub single_attempt: bool,
    pub connect_backoff: Duration,
    /// Credentials presented after every connect
    pub auth: Option<AuthConfig>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            reconnect: true,
            single_attempt: false,
            connect_backoff: Duration::from_secs(1),
            auth: None,
        }
    }
}

pub struct Agent<S: Service> {
    service: S,
    session: Session,
    options: AgentOptions,
    initialized: bool,
}

impl<S: Service> Agent<S> {
    pub fn new(service: S, session: Session) -> Self {
        Self { service, session, options: AgentOptions::default(), initialized: false }
    }

    pub fn with_options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    /// Build an agent from configuration: session id, codec, timings,
    /// declared schedule and subscriptions.
    pub fn from_config(
        service: S,
        transport: Box<dyn Transport>,
        config: &AgentConfig,
    ) -> Result<Self, AgentError> {
        let session_id = config.id.clone().unwrap_or_else(|| SessionId::new().to_string());
        let link = Link::new(
            transport,
            Protocol::new(session_id, config.encoded),
            Arc::new(RuntimeClock::new()),
        )
        .with_rpc_timeout(config.rpc_timeout());

        let mut session = Session::new(link, config.name.clone())
            .with_heartbeat(config.heartbeat())
            .with_acknowledged(config.acknowledged);
        if let Some(env) = &config.app_env {
            session = session.with_app_env(env.clone());
        }

        for (index, item) in config.schedule.iter().enumerate() {
            register_item(&mut session, item, config.boot_delay()).map_err(|source| {
                AgentError::Schedule { index, action: item.action.clone(), source }
            })?;
        }
        for (event, action) in &config.subscribe {
            session.add_subscription(event, Callback::named(action.clone()), None);
        }

        let options = AgentOptions {
            reconnect: config.reconnect,
            single_attempt: config.single_attempt,
            connect_backoff: config.connect_backoff(),
            auth: config.auth.clone(),
        };
        Ok(Self::new(service, session).with_options(options))
    }

    pub fn status(&self) -> AgentStatus {
        self.session.status()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Token that stops the agent when cancelled. Hand it to a
    /// [`SignalContext`](crate::SignalContext) to stop on SIGINT/SIGTERM/SIGQUIT.
    pub fn stop_token(&self) -> CancellationToken {
        self.session.stop_token().clone()
    }

    pub fn cancel(&mut self) {
        self.session.stop();
    }

    /// Drive the state machine to completion. Returns the process exit code:
    /// 0 after a clean stop, 1 after a fatal error.
    pub async fn main(&mut self) -> i32 {
        loop {
            if let Some(code) = self.step().await {
                return code;
            }
        }
    }

    /// Perform one transition. Returns the exit code once a terminal state
    /// has been reached.
    pub async fn step(&mut self) -> Option<i32> {
        let status = self.session.status();
        if self.session.stop_token().is_cancelled()
            && !matches!(status, AgentStatus::Stopping | AgentStatus::Stopped | AgentStatus::Error)
        {
            self.session.stop();
            return None;
        }

        match status {
            AgentStatus::Starting => {
                tracing::info!(
                    name = %self.session.name(),
                    session = %self.session.session_id(),
                    "agent starting"
                );
                self.session.set_status(AgentStatus::Reconnect);
            }
            AgentStatus::Reconnect => self.session.set_status(AgentStatus::Connect),
            AgentStatus::Connect => self.connect().await,
            AgentStatus::Init => self.init().await,
            AgentStatus::Ready => {
                self.send_heartbeat().await;
                if self.session.status() == AgentStatus::Ready {
                    self.session.set_status(AgentStatus::Running);
                }
            }
            AgentStatus::Running | AgentStatus::Sleep => self.run_once().await,
            AgentStatus::Stopping => self.shutdown().await,
            AgentStatus::Stopped => return Some(0),
            AgentStatus::Error => {
                if self.session.connected() {
                    self.session.link_mut().disconnect().await;
                }
                return Some(1);
            }
        }
        None
    }

    async fn connect(&mut self) {
        let result = self.session.link_mut().connect().await;
        match result {
            Ok(()) => {
                tracing::info!(session = %self.session.session_id(), "connected");
                self.session.set_status(AgentStatus::Init);
            }
            Err(e) if self.options.single_attempt => {
                tracing::error!(error = %e, "connect failed");
                self.session.set_status(AgentStatus::Error);
            }
            Err(e) => {
                let backoff = self.options.connect_backoff;
                tracing::warn!(
                    error = %e,
                    backoff_ms = backoff.as_millis() as u64,
                    "connect failed, retrying"
                );
                let token = self.session.stop_token().clone();
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }

    async fn init(&mut self) {
        self.session.reset_heartbeat();

        if let Some(auth) = self.options.auth.clone() {
            let result = self.session.authenticate(&auth.username, &auth.password).await;
            if let Err(e) = result {
                if self.handle_rpc_error(e, "authenticate").await {
                    return;
                }
            }
        }

        if let Err(e) = self.session.resubscribe().await {
            if self.handle_rpc_error(e, "resubscribe").await {
                return;
            }
        }

        if !self.initialized {
            self.initialized = true;
            if !self.service.init(&mut self.session).await {
                tracing::error!(service = %self.service.name(), "init failed");
                self.session.set_status(AgentStatus::Error);
                return;
            }
        }

        if self.session.status() == AgentStatus::Init {
            self.session.set_status(AgentStatus::Ready);
        }
    }

    async fn run_once(&mut self) {
        self.session.set_status(AgentStatus::Running);
        let result = self.service.run(&mut self.session).await;
        if self.session.status() != AgentStatus::Running {
            return;
        }
        match result {
            Ok(Tick::Sleep(timeout)) => {
                self.wait(timeout, AgentStatus::Running).await;
            }
            Ok(Tick::Continue) => {
                self.wait(Duration::ZERO, AgentStatus::Running).await;
            }
            Ok(Tick::Stop) => self.session.stop(),
            Err(e) => {
                self.report_failure("run", &e).await;
                let backoff = self.options.connect_backoff;
                self.wait(backoff, AgentStatus::Running).await;
            }
        }
    }

    async fn shutdown(&mut self) {
        tracing::info!(service = %self.service.name(), "shutting down");
        self.service.shutdown(&mut self.session).await;
        if self.session.connected() {
            self.session.link_mut().disconnect().await;
        }
        self.session.set_status(AgentStatus::Stopped);
    }

    /// Block for up to `timeout` while the agent stays in `expected`,
    /// dispatching inbound packets, heartbeats and due schedule entries.
    ///
    /// Returns `true` only if the deadline passed with the state unchanged.
    /// Returns `false` early on cancellation, a lost connection, or any
    /// state change made by a callback.
    pub async fn wait(&mut self, timeout: Duration, expected: AgentStatus) -> bool {
        let deadline = Instant::now() + timeout;
        let token = self.session.stop_token().clone();

        loop {
            if token.is_cancelled() {
                self.session.stop();
                return false;
            }
            if self.session.status() != expected {
                return false;
            }
            if self.session.heartbeat_due_in().is_zero() {
                self.send_heartbeat().await;
            }
            self.run_schedule().await;
            if self.session.status() != expected {
                return false;
            }

            let block = self.block_for(deadline);
            let sleeping = !block.is_zero();
            if sleeping {
                self.session.set_status(AgentStatus::Sleep);
            }
            let received = tokio::select! {
                result = self.session.link_mut().recv(block) => Some(result),
                _ = token.cancelled() => None,
            };
            if sleeping && self.session.status() == AgentStatus::Sleep {
                self.session.set_status(expected);
            }

            match received {
                None => {
                    self.session.stop();
                    return false;
                }
                Some(Ok(Some(packet))) => self.process_command(packet).await,
                Some(Ok(None)) => {}
                Some(Err(e)) if e.is_disconnect() => {
                    self.lost_connection().await;
                    return false;
                }
                Some(Err(e)) => tracing::warn!(error = %e, "dropping malformed packet"),
            }

            if Instant::now() >= deadline {
                return self.session.status() == expected;
            }
        }
    }

    /// How long the next read may block: until the deadline, the next
    /// heartbeat, or the next schedule entry, whichever comes first.
    fn block_for(&self, deadline: Instant) -> Duration {
        let mut block = deadline.saturating_duration_since(Instant::now());
        block = block.min(self.session.heartbeat_due_in());
        if let Some(next_ms) = self.session.scheduler().next_due_ms() {
            let until = next_ms.saturating_sub(self.session.now_ms());
            block = block.min(Duration::from_millis(until));
        }
        block
    }

    /// Run every schedule entry that is due. A failing callback is logged
    /// and reported; the rest of the pass still runs.
    async fn run_schedule(&mut self) {
        let now = self.session.now_ms();
        for id in self.session.scheduler().due(now) {
            // an earlier callback may have cancelled it
            let Some(entry) = self.session.scheduler().get(&id).cloned() else {
                continue;
            };
            // earlier callbacks in this pass may have taken a while
            let fired = self.session.now_ms();
            tracing::debug!(
                entry = %id,
                kind = %entry.kind,
                label = %entry.label,
                "running scheduled task"
            );
            if let Err(e) = self.call(&entry.callback, &entry.args).await {
                self.report_failure(&entry.label, &e).await;
            }
            self.session.scheduler_mut().complete(&id, fired);
        }
    }

    /// Handle one inbound packet.
    pub async fn process_command(&mut self, packet: Packet) {
        tracing::debug!(packet = %packet.kind, "command");
        match packet.kind {
            PacketType::Event => self.dispatch_event(packet).await,
            PacketType::Pong => match packet.payload.as_ref().and_then(Value::as_u64) {
                Some(sent) => {
                    self.session.record_pong(sent);
                }
                None => {
                    tracing::warn!("PONG with invalid payload");
                    let reason = json!({ "reason": "invalid PONG payload" });
                    self.reply(PacketType::Error, reason).await;
                }
            },
            PacketType::Ping => {
                let payload = packet.payload.unwrap_or(Value::Null);
                self.reply(PacketType::Pong, payload).await;
            }
            PacketType::Status => self.send_heartbeat().await,
            PacketType::Cancel => self.handle_cancel(&packet).await,
            PacketType::Shutdown => {
                tracing::info!("shutdown requested by broker");
                self.session.stop();
            }
            PacketType::Delay | PacketType::Interval | PacketType::Schedule | PacketType::Exec => {
                self.handle_exec(&packet).await
            }
            PacketType::Error => {
                let reason = packet.reason().unwrap_or("unknown");
                tracing::warn!(reason, "broker reported an error");
            }
            PacketType::Ok | PacketType::Noop => {}
            other => {
                tracing::warn!(packet = %other, "unhandled command");
                let payload = json!({
                    "data": format!("Unhandled command: {other}"),
                    "name": self.session.name(),
                });
                self.reply(PacketType::Debug, payload).await;
            }
        }
    }

    async fn dispatch_event(&mut self, packet: Packet) {
        let payload = packet.payload.unwrap_or(Value::Null);
        let Some(event) = payload.get("id").and_then(Value::as_str).map(str::to_string) else {
            tracing::warn!("event without an id");
            return;
        };
        let Some(callback) = self.session.subscription(&event).map(|s| s.callback.clone()) else {
            tracing::debug!(%event, "no subscription for event");
            return;
        };

        let named = matches!(callback, Callback::Named(_));
        if named && !self.service.before_event(&event, &payload) {
            tracing::debug!(%event, "event skipped by before_event");
            return;
        }

        let data = payload.get("data").cloned().unwrap_or(Value::Null);
        let args = [data, payload.clone()];
        match self.call(&callback, &args).await {
            Ok(()) if named => self.service.after_event(&event, &payload),
            Ok(()) => {}
            Err(e) => self.report_failure(&event, &e).await,
        }
    }

    async fn handle_cancel(&mut self, packet: &Packet) {
        let Some(task_id) = session::task_id(packet).map(str::to_string) else {
            tracing::info!("cancel requested by broker");
            self.session.stop();
            return;
        };
        if self.session.cancel(&task_id) {
            tracing::info!(task = %task_id, "task cancelled by broker");
            self.reply(PacketType::Ok, json!({ "task_id": task_id })).await;
        } else {
            let reason = format!("no such task: {task_id}");
            self.reply(PacketType::Error, json!({ "reason": reason })).await;
        }
    }

    /// The broker asks this agent to run one of its named actions: now
    /// (EXEC) or through the local scheduler.
    async fn handle_exec(&mut self, packet: &Packet) {
        let result = self.schedule_inbound(packet).await;
        match result {
            Ok(Some(id)) => self.reply(PacketType::Ok, json!({ "task_id": id })).await,
            Ok(None) => self.reply(PacketType::Ok, json!({ "command": packet.kind.name() })).await,
            Err(reason) => {
                tracing::warn!(packet = %packet.kind, %reason, "rejected exec request");
                self.reply(PacketType::Error, json!({ "reason": reason })).await;
            }
        }
    }

    async fn schedule_inbound(&mut self, packet: &Packet) -> Result<Option<EntryId>, String> {
        let action = packet
            .str_field("action")
            .or_else(|| packet.str_field("endpoint"))
            .or_else(|| {
                packet.field("exec").and_then(|e| e.get("callable")).and_then(Value::as_str)
            })
            .ok_or("missing action")?
            .to_string();
        let args = packet
            .field("args")
            .or_else(|| packet.field("exec").and_then(|e| e.get("params")))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut task = Task::named(action.clone()).args(args.clone());
        if let Some(tag) = packet.str_field("tag") {
            task = task.tag(tag);
        }
        task = task.overwrite(packet.field("overwrite").and_then(Value::as_bool).unwrap_or(false));

        let seconds = || packet.field("value").and_then(Value::as_u64).ok_or("missing value");
        let result = match packet.kind {
            PacketType::Exec => {
                self.call(&Callback::Named(action.clone()), &args)
                    .await
                    .map_err(|e| e.to_string())?;
                return Ok(None);
            }
            PacketType::Delay => self.session.delay(Duration::from_secs(seconds()?), task),
            PacketType::Interval => self.session.interval(Duration::from_secs(seconds()?), task),
            _ => match packet.field("when") {
                Some(Value::String(expr)) => self.session.cron(expr, task),
                Some(Value::Number(at)) => {
                    let at = at.as_u64().ok_or("invalid when")?;
                    let at_ms =
                        at.checked_mul(1000).ok_or_else(|| ScheduleError::OutOfRange.to_string())?;
                    self.session.schedule(at_ms, task)
                }
                _ => return Err("missing when".to_string()),
            },
        };
        result.map(Some).map_err(|e| e.to_string())
    }

    async fn call(&mut self, callback: &Callback, args: &[Value]) -> Result<(), ActionError> {
        match callback {
            Callback::Named(name) => self.service.invoke(name, args, &mut self.session).await,
            Callback::Function(action) => action.call(&mut self.session, args).await,
        }
    }

    async fn report_failure(&mut self, label: &str, error: &ActionError) {
        tracing::error!(callback = %label, error = %error, "callback failed");
        if self.session.connected() {
            self.reply(PacketType::Error, json!({ "reason": format!("{label}: {error}") })).await;
        }
    }

    async fn send_heartbeat(&mut self) {
        if let Err(e) = self.session.heartbeat().await {
            self.handle_rpc_error(e, "heartbeat").await;
        }
    }

    /// Best-effort send; a dead connection shows up on the next read.
    async fn reply(&mut self, kind: PacketType, payload: Value) {
        if let Err(e) = self.session.link_mut().send(kind, Some(payload)).await {
            tracing::debug!(packet = %kind, error = %e, "reply not sent");
        }
    }

    /// Log an RPC failure. Returns `true` when it was a lost connection and
    /// the state has moved on.
    async fn handle_rpc_error(&mut self, error: RpcError, op: &str) -> bool {
        if error.is_disconnect() {
            self.lost_connection().await;
            return true;
        }
        tracing::warn!(op, error = %error, "request failed");
        false
    }

    async fn lost_connection(&mut self) {
        self.session.link_mut().disconnect().await;
        if self.options.reconnect && !self.session.stop_token().is_cancelled() {
            tracing::warn!("connection lost, reconnecting");
            self.session.set_status(AgentStatus::Reconnect);
        } else {
            tracing::warn!("connection lost");
            self.session.stop();
        }
    }
}

fn register_item(
    session: &mut Session,
    item: &ScheduleItem,
    boot_delay: Duration,
) -> Result<EntryId, ScheduleError> {
    let mut task =
        Task::named(item.action.clone()).args(item.args.clone()).overwrite(item.overwrite);
    if let Some(label) = &item.label {
        task = task.label(label.clone());
    }
    if let Some(tag) = &item.tag {
        task = task.tag(tag.clone());
    }

    match (item.interval, item.delay, item.when.as_deref()) {
        (Some(every), _, _) => session.interval(Duration::from_secs(every), task),
        (_, Some(delay), _) => session.delay(Duration::from_secs(delay), task),
        (_, _, Some(_)) if item.is_reboot() => session.delay(boot_delay, task),
        (_, _, Some(expr)) => session.cron(expr, task),
        (None, None, None) => Err(ScheduleError::MissingTrigger),
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
