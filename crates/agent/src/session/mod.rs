// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The connection-facing half of an agent.
//!
//! A `Session` is what service hooks and callbacks get to work with: the
//! link to the broker, the subscription table, the local scheduler, and
//! every outbound operation. The [`Agent`](crate::Agent) owns one and drives
//! it; nothing here blocks except the bounded RPC reply waits.

mod exec;
mod kv;

pub use exec::RemoteTask;
pub use kv::KvStore;

pub(crate) use exec::task_id;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wl_adapters::{Link, RpcError};
use wl_core::{AgentStatus, EntryId, Heartbeat};
use wl_wire::PacketType;

use crate::callback::{Callback, Task};
use crate::memory;
use crate::scheduler::{ScheduleError, Scheduler};

/// Default heartbeat cadence
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub(crate) struct Subscription {
    pub callback: Callback,
    pub filter: Option<Value>,
}

pub struct Session {
    link: Link,
    name: String,
    status: AgentStatus,
    subscriptions: HashMap<String, Subscription>,
    scheduler: Scheduler,
    started_at: i64,
    heartbeat_every: Duration,
    last_heartbeat: Option<Instant>,
    last_latency: Option<Duration>,
    app_env: Option<String>,
    acknowledged: bool,
    stop_token: CancellationToken,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut subscriptions: Vec<&str> = self.subscriptions.keys().map(String::as_str).collect();
        subscriptions.sort_unstable();
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("session_id", &self.link.session_id())
            .field("status", &self.status)
            .field("connected", &self.link.connected())
            .field("subscriptions", &subscriptions)
            .field("scheduled", &self.scheduler.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(link: Link, name: impl Into<String>) -> Self {
        let started_at = link.clock().epoch_secs();
        Self {
            link,
            name: name.into(),
            status: AgentStatus::Starting,
            subscriptions: HashMap::new(),
            scheduler: Scheduler::new(),
            started_at,
            heartbeat_every: DEFAULT_HEARTBEAT,
            last_heartbeat: None,
            last_latency: None,
            app_env: None,
            acknowledged: false,
            stop_token: CancellationToken::new(),
        }
    }

    pub fn with_heartbeat(mut self, every: Duration) -> Self {
        self.heartbeat_every = every;
        self
    }

    /// Wait for the broker to echo fire-and-forget packets back, treating
    /// anything else as an error.
    pub fn with_acknowledged(mut self, acknowledged: bool) -> Self {
        self.acknowledged = acknowledged;
        self
    }

    /// Application environment sent along with remote exec requests.
    pub fn with_app_env(mut self, env: impl Into<String>) -> Self {
        self.app_env = Some(env.into());
        self
    }

    pub fn with_stop_token(mut self, token: CancellationToken) -> Self {
        self.stop_token = token;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session_id(&self) -> &str {
        self.link.session_id()
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn connected(&self) -> bool {
        self.link.connected()
    }

    /// Wall-clock now, in epoch milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.link.clock().epoch_ms()
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    /// Round trip of the most recent ping.
    pub fn last_latency(&self) -> Option<Duration> {
        self.last_latency
    }

    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop_token
    }

    /// Ask the agent to stop at the next loop iteration.
    pub fn stop(&mut self) {
        self.stop_token.cancel();
        if !self.status.is_terminal() && self.status != AgentStatus::Stopping {
            self.set_status(AgentStatus::Stopping);
        }
    }

    pub(crate) fn set_status(&mut self, status: AgentStatus) {
        if self.status != status {
            match status {
                // sleep flips on every blocking wait
                AgentStatus::Sleep | AgentStatus::Running => {
                    tracing::trace!(from = %self.status, to = %status, "state")
                }
                _ => tracing::info!(from = %self.status, to = %status, "state"),
            }
            self.status = status;
        }
    }

    pub(crate) fn link_mut(&mut self) -> &mut Link {
        &mut self.link
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub(crate) fn subscription(&self, event: &str) -> Option<&Subscription> {
        self.subscriptions.get(event)
    }

    pub fn is_subscribed(&self, event: &str) -> bool {
        self.subscriptions.contains_key(event)
    }

    /// Subscribed event names, sorted.
    pub fn subscriptions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.subscriptions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    // -- local scheduling --

    /// Run `task` once after `delay`.
    pub fn delay(&mut self, delay: Duration, task: Task) -> Result<EntryId, ScheduleError> {
        let now = self.now_ms();
        self.scheduler.delay(now, delay, task)
    }

    /// Run `task` every `every`, starting one period from now.
    pub fn interval(&mut self, every: Duration, task: Task) -> Result<EntryId, ScheduleError> {
        let now = self.now_ms();
        self.scheduler.interval(now, every, task)
    }

    /// Run `task` once at `at_ms` (epoch milliseconds).
    pub fn schedule(&mut self, at_ms: u64, task: Task) -> Result<EntryId, ScheduleError> {
        let now = self.now_ms();
        self.scheduler.schedule(now, at_ms, task)
    }

    pub fn cron(&mut self, expr: &str, task: Task) -> Result<EntryId, ScheduleError> {
        let now = self.now_ms();
        self.scheduler.cron(now, expr, task)
    }

    pub fn cancel(&mut self, id: &str) -> bool {
        self.scheduler.cancel(id)
    }

    // -- signalling --

    /// Register `callback` for `event`, replacing any earlier one.
    ///
    /// The subscription is kept locally and re-sent after every reconnect;
    /// while disconnected it is only recorded.
    pub async fn subscribe(
        &mut self,
        event: &str,
        callback: Callback,
        filter: Option<Value>,
    ) -> Result<(), RpcError> {
        let payload = subscribe_payload(event, filter.as_ref());
        self.add_subscription(event, callback, filter);
        if self.link.connected() {
            self.notify(PacketType::Subscribe, payload).await?;
        }
        Ok(())
    }

    /// Record a subscription without telling the broker; it goes out with
    /// the next `resubscribe`.
    pub(crate) fn add_subscription(
        &mut self,
        event: &str,
        callback: Callback,
        filter: Option<Value>,
    ) {
        self.subscriptions.insert(event.to_string(), Subscription { callback, filter });
    }

    /// Returns `false` if there was no local subscription for `event`.
    pub async fn unsubscribe(&mut self, event: &str) -> Result<bool, RpcError> {
        if self.subscriptions.remove(event).is_none() {
            return Ok(false);
        }
        if self.link.connected() {
            self.notify(PacketType::Unsubscribe, json!({ "id": event })).await?;
        }
        Ok(true)
    }

    /// Re-send SUBSCRIBE for every registered event.
    pub(crate) async fn resubscribe(&mut self) -> Result<(), RpcError> {
        let mut payloads: Vec<Value> = self
            .subscriptions
            .iter()
            .map(|(event, sub)| subscribe_payload(event, sub.filter.as_ref()))
            .collect();
        payloads.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
        for payload in payloads {
            self.notify(PacketType::Subscribe, payload).await?;
        }
        Ok(())
    }

    /// Fire `event` through the broker. With `echo_self` the broker also
    /// delivers it back to this agent if subscribed.
    pub async fn trigger(
        &mut self,
        event: &str,
        data: Option<Value>,
        echo_self: bool,
    ) -> Result<(), RpcError> {
        let mut payload = json!({ "id": event, "echo": echo_self });
        if let Some(data) = data {
            payload["data"] = data;
        }
        self.notify(PacketType::Trigger, payload).await
    }

    /// Send an event to every running instance of `service`.
    pub async fn signal(
        &mut self,
        event: &str,
        service: &str,
        data: Option<Value>,
    ) -> Result<(), RpcError> {
        let mut payload = json!({ "id": event, "service": service });
        if let Some(data) = data {
            payload["data"] = data;
        }
        self.notify(PacketType::Signal, payload).await
    }

    /// Write a line to the broker's log.
    pub async fn log(
        &mut self,
        level: tracing::Level,
        message: &str,
        name: Option<&str>,
    ) -> Result<(), RpcError> {
        let name = name.unwrap_or(self.name.as_str()).to_string();
        let payload = json!({ "level": level.as_str(), "msg": message, "name": name });
        self.notify(PacketType::Log, payload).await
    }

    pub async fn debug(&mut self, data: Value, name: Option<&str>) -> Result<(), RpcError> {
        let name = name.unwrap_or(self.name.as_str()).to_string();
        self.notify(PacketType::Debug, json!({ "data": data, "name": name })).await
    }

    // -- remote services --

    /// Start a dynamic service on the broker. Returns its task id when the
    /// broker reports one.
    pub async fn spawn(
        &mut self,
        service: &str,
        params: Option<Value>,
    ) -> Result<Option<String>, RpcError> {
        let payload = json!({ "name": service, "detach": true, "params": params });
        let reply = self.link.request(PacketType::Spawn, Some(payload), PacketType::Ok).await?;
        Ok(reply.str_field("task_id").map(str::to_string))
    }

    pub async fn kill(&mut self, service: &str) -> Result<(), RpcError> {
        let payload = json!({ "name": service });
        self.link.request(PacketType::Kill, Some(payload), PacketType::Ok).await?;
        Ok(())
    }

    // -- liveness --

    /// Send a PING carrying the current time. With `wait`, block for the
    /// PONG and return the round trip.
    pub async fn ping(&mut self, wait: bool) -> Result<Option<Duration>, RpcError> {
        let sent = self.now_ms();
        if !wait {
            self.link.send(PacketType::Ping, Some(json!(sent))).await?;
            return Ok(None);
        }
        let reply = self.link.request(PacketType::Ping, Some(json!(sent)), PacketType::Pong).await?;
        let echoed =
            reply.payload.as_ref().and_then(Value::as_u64).ok_or(RpcError::MissingField("PLD"))?;
        let latency = self.record_pong(echoed);
        Ok(Some(latency))
    }

    /// Store the round trip for a PONG that echoed `sent_ms`.
    pub(crate) fn record_pong(&mut self, sent_ms: u64) -> Duration {
        let latency = Duration::from_millis(self.now_ms().saturating_sub(sent_ms));
        tracing::debug!(latency_ms = latency.as_millis() as u64, "pong");
        self.last_latency = Some(latency);
        latency
    }

    /// Push a STATUS heartbeat now.
    pub async fn heartbeat(&mut self) -> Result<(), RpcError> {
        let mem = memory::usage();
        let beat = Heartbeat::new(self.name.clone(), self.started_at, self.status)
            .with_memory(mem.current, mem.peak);
        self.last_heartbeat = Some(Instant::now());
        self.link.send(PacketType::Status, Some(beat.to_value())).await
    }

    /// Time until the next heartbeat is owed; zero if one is due now.
    pub(crate) fn heartbeat_due_in(&self) -> Duration {
        match self.last_heartbeat {
            None => Duration::ZERO,
            Some(last) => self.heartbeat_every.saturating_sub(last.elapsed()),
        }
    }

    pub(crate) fn reset_heartbeat(&mut self) {
        self.last_heartbeat = None;
    }

    /// Send-only in the default mode; with acknowledgements enabled, wait
    /// for the broker to echo the same packet type.
    async fn notify(&mut self, kind: PacketType, payload: Value) -> Result<(), RpcError> {
        if self.acknowledged {
            self.link.request(kind, Some(payload), kind).await?;
            Ok(())
        } else {
            self.link.send(kind, Some(payload)).await
        }
    }
}

fn subscribe_payload(event: &str, filter: Option<&Value>) -> Value {
    let mut payload = json!({ "id": event });
    if let Some(filter) = filter {
        payload["filter"] = filter.clone();
    }
    payload
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
