// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker-side scheduling, service control and authentication.

use std::time::Duration;

use serde_json::{json, Map, Value};
use wl_adapters::RpcError;
use wl_wire::{Packet, PacketType};

use super::Session;

/// Work for the broker to run on this application's behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTask {
    /// Callable the broker resolves, e.g. `"Jobs::cleanup"`
    pub action: String,
    pub params: Vec<Value>,
    pub tag: Option<String>,
    pub overwrite: bool,
}

impl RemoteTask {
    pub fn new(action: impl Into<String>) -> Self {
        Self { action: action.into(), params: Vec::new(), tag: None, overwrite: false }
    }

    pub fn params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl Session {
    /// Have the broker run `task` once after `delay`. Returns the broker's task id.
    pub async fn remote_delay(
        &mut self,
        delay: Duration,
        task: &RemoteTask,
    ) -> Result<String, RpcError> {
        let payload = self.exec_payload("value", json!(delay.as_secs()), task);
        self.exec_request(PacketType::Delay, payload).await
    }

    pub async fn remote_interval(
        &mut self,
        every: Duration,
        task: &RemoteTask,
    ) -> Result<String, RpcError> {
        let payload = self.exec_payload("value", json!(every.as_secs()), task);
        self.exec_request(PacketType::Interval, payload).await
    }

    /// `when` is an epoch timestamp in seconds or a cron expression.
    pub async fn remote_schedule(
        &mut self,
        when: Value,
        task: &RemoteTask,
    ) -> Result<String, RpcError> {
        let payload = self.exec_payload("when", when, task);
        self.exec_request(PacketType::Schedule, payload).await
    }

    pub async fn cancel_task(&mut self, task_id: &str) -> Result<(), RpcError> {
        self.link.request(PacketType::Cancel, Some(json!(task_id)), PacketType::Ok).await?;
        Ok(())
    }

    pub async fn enable_service(&mut self, name: &str) -> Result<(), RpcError> {
        self.link.request(PacketType::Enable, Some(json!(name)), PacketType::Ok).await?;
        Ok(())
    }

    pub async fn disable_service(&mut self, name: &str) -> Result<(), RpcError> {
        self.link.request(PacketType::Disable, Some(json!(name)), PacketType::Ok).await?;
        Ok(())
    }

    /// Broker-reported status of one service.
    pub async fn service_status(&mut self, name: &str) -> Result<Value, RpcError> {
        let reply =
            self.link.request(PacketType::Service, Some(json!(name)), PacketType::Service).await?;
        Ok(reply.payload.unwrap_or(Value::Null))
    }

    /// Broker-wide status.
    pub async fn broker_status(&mut self) -> Result<Value, RpcError> {
        let reply = self.link.request(PacketType::Status, None, PacketType::Status).await?;
        Ok(reply.payload.unwrap_or(Value::Null))
    }

    /// Returns `Ok(false)` when the broker rejects the credentials.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<bool, RpcError> {
        let payload = json!({ "username": username, "password": password });
        match self.link.request(PacketType::Auth, Some(payload), PacketType::Auth).await {
            Ok(_) => {
                tracing::info!(%username, "authenticated");
                Ok(true)
            }
            Err(RpcError::Remote(reason)) => {
                tracing::warn!(%username, %reason, "authentication rejected");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn exec_payload(&self, key: &str, value: Value, task: &RemoteTask) -> Value {
        let mut payload = Map::new();
        payload.insert(key.to_string(), value);
        payload.insert("application".into(), json!({ "env": self.app_env }));
        payload.insert("exec".into(), json!({ "callable": task.action, "params": task.params }));
        if let Some(tag) = &task.tag {
            payload.insert("tag".into(), json!(tag));
            payload.insert("overwrite".into(), json!(task.overwrite));
        }
        Value::Object(payload)
    }

    async fn exec_request(&mut self, kind: PacketType, payload: Value) -> Result<String, RpcError> {
        let reply = self.link.request(kind, Some(payload), PacketType::Ok).await?;
        task_id(&reply).map(str::to_string).ok_or(RpcError::MissingField("task_id"))
    }
}

/// Task id from an OK reply; older brokers spell it `taskID`.
pub(crate) fn task_id(packet: &Packet) -> Option<&str> {
    packet.str_field("task_id").or_else(|| packet.str_field("taskID"))
}
