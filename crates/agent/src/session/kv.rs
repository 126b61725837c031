// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote key-value store.
//!
//! Every call is one request answered by a reply of the same packet type
//! whose payload is the bare result. Nothing is cached locally.

use serde_json::{json, Map, Value};
use wl_adapters::RpcError;
use wl_wire::PacketType;

use super::Session;

/// Borrowed view of the broker's KV store, optionally scoped to a namespace.
pub struct KvStore<'a> {
    session: &'a mut Session,
    namespace: Option<String>,
}

impl Session {
    pub fn kv(&mut self) -> KvStore<'_> {
        KvStore { session: self, namespace: None }
    }
}

impl KvStore<'_> {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<Value>, RpcError> {
        let reply = self.call(PacketType::KvGet, self.key(key)).await?;
        Ok(non_null(reply))
    }

    pub async fn set(&mut self, key: &str, value: Value) -> Result<bool, RpcError> {
        let mut payload = self.key(key);
        payload.insert("v".into(), value);
        self.flag(PacketType::KvSet, payload).await
    }

    /// Set with an expiry in seconds.
    pub async fn set_with_ttl(
        &mut self,
        key: &str,
        value: Value,
        ttl: u64,
    ) -> Result<bool, RpcError> {
        let mut payload = self.key(key);
        payload.insert("v".into(), value);
        payload.insert("t".into(), json!(ttl));
        self.flag(PacketType::KvSet, payload).await
    }

    pub async fn has(&mut self, key: &str) -> Result<bool, RpcError> {
        self.flag(PacketType::KvHas, self.key(key)).await
    }

    pub async fn del(&mut self, key: &str) -> Result<bool, RpcError> {
        self.flag(PacketType::KvDel, self.key(key)).await
    }

    /// Drop every key in the namespace.
    pub async fn clear(&mut self) -> Result<bool, RpcError> {
        self.flag(PacketType::KvClear, self.base()).await
    }

    pub async fn list(&mut self) -> Result<Option<Map<String, Value>>, RpcError> {
        match self.call(PacketType::KvList, self.base()).await? {
            Value::Object(map) => Ok(Some(map)),
            _ => Ok(None),
        }
    }

    /// Get and delete.
    pub async fn pull(&mut self, key: &str) -> Result<Option<Value>, RpcError> {
        let reply = self.call(PacketType::KvPull, self.key(key)).await?;
        Ok(non_null(reply))
    }

    /// Append to a list value; returns the new length.
    pub async fn push(&mut self, key: &str, value: Value) -> Result<Option<u64>, RpcError> {
        let mut payload = self.key(key);
        payload.insert("v".into(), value);
        Ok(self.call(PacketType::KvPush, payload).await?.as_u64())
    }

    pub async fn pop(&mut self, key: &str) -> Result<Option<Value>, RpcError> {
        let reply = self.call(PacketType::KvPop, self.key(key)).await?;
        Ok(non_null(reply))
    }

    pub async fn shift(&mut self, key: &str) -> Result<Option<Value>, RpcError> {
        let reply = self.call(PacketType::KvShift, self.key(key)).await?;
        Ok(non_null(reply))
    }

    /// Prepend to a list value; returns the new length.
    pub async fn unshift(&mut self, key: &str, value: Value) -> Result<Option<u64>, RpcError> {
        let mut payload = self.key(key);
        payload.insert("v".into(), value);
        Ok(self.call(PacketType::KvUnshift, payload).await?.as_u64())
    }

    pub async fn incr(&mut self, key: &str, step: i64) -> Result<Option<i64>, RpcError> {
        self.step(PacketType::KvIncr, key, step).await
    }

    pub async fn decr(&mut self, key: &str, step: i64) -> Result<Option<i64>, RpcError> {
        self.step(PacketType::KvDecr, key, step).await
    }

    pub async fn keys(&mut self) -> Result<Vec<String>, RpcError> {
        let reply = self.call(PacketType::KvKeys, self.base()).await?;
        Ok(match reply {
            Value::Array(items) => {
                items.into_iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
            }
            _ => Vec::new(),
        })
    }

    pub async fn vals(&mut self) -> Result<Vec<Value>, RpcError> {
        match self.call(PacketType::KvVals, self.base()).await? {
            Value::Array(items) => Ok(items),
            _ => Ok(Vec::new()),
        }
    }

    /// Length of a list value.
    pub async fn count(&mut self, key: &str) -> Result<Option<u64>, RpcError> {
        Ok(self.call(PacketType::KvCount, self.key(key)).await?.as_u64())
    }

    fn base(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        if let Some(ns) = &self.namespace {
            payload.insert("n".into(), json!(ns));
        }
        payload
    }

    fn key(&self, key: &str) -> Map<String, Value> {
        let mut payload = self.base();
        payload.insert("k".into(), json!(key));
        payload
    }

    async fn step(
        &mut self,
        kind: PacketType,
        key: &str,
        step: i64,
    ) -> Result<Option<i64>, RpcError> {
        let mut payload = self.key(key);
        if step > 0 {
            payload.insert("s".into(), json!(step));
        }
        Ok(self.call(kind, payload).await?.as_i64())
    }

    async fn flag(
        &mut self,
        kind: PacketType,
        payload: Map<String, Value>,
    ) -> Result<bool, RpcError> {
        Ok(truthy(&self.call(kind, payload).await?))
    }

    async fn call(
        &mut self,
        kind: PacketType,
        payload: Map<String, Value>,
    ) -> Result<Value, RpcError> {
        let reply = self.session.link.request(kind, Some(Value::Object(payload)), kind).await?;
        Ok(reply.payload.unwrap_or(Value::Null))
    }
}

fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null | Value::Bool(false) => None,
        other => Some(other),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
