// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callbacks for events and scheduled work.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use wl_adapters::RpcError;

use crate::session::Session;

/// Errors raised by callbacks and service hooks
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown action: {0}")]
    Unknown(String),

    #[error("bad arguments for {action}: {reason}")]
    BadArgs { action: String, reason: String },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("{0}")]
    Failed(String),
}

impl ActionError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ActionError::Failed(msg.into())
    }
}

/// A function callback. Closures of the right shape implement this directly.
#[async_trait]
pub trait Action: Send + Sync + 'static {
    async fn call(&self, session: &mut Session, args: &[Value]) -> Result<(), ActionError>;
}

#[async_trait]
impl<F> Action for F
where
    F: Fn(&mut Session, &[Value]) -> Result<(), ActionError> + Send + Sync + 'static,
{
    async fn call(&self, session: &mut Session, args: &[Value]) -> Result<(), ActionError> {
        self(session, args)
    }
}

/// What to run when an event arrives or a schedule entry comes due.
#[derive(Clone)]
pub enum Callback {
    /// Resolved by name through `Service::invoke`
    Named(String),
    Function(Arc<dyn Action>),
}

impl Callback {
    pub fn named(name: impl Into<String>) -> Self {
        Callback::Named(name.into())
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut Session, &[Value]) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Callback::Function(Arc::new(f))
    }

    pub fn from_action(action: impl Action) -> Self {
        Callback::Function(Arc::new(action))
    }

    /// Short description for logs.
    pub fn label(&self) -> String {
        match self {
            Callback::Named(name) => name.clone(),
            Callback::Function(_) => "<fn>".to_string(),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Callback::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// A unit of schedulable work: the callback plus its arguments and dedup tag.
#[derive(Debug, Clone)]
pub struct Task {
    pub callback: Callback,
    pub args: Vec<Value>,
    pub label: Option<String>,
    pub tag: Option<String>,
    pub overwrite: bool,
}

impl Task {
    pub fn new(callback: Callback) -> Self {
        Self { callback, args: Vec::new(), label: None, tag: None, overwrite: false }
    }

    pub fn named(action: impl Into<String>) -> Self {
        Self::new(Callback::named(action))
    }

    pub fn args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replace-or-skip key; see `overwrite`.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}
