// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One control handle per broker address.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::config::ControlConfig;
use crate::control::{Control, ControlError};

pub type SharedControl = Arc<tokio::sync::Mutex<Control>>;

type Key = (String, u16);

#[derive(Default)]
pub struct ControlRegistry {
    controls: Mutex<HashMap<Key, SharedControl>>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static ControlRegistry {
        static GLOBAL: OnceLock<ControlRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ControlRegistry::new)
    }

    /// Handle for `config`'s address, opening one on first use.
    pub async fn acquire(&self, config: ControlConfig) -> Result<SharedControl, ControlError> {
        if let Some(existing) = self.get(&config.host, config.port) {
            return Ok(existing);
        }
        Ok(self.insert(Control::acquire(config).await?))
    }

    /// Register an already-built handle. If another caller registered the
    /// same address meanwhile, theirs wins.
    pub fn insert(&self, control: Control) -> SharedControl {
        let key = (control.config().host.clone(), control.config().port);
        let mut controls = self.controls.lock();
        let shared =
            controls.entry(key).or_insert_with(|| Arc::new(tokio::sync::Mutex::new(control)));
        Arc::clone(shared)
    }

    pub fn get(&self, host: &str, port: u16) -> Option<SharedControl> {
        self.controls.lock().get(&(host.to_string(), port)).cloned()
    }

    pub fn remove(&self, host: &str, port: u16) -> Option<SharedControl> {
        self.controls.lock().remove(&(host.to_string(), port))
    }

    pub fn len(&self) -> usize {
        self.controls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
