// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod agent;
pub mod control;
pub mod event;
pub mod kv;
