// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod config;
mod control;
mod event;
mod help;
mod kv;
