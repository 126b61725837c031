// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warlock trigger` and `warlock ping`

use anyhow::Result;
use serde_json::json;
use wl_agent::Session;

use crate::output::{format_or_json, parse_value, OutputFormat};

pub async fn trigger(
    session: &mut Session,
    event: &str,
    data: Option<&str>,
    echo: bool,
    format: OutputFormat,
) -> Result<()> {
    let data = data.map(parse_value);
    session.trigger(event, data.clone(), echo).await?;
    tracing::debug!(%event, "triggered");

    let obj = json!({ "event": event, "data": data });
    format_or_json(format, &obj, || println!("Triggered '{event}'"))
}

pub async fn ping(session: &mut Session, format: OutputFormat) -> Result<()> {
    let latency = session.ping(true).await?.unwrap_or_default();
    let latency_ms = latency.as_millis() as u64;

    let obj = json!({ "latency_ms": latency_ms });
    format_or_json(format, &obj, || println!("pong ({latency_ms}ms)"))
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
