// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Text => {
            text_fn();
        }
    }
    Ok(())
}

/// Text form of a broker value: strings bare, null as `(nil)`, everything
/// else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "(nil)".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `key: value` lines for an object, sorted by key.
pub fn render_object(map: &serde_json::Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys.into_iter().map(|k| format!("{k}: {}", render_value(&map[k]))).collect()
}

/// Interpret a command-line argument as JSON when it parses, otherwise as a
/// plain string. `42` is a number, `"42"` and `hello` are strings.
pub fn parse_value(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}
