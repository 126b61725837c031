// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warlock kv` - broker key-value store

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{json, Value};
use wl_agent::{KvStore, RpcError, Session};

use crate::output::{format_or_json, parse_value, render_object, render_value, OutputFormat};

#[derive(Args)]
pub struct KvArgs {
    /// Key namespace
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    #[command(subcommand)]
    pub command: KvCommand,
}

/// Values are parsed as JSON when possible, otherwise taken as strings.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum KvCommand {
    /// Print a value
    Get { key: String },
    /// Store a value
    Set {
        key: String,
        value: String,
        /// Expire after this many seconds
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Check whether a key exists
    Has { key: String },
    /// Delete a key
    Del { key: String },
    /// List key names
    Keys,
    /// List values
    Vals,
    /// Print every key and value
    List,
    /// Delete every key in the namespace
    Clear,
    /// Add to a counter
    Incr {
        key: String,
        #[arg(default_value_t = 1)]
        step: i64,
    },
    /// Subtract from a counter
    Decr {
        key: String,
        #[arg(default_value_t = 1)]
        step: i64,
    },
    /// Append to a list
    Push { key: String, value: String },
    /// Remove and print the last list element
    Pop { key: String },
    /// Remove and print the first list element
    Shift { key: String },
    /// Prepend to a list
    Unshift { key: String, value: String },
    /// Print a value and delete it
    Pull { key: String },
    /// Length of a list
    Count { key: String },
}

pub async fn handle(args: KvArgs, session: &mut Session, format: OutputFormat) -> Result<()> {
    let mut kv = session.kv();
    if let Some(namespace) = args.namespace {
        kv = kv.namespace(namespace);
    }
    let command = args.command;
    let result = execute(&command, &mut kv).await?;
    format_or_json(format, &result, || print_text(&command, &result))
}

/// Run one command and return its result as JSON.
pub async fn execute(command: &KvCommand, kv: &mut KvStore<'_>) -> Result<Value, RpcError> {
    let result = match command {
        KvCommand::Get { key } => kv.get(key).await?.unwrap_or(Value::Null),
        KvCommand::Set { key, value, ttl: Some(ttl) } => {
            json!(kv.set_with_ttl(key, parse_value(value), *ttl).await?)
        }
        KvCommand::Set { key, value, ttl: None } => json!(kv.set(key, parse_value(value)).await?),
        KvCommand::Has { key } => json!(kv.has(key).await?),
        KvCommand::Del { key } => json!(kv.del(key).await?),
        KvCommand::Keys => json!(kv.keys().await?),
        KvCommand::Vals => json!(kv.vals().await?),
        KvCommand::List => kv.list().await?.map(Value::Object).unwrap_or_else(|| json!({})),
        KvCommand::Clear => json!(kv.clear().await?),
        KvCommand::Incr { key, step } => json!(kv.incr(key, *step).await?),
        KvCommand::Decr { key, step } => json!(kv.decr(key, *step).await?),
        KvCommand::Push { key, value } => json!(kv.push(key, parse_value(value)).await?),
        KvCommand::Pop { key } => kv.pop(key).await?.unwrap_or(Value::Null),
        KvCommand::Shift { key } => kv.shift(key).await?.unwrap_or(Value::Null),
        KvCommand::Unshift { key, value } => json!(kv.unshift(key, parse_value(value)).await?),
        KvCommand::Pull { key } => kv.pull(key).await?.unwrap_or(Value::Null),
        KvCommand::Count { key } => json!(kv.count(key).await?),
    };
    Ok(result)
}

fn print_text(command: &KvCommand, result: &Value) {
    match (command, result) {
        (KvCommand::Keys | KvCommand::Vals, Value::Array(items)) => {
            for item in items {
                println!("{}", render_value(item));
            }
        }
        (KvCommand::List, Value::Object(map)) => {
            for line in render_object(map) {
                println!("{line}");
            }
        }
        _ => println!("{}", render_value(result)),
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
