// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

macro_rules! packet_types {
    ($( $(#[$meta:meta])* $variant:ident = $code:literal => $name:literal ),+ $(,)?) => {
        /// Packet type tag carried in the `TYP` field.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PacketType {
            $( $(#[$meta])* $variant, )+
        }

        impl PacketType {
            pub const ALL: &'static [PacketType] = &[$( PacketType::$variant, )+];

            pub fn code(self) -> u8 {
                match self {
                    $( PacketType::$variant => $code, )+
                }
            }

            pub fn from_code(code: u64) -> Option<Self> {
                match code {
                    $( $code => Some(PacketType::$variant), )+
                    _ => None,
                }
            }

            /// Upper-case name used in logs and configuration, e.g. `KVGET`.
            pub fn name(self) -> &'static str {
                match self {
                    $( PacketType::$variant => $name, )+
                }
            }
        }
    };
}

packet_types! {
    Noop = 0x00 => "NOOP",
    /// Session setup
    Init = 0x01 => "INIT",
    Auth = 0x02 => "AUTH",
    Ok = 0x03 => "OK",
    Error = 0x04 => "ERROR",
    /// Heartbeat push, or a request for one
    Status = 0x05 => "STATUS",
    Shutdown = 0x06 => "SHUTDOWN",
    Ping = 0x07 => "PING",
    Pong = 0x08 => "PONG",

    Delay = 0x10 => "DELAY",
    Schedule = 0x11 => "SCHEDULE",
    Exec = 0x12 => "EXEC",
    Cancel = 0x13 => "CANCEL",
    Interval = 0x14 => "INTERVAL",

    Subscribe = 0x20 => "SUBSCRIBE",
    Unsubscribe = 0x21 => "UNSUBSCRIBE",
    Trigger = 0x22 => "TRIGGER",
    Event = 0x23 => "EVENT",

    Enable = 0x30 => "ENABLE",
    Disable = 0x31 => "DISABLE",
    Service = 0x32 => "SERVICE",
    Spawn = 0x33 => "SPAWN",
    Kill = 0x34 => "KILL",
    Signal = 0x35 => "SIGNAL",

    KvGet = 0x40 => "KVGET",
    KvSet = 0x41 => "KVSET",
    KvHas = 0x42 => "KVHAS",
    KvDel = 0x43 => "KVDEL",
    KvList = 0x44 => "KVLIST",
    KvClear = 0x45 => "KVCLEAR",
    KvPull = 0x46 => "KVPULL",
    KvPush = 0x47 => "KVPUSH",
    KvPop = 0x48 => "KVPOP",
    KvShift = 0x49 => "KVSHIFT",
    KvUnshift = 0x50 => "KVUNSHIFT",
    KvCount = 0x51 => "KVCOUNT",
    KvIncr = 0x52 => "KVINCR",
    KvDecr = 0x53 => "KVDECR",
    KvKeys = 0x54 => "KVKEYS",
    KvVals = 0x55 => "KVVALS",

    Log = 0x90 => "LOG",
    Debug = 0x91 => "DEBUG",
}

impl PacketType {
    pub fn is_kv(self) -> bool {
        (0x40..=0x55).contains(&self.code())
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PacketType {
    type Err = String;

    /// Case-insensitive lookup by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PacketType::ALL
            .iter()
            .copied()
            .find(|ty| ty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown packet type: {s}"))
    }
}

/// A decoded packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub kind: PacketType,
    pub session_id: String,
    /// Unix seconds at the sender
    pub timestamp: i64,
    pub payload: Option<Value>,
}

impl Packet {
    pub fn new(kind: PacketType, session_id: impl Into<String>, timestamp: i64) -> Self {
        Self { kind, session_id: session_id.into(), timestamp, payload: None }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Look up a top-level payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.as_ref()?.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key)?.as_str()
    }

    /// Failure reason of an ERROR packet. Brokers send either `{"reason": ...}`
    /// or a bare string payload.
    pub fn reason(&self) -> Option<&str> {
        match self.payload.as_ref()? {
            Value::String(s) => Some(s),
            other => other.get("reason")?.as_str(),
        }
    }
}

#[cfg(test)]
#[path = "packet_tests.rs"]
mod tests;
