// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::packet::{Packet, PacketType};

/// Errors from encoding, decoding, or framing packets
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("packet decode failed: {0}")]
    Malformed(String),

    #[error("unknown packet type: {0:#04x}")]
    UnknownType(u64),

    #[error("packet encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed")]
    ConnectionClosed,
}

#[derive(Serialize)]
struct WirePacket<'a> {
    #[serde(rename = "TYP")]
    typ: u8,
    #[serde(rename = "SID")]
    sid: &'a str,
    #[serde(rename = "TME")]
    tme: i64,
    #[serde(rename = "PLD", skip_serializing_if = "Option::is_none")]
    pld: Option<&'a Value>,
}

/// Packet codec bound to one session.
///
/// Stateless apart from the most recent decode failure, kept for callers
/// that report errors after the fact.
#[derive(Debug, Clone)]
pub struct Protocol {
    session_id: String,
    encoded: bool,
    last_error: Option<String>,
}

impl Protocol {
    pub fn new(session_id: impl Into<String>, encoded: bool) -> Self {
        Self { session_id: session_id.into(), encoded, last_error: None }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn encoded(&self) -> bool {
        self.encoded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Encode a packet stamped with the current wall-clock time.
    pub fn encode(
        &self,
        kind: PacketType,
        payload: Option<&Value>,
    ) -> Result<String, ProtocolError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        self.encode_at(kind, payload, now as i64)
    }

    pub fn encode_at(
        &self,
        kind: PacketType,
        payload: Option<&Value>,
        timestamp: i64,
    ) -> Result<String, ProtocolError> {
        let wire =
            WirePacket { typ: kind.code(), sid: &self.session_id, tme: timestamp, pld: payload };
        let json = serde_json::to_string(&wire)?;
        Ok(if self.encoded { STANDARD.encode(json) } else { json })
    }

    /// Decode one frame, remembering the failure message if it is rejected.
    pub fn decode(&mut self, frame: &str) -> Result<Packet, ProtocolError> {
        let result = self.decode_frame(frame);
        self.last_error = result.as_ref().err().map(|e| e.to_string());
        result
    }

    fn decode_frame(&self, frame: &str) -> Result<Packet, ProtocolError> {
        let frame = frame.trim();
        let json = if self.encoded {
            let bytes =
                STANDARD.decode(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| ProtocolError::Malformed(e.to_string()))?
        } else {
            frame.to_string()
        };

        let value: Value =
            serde_json::from_str(&json).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(ProtocolError::Malformed("invalid packet format".into()));
        };

        let code = match object.get("TYP") {
            None => return Err(ProtocolError::Malformed("no packet type".into())),
            Some(typ) => {
                typ.as_u64().ok_or_else(|| ProtocolError::Malformed("bad packet type".into()))?
            }
        };
        let kind = PacketType::from_code(code).ok_or(ProtocolError::UnknownType(code))?;

        let session_id = match object.remove("SID") {
            Some(Value::String(sid)) => sid,
            _ => String::new(),
        };
        let timestamp = object.get("TME").and_then(Value::as_i64).unwrap_or(0);
        let payload = object.remove("PLD");

        Ok(Packet { kind, session_id, timestamp, payload })
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
