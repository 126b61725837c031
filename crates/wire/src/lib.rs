// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Warlock wire protocol.
//!
//! Wire format: one packet per `\n`-terminated line. A packet is the JSON
//! object `{"TYP": int, "SID": string, "TME": int, "PLD"?: any}`, optionally
//! base64-armored as a whole when both peers agree on it.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod frame;
mod packet;
mod protocol;

pub use frame::{write_frame, FrameReader, MAX_FRAME_LEN};
pub use packet::{Packet, PacketType};
pub use protocol::{Protocol, ProtocolError};
