// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wl-adapters: transports and the request/reply link used by agents

pub mod link;
pub mod transport;

pub use link::{Link, RpcError};
pub use transport::{PipeTransport, TcpTransport, Transport, TransportError};

#[cfg(any(test, feature = "test-support"))]
pub use transport::{FakeTransport, StubBroker, TransportCall};
