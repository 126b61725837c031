// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, BufReader, Stdin, Stdout};
use wl_wire::{write_frame, FrameReader};

use super::{Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipeState {
    Idle,
    Open,
    /// The read side hit EOF; the pipe cannot be reopened.
    Closed,
}

/// Frames over an inherited pipe pair, normally stdin/stdout of a process
/// spawned by the broker.
pub struct PipeTransport<R, W> {
    reader: FrameReader<BufReader<R>>,
    writer: W,
    state: PipeState,
}

impl PipeTransport<Stdin, Stdout> {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> PipeTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader: FrameReader::new(BufReader::new(reader)), writer, state: PipeState::Idle }
    }
}

#[async_trait]
impl<R, W> Transport for PipeTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn connect(&mut self) -> Result<(), TransportError> {
        match self.state {
            PipeState::Closed => Err(TransportError::Closed),
            _ => {
                self.state = PipeState::Open;
                Ok(())
            }
        }
    }

    async fn disconnect(&mut self) {
        if self.state == PipeState::Open {
            self.state = PipeState::Idle;
        }
    }

    fn connected(&self) -> bool {
        self.state == PipeState::Open
    }

    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        if self.state != PipeState::Open {
            return Err(TransportError::NotConnected);
        }
        let result = write_frame(&mut self.writer, frame).await;
        result.map_err(|e| {
            let err = TransportError::from(e);
            if err.is_disconnect() {
                self.state = PipeState::Closed;
            }
            err
        })
    }

    async fn recv(&mut self, timeout: Duration) -> Result<Option<String>, TransportError> {
        if self.state != PipeState::Open {
            return Err(TransportError::Closed);
        }
        let result = tokio::time::timeout(timeout, self.reader.next_frame()).await;
        match result {
            Err(_) => Ok(None),
            Ok(Ok(frame)) => Ok(Some(frame)),
            Ok(Err(e)) => {
                let err = TransportError::from(e);
                if err.is_disconnect() {
                    self.state = PipeState::Closed;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "pipe_tests.rs"]
mod tests;
