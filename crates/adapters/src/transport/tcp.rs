// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use wl_wire::{write_frame, FrameReader};

use super::{Transport, TransportError};

struct Connection {
    reader: FrameReader<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

/// Newline-framed TCP connection to a broker.
pub struct TcpTransport {
    addr: String,
    connect_timeout: Duration,
    conn: Option<Connection>,
}

impl TcpTransport {
    pub fn new(host: &str, port: u16) -> Self {
        Self { addr: format!("{host}:{port}"), connect_timeout: Duration::from_secs(5), conn: None }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| TransportError::ConnectTimeout(self.addr.clone()))?
            .map_err(|source| TransportError::Connect { addr: self.addr.clone(), source })?;
        let _ = stream.set_nodelay(true);

        let (read, write) = stream.into_split();
        self.conn =
            Some(Connection { reader: FrameReader::new(BufReader::new(read)), writer: write });
        tracing::debug!(addr = %self.addr, "tcp transport connected");
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.conn.take().is_some() {
            tracing::debug!(addr = %self.addr, "tcp transport disconnected");
        }
    }

    fn connected(&self) -> bool {
        self.conn.is_some()
    }

    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        let conn = self.conn.as_mut().ok_or(TransportError::NotConnected)?;
        let result = write_frame(&mut conn.writer, frame).await;
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = TransportError::from(e);
                if err.is_disconnect() {
                    self.conn = None;
                }
                Err(err)
            }
        }
    }

    async fn recv(&mut self, timeout: Duration) -> Result<Option<String>, TransportError> {
        let conn = self.conn.as_mut().ok_or(TransportError::Closed)?;
        let result = tokio::time::timeout(timeout, conn.reader.next_frame()).await;
        match result {
            Err(_) => Ok(None),
            Ok(Ok(frame)) => Ok(Some(frame)),
            Ok(Err(e)) => {
                let err = TransportError::from(e);
                if err.is_disconnect() {
                    self.conn = None;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tcp_tests.rs"]
mod tests;
