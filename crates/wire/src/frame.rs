// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline framing over async byte streams.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::ProtocolError;

/// Maximum frame size (16 MB), excluding the terminator
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Write one frame followed by `\n`, then flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &str,
) -> Result<(), ProtocolError> {
    if frame.contains('\n') {
        return Err(ProtocolError::Malformed("frame contains a newline".into()));
    }
    if frame.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::Malformed(format!("frame too large: {} bytes", frame.len())));
    }
    writer.write_all(frame.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Reads newline-terminated frames.
///
/// Partial lines survive across calls, so `next_frame` can be raced against a
/// timeout without losing bytes.
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, buf: Vec::new() }
    }

    /// Bytes of an incomplete frame received so far.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Read the next frame without its terminator. Empty lines are skipped.
    pub async fn next_frame(&mut self) -> Result<String, ProtocolError> {
        loop {
            let budget = (MAX_FRAME_LEN + 1).saturating_sub(self.buf.len()) as u64;
            let n = (&mut self.inner).take(budget).read_until(b'\n', &mut self.buf).await?;

            if self.buf.last() == Some(&b'\n') {
                let mut line = std::mem::take(&mut self.buf);
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                if line.is_empty() {
                    continue;
                }
                return String::from_utf8(line)
                    .map_err(|e| ProtocolError::Malformed(e.to_string()));
            }

            if self.buf.len() > MAX_FRAME_LEN {
                self.buf.clear();
                return Err(ProtocolError::Malformed(format!(
                    "frame exceeds {MAX_FRAME_LEN} bytes"
                )));
            }
            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
        }
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
