// SPDX-License-Identifier: MIT OR Apache-2.0
//! Non-blocking reads from one child stream endpoint.

use std::time::Duration;

use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time;

use super::ExecError;
use crate::deadline::deadline_after;

pub(crate) const READ_CHUNK: usize = 8 * 1024;

/// Drain whatever is buffered on `stream` right now, without waiting.
///
/// Polls the read future once per chunk; a pending poll means the OS has
/// nothing more for us and ends the drain.
pub(crate) fn drain_ready<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Vec<u8>, ExecError> {
    let mut out = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match stream.read(&mut chunk).now_or_never() {
            Some(Ok(0)) => break,
            Some(Ok(n)) => out.extend_from_slice(&chunk[..n]),
            Some(Err(e)) => return Err(ExecError::StreamRead(e)),
            None => break,
        }
    }
    Ok(out)
}

/// Reader over one open child stream.
///
/// All bounded operations compute an absolute deadline up front and fail
/// with [`ExecError::Timeout`] once it passes; none of them block past it.
pub struct StreamReader<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> StreamReader<R> {
    /// Wrap an open stream endpoint.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Give the endpoint back.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Return whatever is already buffered, possibly nothing. Never waits
    /// for more data to arrive.
    pub fn read_available(&mut self) -> Result<Vec<u8>, ExecError> {
        drain_ready(&mut self.inner)
    }

    /// Read until end-of-stream or the deadline, whichever comes first.
    pub async fn read_all(&mut self, timeout: Duration) -> Result<Vec<u8>, ExecError> {
        let deadline = deadline_after(timeout)?;
        let mut out = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = time::timeout_at(deadline, self.inner.read(&mut chunk))
                .await
                .map_err(|_| ExecError::Timeout)?
                .map_err(ExecError::StreamRead)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }

    /// Read byte-by-byte until the accumulated tail matches `delimiter`,
    /// end-of-stream, or the deadline.
    ///
    /// The delimiter is included in the returned bytes. An empty delimiter
    /// matches immediately.
    pub async fn read_until(
        &mut self,
        delimiter: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, ExecError> {
        let deadline = deadline_after(timeout)?;
        let mut out = Vec::new();
        if delimiter.is_empty() {
            return Ok(out);
        }
        let mut byte = [0u8; 1];
        loop {
            let n = time::timeout_at(deadline, self.inner.read(&mut byte))
                .await
                .map_err(|_| ExecError::Timeout)?
                .map_err(ExecError::StreamRead)?;
            if n == 0 {
                return Ok(out);
            }
            out.push(byte[0]);
            if out.ends_with(delimiter) {
                return Ok(out);
            }
        }
    }
}
