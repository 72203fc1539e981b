// SPDX-License-Identifier: MIT OR Apache-2.0
//! Buffered writes to one child stream endpoint.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::ExecError;

/// Writer over one open child stream.
///
/// `write` reports how many bytes the OS accepted and never retries a
/// partial write on its own; compose [`write_all_chunked`](Self::write_all_chunked)
/// when full delivery of a large payload matters.
pub struct StreamWriter<W> {
    inner: W,
    auto_flush: bool,
    line_terminator: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> StreamWriter<W> {
    /// Wrap an open stream endpoint. Auto-flush starts disabled and the
    /// line terminator defaults to `\n`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            auto_flush: false,
            line_terminator: b"\n".to_vec(),
        }
    }

    /// Flush after every successful write.
    #[must_use]
    pub fn with_auto_flush(mut self, on: bool) -> Self {
        self.auto_flush = on;
        self
    }

    /// Terminator appended by [`write_line`](Self::write_line).
    #[must_use]
    pub fn with_line_terminator(mut self, terminator: impl Into<Vec<u8>>) -> Self {
        self.line_terminator = terminator.into();
        self
    }

    /// Give the endpoint back.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write once, returning the number of bytes the OS accepted.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize, ExecError> {
        let n = self
            .inner
            .write(data)
            .await
            .map_err(ExecError::StreamWrite)?;
        if self.auto_flush {
            self.flush().await?;
        }
        Ok(n)
    }

    /// Write `line` followed by the configured terminator, fully.
    pub async fn write_line(&mut self, line: &str) -> Result<usize, ExecError> {
        let mut buf = Vec::with_capacity(line.len() + self.line_terminator.len());
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(&self.line_terminator);
        self.inner
            .write_all(&buf)
            .await
            .map_err(ExecError::StreamWrite)?;
        if self.auto_flush {
            self.flush().await?;
        }
        Ok(buf.len())
    }

    /// Deliver all of `data` in chunks of at most `chunk_size` bytes.
    ///
    /// Each chunk is written fully before the next begins, so a large
    /// payload cannot stall on a single oversized write.
    pub async fn write_all_chunked(
        &mut self,
        data: &[u8],
        chunk_size: usize,
    ) -> Result<usize, ExecError> {
        let mut written = 0;
        for chunk in data.chunks(chunk_size.max(1)) {
            self.inner
                .write_all(chunk)
                .await
                .map_err(ExecError::StreamWrite)?;
            written += chunk.len();
            if self.auto_flush {
                self.flush().await?;
            }
        }
        Ok(written)
    }

    /// Push buffered bytes down to the OS.
    pub async fn flush(&mut self) -> Result<(), ExecError> {
        self.inner.flush().await.map_err(ExecError::StreamFlush)
    }
}
