// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for process spawning, I/O, and pipeline composition.

use std::path::PathBuf;

use thiserror::Error;

use super::Output;

/// Errors from process configuration, spawning, I/O, and composition.
///
/// Configuration errors (`InvalidCommand`, `InvalidWorkingDirectory`) are
/// detected before any OS resource is touched, and are mutually exclusive
/// with [`Spawn`](ExecError::Spawn): spawn checks them in that order.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command string is empty.
    #[error("command is empty")]
    InvalidCommand,

    /// The configured working directory does not exist or is not a directory.
    #[error("working directory is not a directory: {}", .0.display())]
    InvalidWorkingDirectory(PathBuf),

    /// The OS spawn primitive failed (executable not found, permission
    /// denied, descriptor-table setup failure).
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),

    /// `spawn` was called on a pipeline; only a single, unpiped command has
    /// one live handle to return.
    #[error("cannot spawn a {stages}-stage pipeline as a single process")]
    PipelineSpawn {
        /// Number of stages in the pipeline, including the first command.
        stages: usize,
    },

    /// A bounded wait, read, or collection call hit its deadline.
    #[error("operation timed out")]
    Timeout,

    /// A signal could not be delivered to a live process.
    #[error("failed to deliver signal: {0}")]
    SignalFailed(#[source] std::io::Error),

    /// A hard read error on a child stream.
    #[error("failed to read from stream: {0}")]
    StreamRead(#[source] std::io::Error),

    /// A hard write error on a child stream.
    #[error("failed to write to stream: {0}")]
    StreamWrite(#[source] std::io::Error),

    /// Flushing buffered writes to a child stream failed.
    #[error("failed to flush stream: {0}")]
    StreamFlush(#[source] std::io::Error),

    /// The OS rejected a status or wait query for the process.
    #[error("process status unavailable: {0}")]
    InvalidPid(#[source] std::io::Error),

    /// The handle was closed; no further status or I/O calls are possible.
    #[error("process handle is closed")]
    ProcessClosed,

    /// Computing `now + timeout` overflowed the monotonic clock.
    #[error("deadline arithmetic overflowed")]
    DeadlineOverflow,

    /// The command ran to completion but exited non-zero. Carries the full
    /// capture so the caller can inspect stderr.
    #[error("command failed: {}", .output.status())]
    CommandFailed {
        /// Captured stdout, stderr, and terminal status of the failed run.
        output: Output,
    },
}
