// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-slot stream wiring policy.
//!
//! A [`StreamDescriptor`] describes how one standard-stream slot of a child
//! process should be connected. Descriptors are pure values: no OS resource
//! exists until spawn renders them into the platform descriptor table.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

// ── StreamSlot ──────────────────────────────────────────────────────

/// Logical standard-stream identity, independent of the underlying OS
/// descriptor number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSlot {
    /// The child's standard input.
    Stdin,
    /// The child's standard output.
    Stdout,
    /// The child's standard error.
    Stderr,
}

impl fmt::Display for StreamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stdin => "stdin",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        };
        f.write_str(s)
    }
}

// ── AccessMode ──────────────────────────────────────────────────────

/// Access mode for a file-backed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Open an existing file for reading (stdin redirection).
    Read,
    /// Create or truncate a file for writing.
    Write,
    /// Create or append to a file.
    Append,
}

// ── StreamDescriptor ────────────────────────────────────────────────

/// Connection policy for one child file-descriptor slot.
#[derive(Debug, Clone)]
pub enum StreamDescriptor {
    /// Connect the slot to an anonymous pipe; the parent keeps the other
    /// endpoint.
    Pipe,

    /// Redirect the slot to or from a named file, opened at spawn with the
    /// given mode.
    File {
        /// Path of the file to open at spawn.
        path: PathBuf,
        /// How to open it.
        mode: AccessMode,
    },

    /// Bind the slot to an already-open handle. The handle is shared by
    /// value copies of this descriptor and duplicated at each spawn.
    Handle(Arc<File>),

    /// Inherit the corresponding stream from the parent.
    Inherit,

    /// Redirect the slot to the null device.
    Null,
}

impl StreamDescriptor {
    /// Pipe descriptor.
    #[must_use]
    pub fn pipe() -> Self {
        Self::Pipe
    }

    /// File descriptor for `path`, opened with `mode` at spawn.
    pub fn file(path: impl Into<PathBuf>, mode: AccessMode) -> Self {
        Self::File {
            path: path.into(),
            mode,
        }
    }

    /// Descriptor bound to an existing open handle.
    #[must_use]
    pub fn handle(file: File) -> Self {
        Self::Handle(Arc::new(file))
    }

    /// Inherit-from-parent descriptor.
    #[must_use]
    pub fn inherit() -> Self {
        Self::Inherit
    }

    /// Null-sink descriptor.
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Returns `true` for the [`Pipe`](StreamDescriptor::Pipe) variant,
    /// the slots that surface as parent-held endpoints after spawn.
    #[must_use]
    pub fn is_pipe(&self) -> bool {
        matches!(self, Self::Pipe)
    }

    /// Returns `true` when the slot carries data between processes: a pipe
    /// or an already-open handle. These are the descriptors `pipe_to`
    /// splices.
    #[must_use]
    pub fn is_pipe_like(&self) -> bool {
        matches!(self, Self::Pipe | Self::Handle(_))
    }

    /// Render into the OS descriptor-table argument. The only point where
    /// a descriptor touches an OS resource.
    pub(crate) fn to_stdio(&self) -> io::Result<Stdio> {
        match self {
            Self::Pipe => Ok(Stdio::piped()),
            Self::Inherit => Ok(Stdio::inherit()),
            Self::Null => Ok(Stdio::null()),
            Self::File { path, mode } => {
                let file = match mode {
                    AccessMode::Read => File::open(path)?,
                    AccessMode::Write => File::create(path)?,
                    AccessMode::Append => {
                        OpenOptions::new().create(true).append(true).open(path)?
                    }
                };
                Ok(Stdio::from(file))
            }
            Self::Handle(file) => Ok(Stdio::from(file.try_clone()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_is_the_only_endpoint_variant() {
        assert!(StreamDescriptor::pipe().is_pipe());
        assert!(!StreamDescriptor::inherit().is_pipe());
        assert!(!StreamDescriptor::null().is_pipe());
        assert!(!StreamDescriptor::file("/tmp/x", AccessMode::Write).is_pipe());
    }

    #[test]
    fn pipe_like_covers_pipe_and_handle() {
        assert!(StreamDescriptor::pipe().is_pipe_like());
        assert!(!StreamDescriptor::inherit().is_pipe_like());
        assert!(!StreamDescriptor::null().is_pipe_like());
    }

    #[test]
    fn slot_display_names() {
        assert_eq!(StreamSlot::Stdin.to_string(), "stdin");
        assert_eq!(StreamSlot::Stdout.to_string(), "stdout");
        assert_eq!(StreamSlot::Stderr.to_string(), "stderr");
    }
}
