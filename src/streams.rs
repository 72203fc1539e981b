// SPDX-License-Identifier: MIT OR Apache-2.0
//! The per-process stream wiring table.

use std::io;
use std::process::Stdio;

use super::{StreamDescriptor, StreamSlot};

/// Immutable map from stream slot to [`StreamDescriptor`].
///
/// Every mutator returns a new table, so a `ProcessStreams` can be shared
/// freely between builders and threads. Defaults to inheriting all three
/// standard streams from the parent.
#[derive(Debug, Clone)]
pub struct ProcessStreams {
    stdin: StreamDescriptor,
    stdout: StreamDescriptor,
    stderr: StreamDescriptor,
}

impl Default for ProcessStreams {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessStreams {
    /// Table with all slots inherited from the parent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdin: StreamDescriptor::Inherit,
            stdout: StreamDescriptor::Inherit,
            stderr: StreamDescriptor::Inherit,
        }
    }

    /// Table with all three slots connected to pipes.
    #[must_use]
    pub fn piped() -> Self {
        Self {
            stdin: StreamDescriptor::Pipe,
            stdout: StreamDescriptor::Pipe,
            stderr: StreamDescriptor::Pipe,
        }
    }

    /// The descriptor configured for `slot`.
    #[must_use]
    pub fn get(&self, slot: StreamSlot) -> &StreamDescriptor {
        match slot {
            StreamSlot::Stdin => &self.stdin,
            StreamSlot::Stdout => &self.stdout,
            StreamSlot::Stderr => &self.stderr,
        }
    }

    /// Copy of this table with `slot` set to `descriptor`.
    #[must_use]
    pub fn with(&self, slot: StreamSlot, descriptor: StreamDescriptor) -> Self {
        let mut next = self.clone();
        match slot {
            StreamSlot::Stdin => next.stdin = descriptor,
            StreamSlot::Stdout => next.stdout = descriptor,
            StreamSlot::Stderr => next.stderr = descriptor,
        }
        next
    }

    /// Copy with the stdin slot replaced.
    #[must_use]
    pub fn with_stdin(&self, descriptor: StreamDescriptor) -> Self {
        self.with(StreamSlot::Stdin, descriptor)
    }

    /// Copy with the stdout slot replaced.
    #[must_use]
    pub fn with_stdout(&self, descriptor: StreamDescriptor) -> Self {
        self.with(StreamSlot::Stdout, descriptor)
    }

    /// Copy with the stderr slot replaced.
    #[must_use]
    pub fn with_stderr(&self, descriptor: StreamDescriptor) -> Self {
        self.with(StreamSlot::Stderr, descriptor)
    }

    /// Pipeline-splicing primitive.
    ///
    /// When this table's stdout slot is pipe-like, returns a copy of
    /// `target` whose stdin slot carries that same descriptor; otherwise
    /// `target` is returned unchanged. The live endpoint replaces the
    /// descriptor when the downstream stage actually spawns.
    #[must_use]
    pub fn pipe_to(&self, target: &ProcessStreams) -> ProcessStreams {
        if self.stdout.is_pipe_like() {
            target.with_stdin(self.stdout.clone())
        } else {
            target.clone()
        }
    }

    /// Render the table into the platform's descriptor-table arguments,
    /// in slot order (stdin, stdout, stderr). The first point where the
    /// configured descriptors touch OS resources.
    pub(crate) fn render(&self) -> io::Result<(Stdio, Stdio, Stdio)> {
        Ok((
            self.stdin.to_stdio()?,
            self.stdout.to_stdio()?,
            self.stderr.to_stdio()?,
        ))
    }

    /// Slots that will surface as parent-held pipe endpoints after spawn.
    #[must_use]
    pub fn piped_slots(&self) -> Vec<StreamSlot> {
        [StreamSlot::Stdin, StreamSlot::Stdout, StreamSlot::Stderr]
            .into_iter()
            .filter(|slot| self.get(*slot).is_pipe())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_inherit_everything() {
        let streams = ProcessStreams::new();
        assert!(streams.piped_slots().is_empty());
    }

    #[test]
    fn with_is_copy_on_write() {
        let base = ProcessStreams::new();
        let piped = base.with_stdout(StreamDescriptor::pipe());
        assert!(base.piped_slots().is_empty());
        assert_eq!(piped.piped_slots(), vec![StreamSlot::Stdout]);
    }

    #[test]
    fn pipe_to_splices_piped_stdout_into_target_stdin() {
        let producer = ProcessStreams::new().with_stdout(StreamDescriptor::pipe());
        let consumer = ProcessStreams::new();
        let spliced = producer.pipe_to(&consumer);
        assert!(spliced.get(StreamSlot::Stdin).is_pipe_like());
    }

    #[test]
    fn pipe_to_leaves_target_unchanged_without_piped_stdout() {
        let producer = ProcessStreams::new();
        let consumer = ProcessStreams::new().with_stdin(StreamDescriptor::null());
        let spliced = producer.pipe_to(&consumer);
        assert!(matches!(
            spliced.get(StreamSlot::Stdin),
            StreamDescriptor::Null
        ));
    }
}
