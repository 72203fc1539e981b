// SPDX-License-Identifier: MIT OR Apache-2.0
//! The live process handle: status polling, signal delivery, bounded
//! waiting, per-stream I/O, and deadline-bounded output collection.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use super::{ExecError, Output, Signal, Status, StreamReader, StreamSlot, StreamWriter};
use crate::deadline::deadline_after;
use crate::reader::{self, READ_CHUNK};

/// Handle to one live or finished OS process.
///
/// Owns the native child handle and the pipe endpoints for every slot that
/// was configured as a pipe at spawn. Endpoints are owned exclusively:
/// taking a reader or writer moves the endpoint out of the handle, and
/// closing a slot drops it. Dropping the `Process` releases everything;
/// [`close`](Process::close) does the same explicitly and is idempotent.
pub struct Process {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    command_line: String,
    started_at: Instant,
}

impl Process {
    pub(crate) fn from_spawn(mut child: Child, command_line: String) -> Self {
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        Self {
            child: Some(child),
            stdin,
            stdout,
            stderr,
            command_line,
            started_at: Instant::now(),
        }
    }

    /// OS process id, while the OS still tracks the child.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// The command line this process was spawned with.
    #[must_use]
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Time elapsed since spawn.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether the parent still holds a pipe endpoint for `slot`.
    #[must_use]
    pub fn has_endpoint(&self, slot: StreamSlot) -> bool {
        match slot {
            StreamSlot::Stdin => self.stdin.is_some(),
            StreamSlot::Stdout => self.stdout.is_some(),
            StreamSlot::Stderr => self.stderr.is_some(),
        }
    }

    /// Fresh status snapshot, recomputed from the OS on every call.
    pub fn status(&mut self) -> Result<Status, ExecError> {
        let child = self.child.as_mut().ok_or(ExecError::ProcessClosed)?;
        let pid = child.id();
        match child.try_wait().map_err(ExecError::InvalidPid)? {
            Some(exit) => Ok(Status::exited(&self.command_line, pid, exit)),
            None => Ok(Status::running(&self.command_line, pid)),
        }
    }

    /// Whether the OS reports the process as still running. `false` for a
    /// closed handle.
    pub fn is_running(&mut self) -> bool {
        self.status().map(|s| s.is_running()).unwrap_or(false)
    }

    /// Wait for the process to exit.
    ///
    /// With no timeout this blocks on the runtime's native child-wait until
    /// the process finishes. With a timeout, deadline expiry returns
    /// [`ExecError::Timeout`] and deliberately does NOT kill the process;
    /// terminating it is the caller's explicit choice via [`kill`](Process::kill).
    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<Status, ExecError> {
        let child = self.child.as_mut().ok_or(ExecError::ProcessClosed)?;
        let pid = child.id();
        let exit = match timeout {
            None => child.wait().await.map_err(ExecError::InvalidPid)?,
            Some(timeout) => {
                let deadline = deadline_after(timeout)?;
                match time::timeout_at(deadline, child.wait()).await {
                    Ok(result) => result.map_err(ExecError::InvalidPid)?,
                    Err(_) => return Err(ExecError::Timeout),
                }
            }
        };
        Ok(Status::exited(&self.command_line, pid, exit))
    }

    /// Deliver the default termination signal. No-op success when the
    /// process has already exited.
    pub fn kill(&mut self) -> Result<(), ExecError> {
        self.kill_with(Signal::default())
    }

    /// Deliver `signal` to the process.
    ///
    /// Success when the process has already exited (including losing the
    /// race between the liveness check and delivery); a live process that
    /// rejects delivery is [`ExecError::SignalFailed`].
    pub fn kill_with(&mut self, signal: Signal) -> Result<(), ExecError> {
        let child = self.child.as_mut().ok_or(ExecError::ProcessClosed)?;
        match child.try_wait() {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => {}
            Err(e) => return Err(ExecError::InvalidPid(e)),
        }
        let Some(pid) = child.id() else {
            return Ok(());
        };
        debug!(target: "exec_kit", pid, signal = ?signal, "delivering signal");
        deliver_signal(child, pid, signal)
    }

    /// Deadline-bounded collection of everything the child writes.
    ///
    /// Closes the caller's stdin endpoint first (no further input once
    /// collection starts), then drains stdout and stderr concurrently in
    /// one readiness loop until both reach end-of-stream, and reaps the
    /// exit status. Draining both streams in the same loop is what keeps a
    /// full pipe buffer on one stream from deadlocking the child while the
    /// parent blocks on the other.
    ///
    /// Passing a timeout bounds the whole collection: when the deadline
    /// passes, the process is killed and [`ExecError::Timeout`] returned.
    /// `None` waits as long as the child runs.
    ///
    /// A non-zero exit is still `Ok` here: this layer reports "ran to
    /// completion". [`Command::run`](crate::Command::run) is the layer that
    /// demands success.
    pub async fn output(&mut self, timeout: Option<Duration>) -> Result<Output, ExecError> {
        if self.child.is_none() {
            return Err(ExecError::ProcessClosed);
        }
        self.close_slot(StreamSlot::Stdin);
        let deadline = match timeout {
            Some(timeout) => Some(deadline_after(timeout)?),
            None => None,
        };

        let mut stdout = self.stdout.take();
        let mut stderr = self.stderr.take();
        let mut stdout_acc = Vec::new();
        let mut stderr_acc = Vec::new();
        let mut stdout_chunk = [0u8; READ_CHUNK];
        let mut stderr_chunk = [0u8; READ_CHUNK];

        while stdout.is_some() || stderr.is_some() {
            tokio::select! {
                read = read_endpoint(&mut stdout, &mut stdout_chunk) => match read {
                    Ok(0) => stdout = None,
                    Ok(n) => stdout_acc.extend_from_slice(&stdout_chunk[..n]),
                    Err(e) => return Err(ExecError::StreamRead(e)),
                },
                read = read_endpoint(&mut stderr, &mut stderr_chunk) => match read {
                    Ok(0) => stderr = None,
                    Ok(n) => stderr_acc.extend_from_slice(&stderr_chunk[..n]),
                    Err(e) => return Err(ExecError::StreamRead(e)),
                },
                () = sleep_until_opt(deadline) => {
                    warn!(
                        target: "exec_kit",
                        command = %self.command_line,
                        "collection deadline elapsed, killing process"
                    );
                    self.force_kill();
                    return Err(ExecError::Timeout);
                }
            }
        }

        // Both streams are at end-of-stream; the child has dropped its
        // ends. Reap the exit status, still bounded by the same deadline.
        let status = match deadline {
            Some(deadline) => match time::timeout_at(deadline, self.wait(None)).await {
                Ok(status) => status?,
                Err(_) => {
                    self.force_kill();
                    return Err(ExecError::Timeout);
                }
            },
            None => self.wait(None).await?,
        };
        Ok(Output::of(stdout_acc, stderr_acc, status))
    }

    /// Non-blocking drain of whatever stdout has buffered right now.
    /// Empty when nothing is ready or the endpoint is gone.
    pub fn read_stdout(&mut self) -> Result<Vec<u8>, ExecError> {
        match self.stdout.as_mut() {
            Some(stream) => reader::drain_ready(stream),
            None => Ok(Vec::new()),
        }
    }

    /// Non-blocking drain of whatever stderr has buffered right now.
    pub fn read_stderr(&mut self) -> Result<Vec<u8>, ExecError> {
        match self.stderr.as_mut() {
            Some(stream) => reader::drain_ready(stream),
            None => Ok(Vec::new()),
        }
    }

    /// Write once to the child's stdin, returning the bytes accepted.
    pub async fn write_stdin(&mut self, data: &[u8]) -> Result<usize, ExecError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            ExecError::StreamWrite(io::Error::new(
                io::ErrorKind::NotConnected,
                "stdin is not piped",
            ))
        })?;
        stdin.write(data).await.map_err(ExecError::StreamWrite)
    }

    /// Move the stdout endpoint out into a [`StreamReader`]. `None` when
    /// the slot was not piped or was already consumed.
    pub fn stdout_reader(&mut self) -> Option<StreamReader<ChildStdout>> {
        self.stdout.take().map(StreamReader::new)
    }

    /// Move the stderr endpoint out into a [`StreamReader`].
    pub fn stderr_reader(&mut self) -> Option<StreamReader<ChildStderr>> {
        self.stderr.take().map(StreamReader::new)
    }

    /// Move the stdin endpoint out into a [`StreamWriter`].
    pub fn stdin_writer(&mut self) -> Option<StreamWriter<ChildStdin>> {
        self.stdin.take().map(StreamWriter::new)
    }

    /// Drop the pipe endpoint for `slot`. Idempotent; closing a slot that
    /// was never piped or is already closed does nothing.
    pub fn close_slot(&mut self, slot: StreamSlot) {
        match slot {
            StreamSlot::Stdin => drop(self.stdin.take()),
            StreamSlot::Stdout => drop(self.stdout.take()),
            StreamSlot::Stderr => drop(self.stderr.take()),
        }
    }

    /// Close every pipe endpoint, then release the native handle.
    ///
    /// Safe to call more than once; the handle is released exactly once.
    /// Further status or I/O calls fail with [`ExecError::ProcessClosed`].
    /// Closing does not terminate a running child.
    pub fn close(&mut self) {
        self.stdin.take();
        self.stdout.take();
        self.stderr.take();
        if let Some(child) = self.child.take() {
            debug!(target: "exec_kit", command = %self.command_line, "released process handle");
            drop(child);
        }
    }

    /// Move the stdout endpoint out as a plain file handle, for splicing
    /// into a downstream stage's stdin.
    pub(crate) fn take_stdout_handle(&mut self) -> Result<std::fs::File, ExecError> {
        let stdout = self.stdout.take().ok_or_else(|| {
            ExecError::StreamRead(io::Error::new(
                io::ErrorKind::NotConnected,
                "stdout is not piped",
            ))
        })?;
        #[cfg(unix)]
        {
            let fd = stdout.into_owned_fd().map_err(ExecError::Spawn)?;
            Ok(std::fs::File::from(fd))
        }
        #[cfg(windows)]
        {
            let handle = stdout.into_owned_handle().map_err(ExecError::Spawn)?;
            Ok(std::fs::File::from(handle))
        }
    }

    /// Forced kill for deadline expiry. Best-effort; an already-exited
    /// child is not an error here.
    fn force_kill(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Err(e) = child.start_kill() {
                if e.kind() != io::ErrorKind::InvalidInput {
                    warn!(target: "exec_kit", error = %e, "failed to kill timed-out process");
                }
            }
        }
    }
}

/// Read one chunk from an optional endpoint. A missing endpoint pends
/// forever, so a retired stream never wins the readiness race.
async fn read_endpoint<R: AsyncRead + Unpin>(
    endpoint: &mut Option<R>,
    buf: &mut [u8],
) -> io::Result<usize> {
    match endpoint {
        Some(stream) => stream.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Sleep until an optional deadline; no deadline means pend forever.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(unix)]
fn deliver_signal(_child: &mut Child, pid: u32, signal: Signal) -> Result<(), ExecError> {
    match crate::signal::deliver(pid, signal) {
        Ok(()) => Ok(()),
        // Exited between the liveness check and delivery.
        Err(e) if e.raw_os_error() == Some(libc::ESRCH) => Ok(()),
        Err(e) => Err(ExecError::SignalFailed(e)),
    }
}

#[cfg(not(unix))]
fn deliver_signal(child: &mut Child, _pid: u32, _signal: Signal) -> Result<(), ExecError> {
    // Only forced termination is portable off Unix.
    match child.start_kill() {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
        Err(e) => Err(ExecError::SignalFailed(e)),
    }
}
