// SPDX-License-Identifier: MIT OR Apache-2.0
//! Point-in-time process status snapshots and captured run output.

use std::borrow::Cow;
use std::fmt;
use std::process::ExitStatus;

use serde::Serialize;

// ── Status ──────────────────────────────────────────────────────────

/// Immutable snapshot of a process's OS-reported state, taken at one point
/// in time.
///
/// A snapshot never updates itself; [`Process::status`](crate::Process::status)
/// recomputes a fresh one on every call.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    command: String,
    pid: Option<u32>,
    running: bool,
    signaled: bool,
    stopped: bool,
    exit_code: Option<i32>,
    term_signal: Option<i32>,
    stop_signal: Option<i32>,
}

impl Status {
    /// Snapshot for a process the OS still reports as running.
    pub(crate) fn running(command: &str, pid: Option<u32>) -> Self {
        Self {
            command: command.to_owned(),
            pid,
            running: true,
            signaled: false,
            stopped: false,
            exit_code: None,
            term_signal: None,
            stop_signal: None,
        }
    }

    /// Snapshot for a process that has exited with `exit`.
    pub(crate) fn exited(command: &str, pid: Option<u32>, exit: ExitStatus) -> Self {
        let term_signal;
        let stop_signal;
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            term_signal = exit.signal();
            stop_signal = exit.stopped_signal();
        }
        #[cfg(not(unix))]
        {
            term_signal = None;
            stop_signal = None;
        }
        Self {
            command: command.to_owned(),
            pid,
            running: false,
            signaled: term_signal.is_some(),
            stopped: stop_signal.is_some(),
            exit_code: exit.code(),
            term_signal,
            stop_signal,
        }
    }

    /// The command line this process was spawned with.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// OS process id, if the OS still had one at snapshot time.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the process was still running at snapshot time.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the process was terminated by a signal.
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.signaled
    }

    /// Whether the process was stopped by a signal.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Exit code, when the process exited normally.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Number of the signal that terminated the process, if any.
    #[must_use]
    pub fn term_signal(&self) -> Option<i32> {
        self.term_signal
    }

    /// Number of the signal that stopped the process, if any.
    #[must_use]
    pub fn stop_signal(&self) -> Option<i32> {
        self.stop_signal
    }

    /// `true` when the process exited with code zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// `true` when the process finished without exiting zero: non-zero
    /// code or signal termination.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.running && !self.success()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.running {
            match self.pid {
                Some(pid) => write!(f, "running (pid {pid})"),
                None => f.write_str("running"),
            }
        } else if let Some(signal) = self.term_signal {
            write!(f, "terminated by signal {signal}")
        } else {
            match self.exit_code {
                Some(code) => write!(f, "exit code {code}"),
                None => f.write_str("exited with unknown status"),
            }
        }
    }
}

// ── Output ──────────────────────────────────────────────────────────

/// Captured result of one collection run: stdout bytes, stderr bytes, and
/// the terminal [`Status`].
#[derive(Debug, Clone)]
pub struct Output {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    status: Status,
}

impl Output {
    /// Bundle captured streams with a terminal status.
    #[must_use]
    pub fn of(stdout: Vec<u8>, stderr: Vec<u8>, status: Status) -> Self {
        Self {
            stdout,
            stderr,
            status,
        }
    }

    /// Captured stdout bytes.
    #[must_use]
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Captured stderr bytes.
    #[must_use]
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// The terminal status snapshot.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Captured stdout as text, lossily decoded.
    #[must_use]
    pub fn stdout_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Captured stderr as text, lossily decoded.
    #[must_use]
    pub fn stderr_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// `true` when the run exited zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// `true` when the run finished without exiting zero.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// The most relevant stream for a human: stderr when the run failed
    /// and wrote any, stdout otherwise.
    #[must_use]
    pub fn message(&self) -> Cow<'_, str> {
        if self.is_failure() && !self.stderr.is_empty() {
            self.stderr_str()
        } else {
            self.stdout_str()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use super::*;

    fn exit_with_code(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    fn zero_exit_is_success() {
        let status = Status::exited("true", Some(1), exit_with_code(0));
        assert!(status.success());
        assert!(!status.is_failure());
        assert_eq!(status.exit_code(), Some(0));
    }

    #[test]
    fn nonzero_exit_is_failure() {
        let status = Status::exited("false", Some(1), exit_with_code(42));
        assert!(!status.success());
        assert!(status.is_failure());
        assert_eq!(status.exit_code(), Some(42));
        assert!(!status.is_signaled());
    }

    #[test]
    fn signal_termination_reports_signal_number() {
        let status = Status::exited("sleep", Some(1), ExitStatus::from_raw(libc::SIGKILL));
        assert!(status.is_signaled());
        assert_eq!(status.term_signal(), Some(libc::SIGKILL));
        assert_eq!(status.exit_code(), None);
        assert!(status.is_failure());
    }

    #[test]
    fn running_snapshot_has_no_exit_information() {
        let status = Status::running("sleep 5", Some(7));
        assert!(status.is_running());
        assert_eq!(status.exit_code(), None);
        assert!(!status.is_failure());
    }

    #[test]
    fn message_prefers_stderr_on_failure() {
        let failed = Output::of(
            b"partial".to_vec(),
            b"boom".to_vec(),
            Status::exited("x", Some(1), exit_with_code(1)),
        );
        assert_eq!(failed.message(), "boom");

        let ok = Output::of(
            b"result".to_vec(),
            b"noise".to_vec(),
            Status::exited("x", Some(1), exit_with_code(0)),
        );
        assert_eq!(ok.message(), "result");
    }

    #[test]
    fn status_serializes_for_structured_logs() {
        let status = Status::exited("true", Some(9), exit_with_code(0));
        let value = serde_json::to_value(&status).expect("serializable");
        assert_eq!(value["exit_code"], 0);
        assert_eq!(value["running"], false);
    }
}
