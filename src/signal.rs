// SPDX-License-Identifier: MIT OR Apache-2.0
//! POSIX signal selection and delivery.

/// Signals this subsystem can deliver to a child process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGHUP`: hangup.
    Hangup,
    /// `SIGINT`: keyboard interrupt.
    Interrupt,
    /// `SIGQUIT`: quit with core dump.
    Quit,
    /// `SIGKILL`: forced, uncatchable termination.
    Kill,
    /// `SIGUSR1`: user-defined signal 1.
    User1,
    /// `SIGUSR2`: user-defined signal 2.
    User2,
    /// `SIGTERM`: polite termination request. The default.
    #[default]
    Terminate,
}

#[cfg(unix)]
impl Signal {
    /// The platform signal number.
    #[must_use]
    pub fn raw(self) -> libc::c_int {
        match self {
            Self::Hangup => libc::SIGHUP,
            Self::Interrupt => libc::SIGINT,
            Self::Quit => libc::SIGQUIT,
            Self::Kill => libc::SIGKILL,
            Self::User1 => libc::SIGUSR1,
            Self::User2 => libc::SIGUSR2,
            Self::Terminate => libc::SIGTERM,
        }
    }
}

/// Deliver `signal` to the process with the given pid.
///
/// Reports `ESRCH` (no such process) through the returned error so the
/// caller can distinguish "already exited" from a real delivery failure.
#[cfg(unix)]
#[allow(unsafe_code)]
pub(crate) fn deliver(pid: u32, signal: Signal) -> std::io::Result<()> {
    // SAFETY: kill(2) takes two integers and touches no caller memory.
    let rc = unsafe { libc::kill(pid as libc::pid_t, signal.raw()) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}
