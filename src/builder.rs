// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immutable spawn configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::process::Command as OsCommand;
use tracing::debug;

use super::{ExecError, Process, ProcessStreams, StreamDescriptor};

/// Pending process configuration: command, argv, working directory,
/// environment policy, and stream wiring.
///
/// Every mutator returns a new builder, so configurations can be shared and
/// re-spawned freely. The terminal operation is [`spawn`](ProcessBuilder::spawn).
///
/// Arguments are handed to the OS as an argv array; there is no shell
/// re-parsing, so spaces, quotes, and shell metacharacters reach the child
/// verbatim.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    command: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    inherit_env: bool,
    streams: ProcessStreams,
}

impl ProcessBuilder {
    /// Configuration for running `command` with no arguments, inheriting
    /// the parent's environment and standard streams.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            inherit_env: true,
            streams: ProcessStreams::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the child in `dir`. Validated at spawn.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set one environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set several environment variables for the child.
    #[must_use]
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            self.env.insert(key.into(), value.into());
        }
        self
    }

    /// Whether the child inherits the parent's environment (default true).
    /// When inherited, explicit [`env`](ProcessBuilder::env) entries overlay
    /// it; when not, the child's environment is exactly the explicit
    /// entries.
    #[must_use]
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    /// Drop the inherited environment and any explicit entries set so far.
    /// With no further `env` calls the child starts with an empty
    /// environment.
    #[must_use]
    pub fn clear_env(mut self) -> Self {
        self.inherit_env = false;
        self.env.clear();
        self
    }

    /// Wire the child's stdin slot.
    #[must_use]
    pub fn stdin(mut self, descriptor: StreamDescriptor) -> Self {
        self.streams = self.streams.with_stdin(descriptor);
        self
    }

    /// Wire the child's stdout slot.
    #[must_use]
    pub fn stdout(mut self, descriptor: StreamDescriptor) -> Self {
        self.streams = self.streams.with_stdout(descriptor);
        self
    }

    /// Wire the child's stderr slot.
    #[must_use]
    pub fn stderr(mut self, descriptor: StreamDescriptor) -> Self {
        self.streams = self.streams.with_stderr(descriptor);
        self
    }

    /// Replace the whole stream wiring table.
    #[must_use]
    pub fn streams(mut self, streams: ProcessStreams) -> Self {
        self.streams = streams;
        self
    }

    /// The configured command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The configured arguments.
    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// The configured stream wiring table.
    #[must_use]
    pub fn get_streams(&self) -> &ProcessStreams {
        &self.streams
    }

    /// Command and arguments joined for display and status snapshots.
    #[must_use]
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }

    /// Validate the configuration and launch exactly one OS process.
    ///
    /// Failure order, mutually exclusive: empty command ⇒
    /// [`ExecError::InvalidCommand`]; missing or non-directory working dir
    /// ⇒ [`ExecError::InvalidWorkingDirectory`]; anything the OS primitive
    /// rejects ⇒ [`ExecError::Spawn`]. No partially-initialized handle is
    /// ever returned.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(&self) -> Result<Process, ExecError> {
        if self.command.is_empty() {
            return Err(ExecError::InvalidCommand);
        }
        if let Some(dir) = &self.working_dir {
            if !dir.is_dir() {
                return Err(ExecError::InvalidWorkingDirectory(dir.clone()));
            }
        }

        let mut os = OsCommand::new(&self.command);
        os.args(&self.args);
        if let Some(dir) = &self.working_dir {
            os.current_dir(dir);
        }
        if !self.inherit_env {
            os.env_clear();
        }
        for (key, value) in &self.env {
            os.env(key, value);
        }
        let (stdin, stdout, stderr) = self.streams.render().map_err(ExecError::Spawn)?;
        os.stdin(stdin);
        os.stdout(stdout);
        os.stderr(stderr);

        let child = os.spawn().map_err(ExecError::Spawn)?;
        debug!(
            target: "exec_kit",
            command = %self.command,
            pid = child.id(),
            "spawned process"
        );
        Ok(Process::from_spawn(child, self.command_line()))
    }
}
