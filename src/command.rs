//! High-level command invocation and pipeline composition.

use std::time::Duration;

use tracing::{debug, warn};

use super::{ExecError, Output, Process, ProcessBuilder, Signal, Status, StreamDescriptor};

/// Array-style command invocation with a fixed timeout and `pipe`
/// composition.
///
/// A `Command` wraps one [`ProcessBuilder`] plus an ordered list of
/// downstream stages. [`run`](Command::run) and [`output`](Command::output)
/// execute the whole pipeline as one unit and collect only the terminal
/// stage's output; [`spawn`](Command::spawn) hands back a live handle and
/// is defined only for a single, unpiped command.
///
/// Unlike [`Process::output`], the `Command` layer demands success: a
/// non-zero terminal exit code becomes [`ExecError::CommandFailed`]
/// carrying the full capture.
#[derive(Debug, Clone)]
pub struct Command {
    builder: ProcessBuilder,
    timeout: Option<Duration>,
    downstream: Vec<Command>,
}

impl Command {
    /// Command running `program` with no arguments and no timeout.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            builder: ProcessBuilder::new(program),
            timeout: None,
            downstream: Vec::new(),
        }
    }

    /// Append one argument, passed to the child verbatim.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.builder = self.builder.arg(arg);
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builder = self.builder.args(args);
        self
    }

    /// Run the (first) stage in `dir`.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.builder = self.builder.working_dir(dir);
        self
    }

    /// Set one environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.env(key, value);
        self
    }

    /// Start the child from an empty environment.
    #[must_use]
    pub fn clear_env(mut self) -> Self {
        self.builder = self.builder.clear_env();
        self
    }

    /// Wire the first stage's stdin slot.
    #[must_use]
    pub fn stdin(mut self, descriptor: StreamDescriptor) -> Self {
        self.builder = self.builder.stdin(descriptor);
        self
    }

    /// Wire the stdout slot. Honored by [`spawn`](Command::spawn);
    /// [`run`](Command::run)/[`output`](Command::output) capture, so they
    /// re-wire intermediate stages into the next stage's stdin and the
    /// terminal stage into a pipe.
    #[must_use]
    pub fn stdout(mut self, descriptor: StreamDescriptor) -> Self {
        self.builder = self.builder.stdout(descriptor);
        self
    }

    /// Wire the stderr slot. Honored by [`spawn`](Command::spawn); the
    /// terminal stage's stderr is captured during `run`/`output`.
    #[must_use]
    pub fn stderr(mut self, descriptor: StreamDescriptor) -> Self {
        self.builder = self.builder.stderr(descriptor);
        self
    }

    /// Bound the whole run, single command or pipeline, by `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Feed this command's stdout into `next`'s stdin.
    ///
    /// Stages run left-to-right; the timeout configured on the pipeline's
    /// first command bounds the whole run.
    #[must_use]
    pub fn pipe(mut self, next: Command) -> Self {
        self.downstream.push(next);
        self
    }

    /// Number of stages, including this command.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        1 + self
            .downstream
            .iter()
            .map(Command::stage_count)
            .sum::<usize>()
    }

    /// Launch a single, unpiped command and hand back the live handle.
    ///
    /// A pipeline has no single terminal handle that stays faithful to
    /// interactive use, so calling this on one fails with
    /// [`ExecError::PipelineSpawn`].
    pub fn spawn(&self) -> Result<Process, ExecError> {
        if !self.downstream.is_empty() {
            return Err(ExecError::PipelineSpawn {
                stages: self.stage_count(),
            });
        }
        self.builder.spawn()
    }

    /// Execute the command or pipeline and capture the terminal stage's
    /// output. Non-zero terminal exit ⇒ [`ExecError::CommandFailed`] with
    /// the capture as payload.
    pub async fn output(&self) -> Result<Output, ExecError> {
        let output = self.collect().await?;
        if output.success() {
            Ok(output)
        } else {
            Err(ExecError::CommandFailed { output })
        }
    }

    /// Execute and return the terminal status, demanding success like
    /// [`output`](Command::output).
    pub async fn run(&self) -> Result<Status, ExecError> {
        self.output().await.map(|output| output.status().clone())
    }

    /// Spawn every stage left-to-right, splicing stdout into the next
    /// stage's stdin before that stage spawns, then collect the terminal
    /// stage bounded by the configured timeout.
    async fn collect(&self) -> Result<Output, ExecError> {
        let stages = self.flatten();
        let last = stages.len() - 1;
        let mut running: Vec<Process> = Vec::with_capacity(stages.len());

        for (index, stage) in stages.iter().enumerate() {
            let mut builder = stage.builder.clone();
            if index > 0 {
                // The upstream stage's live stdout endpoint becomes this
                // stage's stdin, so back-pressure flows through the OS
                // pipe buffers.
                let handle = match running[index - 1].take_stdout_handle() {
                    Ok(handle) => handle,
                    Err(e) => {
                        shutdown_stages(&mut running);
                        return Err(e);
                    }
                };
                builder = builder.stdin(StreamDescriptor::handle(handle));
            }
            if index < last {
                builder = builder.stdout(StreamDescriptor::pipe());
            } else {
                builder = builder
                    .stdout(StreamDescriptor::pipe())
                    .stderr(StreamDescriptor::pipe());
            }
            match builder.spawn() {
                Ok(process) => running.push(process),
                Err(e) => {
                    shutdown_stages(&mut running);
                    return Err(e);
                }
            }
        }

        let mut terminal = match running.pop() {
            Some(process) => process,
            None => return Err(ExecError::InvalidCommand),
        };
        let result = terminal.output(self.timeout).await;
        terminal.close();
        shutdown_stages(&mut running);
        result
    }

    /// Stages in execution order: this command, then every downstream
    /// command depth-first, which linearizes both `a.pipe(b).pipe(c)` and
    /// `a.pipe(b.pipe(c))` the same way.
    fn flatten(&self) -> Vec<&Command> {
        fn collect<'a>(command: &'a Command, out: &mut Vec<&'a Command>) {
            out.push(command);
            for next in &command.downstream {
                collect(next, out);
            }
        }
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }
}

/// Close upstream stages after the pipeline finished (or failed to start).
/// Exit codes are logged for diagnostics; a stage still running once the
/// terminal stage is done gets a forced kill.
fn shutdown_stages(stages: &mut Vec<Process>) {
    for stage in stages.iter_mut() {
        match stage.status() {
            Ok(status) if status.is_running() => {
                warn!(
                    target: "exec_kit",
                    command = %stage.command_line(),
                    "pipeline stage still running at shutdown, killing"
                );
                if let Err(e) = stage.kill_with(Signal::Kill) {
                    warn!(
                        target: "exec_kit",
                        command = %stage.command_line(),
                        error = %e,
                        "failed to kill pipeline stage"
                    );
                }
            }
            Ok(status) => {
                debug!(
                    target: "exec_kit",
                    command = %stage.command_line(),
                    exit_code = status.exit_code(),
                    "pipeline stage finished"
                );
            }
            Err(_) => {}
        }
        stage.close();
    }
    stages.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_flattens_both_composition_orders() {
        let left_assoc = Command::new("a").pipe(Command::new("b")).pipe(Command::new("c"));
        let right_assoc = Command::new("a").pipe(Command::new("b").pipe(Command::new("c")));
        let names = |cmd: &Command| {
            cmd.flatten()
                .iter()
                .map(|c| c.builder.command().to_owned())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&left_assoc), ["a", "b", "c"]);
        assert_eq!(names(&right_assoc), ["a", "b", "c"]);
    }

    #[test]
    fn stage_count_includes_every_stage() {
        let pipeline = Command::new("a").pipe(Command::new("b").pipe(Command::new("c")));
        assert_eq!(pipeline.stage_count(), 3);
        assert_eq!(Command::new("a").stage_count(), 1);
    }

    #[test]
    fn spawn_rejects_pipelines() {
        let pipeline = Command::new("echo").pipe(Command::new("cat"));
        let result = pipeline.spawn();
        assert!(matches!(
            result,
            Err(ExecError::PipelineSpawn { stages: 2 })
        ));
    }
}
