//! Process execution
//!
//! [`ProcessExecutor`] starts one external process per invocation, streams
//! its output through a [`LineAnnotator`] into the build log, blocks until
//! the process exits and maps the result into an [`ExecutionOutcome`]. The
//! exit code alone decides success; output content is never inspected.

use super::annotator::LineAnnotator;
use super::command::CommandLine;
use crate::builder::errors::{GLOBAL_CONFIG_NEEDED, PROJECT_CONFIG_NEEDED};
use crate::builder::{BuildError, ExecutionOutcome};
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Failures this soon after start may be a configuration problem
const QUICK_FAILURE: Duration = Duration::from_secs(1);

/// Writes one line to the build log, warning when the log rejects it
pub(crate) fn write_log_line(log: &mut dyn Write, line: impl fmt::Display) {
    if let Err(err) = writeln!(log, "{line}") {
        tracing::warn!(error = %err, "Cannot write to build log");
    }
}

/// Starts processes on behalf of the executor
#[allow(clippy::missing_errors_doc)]
pub trait Launcher: Send + Sync {
    /// Runs `cmd`, copies its output into `out`, returns the exit code
    fn launch(&self, cmd: &CommandLine, out: &mut dyn Write) -> io::Result<i32>;
}

/// Launcher that runs processes on the local machine
///
/// stdout and stderr share one pipe, so they interleave the way the
/// process wrote them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLauncher;

impl Launcher for LocalLauncher {
    fn launch(&self, cmd: &CommandLine, out: &mut dyn Write) -> io::Result<i32> {
        let args = cmd.args().to_vec();
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;

        let (mut reader, writer) = os_pipe::pipe()?;
        let writer_err = writer.try_clone()?;

        let mut command = Command::new(program);
        command
            .args(rest)
            .current_dir(cmd.working_dir())
            .env_clear()
            .envs(cmd.environment())
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(writer_err);

        let mut child = command.spawn()?;
        // The command still holds write ends; drop it so the reader sees EOF.
        drop(command);

        if let Err(err) = io::copy(&mut reader, out) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }

        let status = child.wait()?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Runs composed command lines and reports outcomes
pub struct ProcessExecutor<'a> {
    launcher: &'a dyn Launcher,
    installations_configured: bool,
}

impl<'a> ProcessExecutor<'a> {
    /// Creates an executor using `launcher`
    #[must_use]
    pub fn new(launcher: &'a dyn Launcher) -> Self {
        Self {
            launcher,
            installations_configured: true,
        }
    }

    /// Records whether any installation exists globally
    ///
    /// Only used to word the hint on a quick launch failure.
    #[must_use]
    pub fn installations_configured(mut self, configured: bool) -> Self {
        self.installations_configured = configured;
        self
    }

    /// Runs `cmd`, writing annotated output into `log`
    pub fn execute(&self, cmd: &CommandLine, log: &mut dyn Write) -> ExecutionOutcome {
        write_log_line(log, cmd);
        tracing::info!(tool = %cmd.tool(), command = %cmd, "Launching process");

        let start = Instant::now();
        let mut annotator = LineAnnotator::new(&mut *log, cmd.tool());
        let launched = self.launcher.launch(cmd, &mut annotator);
        let flushed = annotator.force_eol().and_then(|()| annotator.flush());
        drop(annotator);

        let result = launched.and_then(|code| flushed.map(|()| code));
        match result {
            Ok(0) => {
                tracing::info!(tool = %cmd.tool(), "Process succeeded");
                ExecutionOutcome::Success
            }
            Ok(code) => {
                tracing::warn!(tool = %cmd.tool(), code, "Process failed");
                BuildError::NonZeroExit { code }.into()
            }
            Err(err) => {
                let error = if cmd.installation().is_none() && start.elapsed() < QUICK_FAILURE {
                    let hint = if self.installations_configured {
                        PROJECT_CONFIG_NEEDED
                    } else {
                        GLOBAL_CONFIG_NEEDED
                    };
                    BuildError::ProcessIo {
                        reason: err.to_string(),
                        hint: hint.to_string(),
                    }
                } else {
                    BuildError::process_io(err.to_string())
                };
                tracing::error!(tool = %cmd.tool(), error = %error, "Process execution failed");
                write_log_line(log, format_args!("FATAL: {error}"));
                error.into()
            }
        }
    }
}
