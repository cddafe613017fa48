//! Child-process execution shared by every tool driver.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use crate::error::{ToolError, ToolResult};

/// Settings common to all tool invocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolSettings {
    /// Per-invocation timeout. `None` leaves timing to the tool itself.
    pub command_timeout: Option<Duration>,
}

/// A command line to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub program: String,

    /// Exit code (0 = success, -1 = killed by signal).
    pub exit_code: i32,

    pub stdout: String,
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout on success, `NonZeroExit` otherwise.
    pub fn into_stdout(self) -> ToolResult<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(ToolError::NonZeroExit {
                program: self.program,
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Run `command` to completion and capture its output.
pub async fn execute(command: &ToolCommand, settings: &ToolSettings) -> ToolResult<ToolOutput> {
    let start = Instant::now();

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &command.cwd {
        cmd.current_dir(dir);
    }

    debug!(program = %command.program, args = ?command.args, "spawning");
    let child = cmd.spawn().map_err(|source| ToolError::Spawn {
        program: command.program.clone(),
        source,
    })?;

    let output = match settings.command_timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| ToolError::Timeout {
                program: command.program.clone(),
                secs: limit.as_secs(),
            })?,
        None => child.wait_with_output().await,
    }
    .map_err(|source| ToolError::Spawn {
        program: command.program.clone(),
        source,
    })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    let exit_code = output.status.code().unwrap_or(-1);
    debug!(program = %command.program, exit_code, duration_ms, "finished");

    Ok(ToolOutput {
        program: command.program.clone(),
        exit_code,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration_ms,
    })
}

/// Run `command` and return stdout, failing on a non-zero exit.
pub async fn execute_stdout(command: &ToolCommand, settings: &ToolSettings) -> ToolResult<String> {
    execute(command, settings).await?.into_stdout()
}
