//! Thin wrapper over [`std::process::Command`] that keeps the rendered
//! command line around so errors and logs can name exactly what ran.

use std::{
    io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {status}{}", format_stderr(.stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn format_stderr(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", stderr.trim())
    }
}

/// Captured output of a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Builder for an external tool invocation.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a path argument, rendered with the platform separator.
    pub fn arg_path(self, path: impl AsRef<Path>) -> Self {
        self.arg(path.as_ref().display().to_string())
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
        self.current_dir = Some(dir.into());
        self
    }

    /// The full command line as it shows up in logs and errors.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }

    /// Runs the command with stdout and stderr attached to ours. Build
    /// scripts and replays stream their progress this way.
    pub fn run(self) -> Result<(), CommandError> {
        debug!(command = %self.command_line(), "running external command");
        let status = self.command().status().map_err(|source| CommandError::Spawn {
            command: self.command_line(),
            source,
        })?;
        if !status.success() {
            return Err(CommandError::Failed {
                command: self.command_line(),
                status,
                stderr: String::new(),
            });
        }
        Ok(())
    }

    /// Runs the command with output captured, for queries whose stdout the
    /// caller needs to inspect.
    pub fn capture(self) -> Result<CommandOutput, CommandError> {
        debug!(command = %self.command_line(), "running external command");
        let mut command = self.command();
        command.stdin(Stdio::null());
        let output = command.output().map_err(|source| CommandError::Spawn {
            command: self.command_line(),
            source,
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            return Err(CommandError::Failed {
                command: self.command_line(),
                status: output.status,
                stderr,
            });
        }
        Ok(CommandOutput {
            status: output.status,
            stdout,
            stderr,
        })
    }
}
