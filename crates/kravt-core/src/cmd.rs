//! Host command execution.

use crate::error::CommandError;
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;

/// A program invocation on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HostCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
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
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs host commands to completion.
#[async_trait(?Send)]
pub trait CommandRunner {
    /// Run `command` and wait for it to exit.
    ///
    /// # Errors
    /// Returns `CommandError` if the program cannot be spawned or exits
    /// unsuccessfully.
    async fn run(&self, command: &HostCommand) -> Result<(), CommandError>;
}

/// Runs commands as child processes, streaming all their output to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait(?Send)]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &HostCommand) -> Result<(), CommandError> {
        tracing::info!(command = %command, "Running host command");

        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(std::io::stderr())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(CommandError::Failed {
                command: command.clone(),
                status,
            });
        }
        Ok(())
    }
}
