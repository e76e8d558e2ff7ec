//! Error types for kravt-core.

use crate::cmd::HostCommand;
use std::fmt;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for kravt-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that abort a lifecycle command.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Error from kravt-vm
    #[error(transparent)]
    Vm(#[from] kravt_vm::VmError),

    /// Invalid environment configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CoreError {
    /// Whether this error was raised before any external state was touched.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Vm(e) => e.is_validation(),
            Self::Config(_) => true,
        }
    }
}

/// A host command that could not be run or did not succeed.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: HostCommand,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Failed {
        command: HostCommand,
        status: ExitStatus,
    },
}

impl CommandError {
    pub fn command(&self) -> &HostCommand {
        match self {
            Self::Spawn { command, .. } | Self::Failed { command, .. } => command,
        }
    }
}

/// The failed steps of one best-effort network operation.
///
/// Every step is attempted; this only records which ones did not succeed.
#[derive(Debug)]
pub struct NetworkError {
    pub bridge: String,
    pub failures: Vec<CommandError>,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of the commands for bridge {} failed",
            self.failures.len(),
            self.bridge
        )?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for NetworkError {}
