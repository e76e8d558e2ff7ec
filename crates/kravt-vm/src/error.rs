//! Error types for kravt-vm.

use thiserror::Error;

/// Result type alias for kravt-vm operations.
pub type Result<T> = std::result::Result<T, VmError>;

/// Errors that can occur while describing or driving a domain.
#[derive(Debug, Error)]
pub enum VmError {
    /// Guest or network parameters are missing or malformed
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// Descriptor could not be marshaled to or from XML
    #[error("descriptor XML error: {0}")]
    Xml(String),

    /// Could not open a connection to the hypervisor
    #[error("failed to connect to {uri}: {message}")]
    Connection { uri: String, message: String },

    /// The hypervisor rejected an operation on a domain
    #[error("failed to {op} domain {domain}: {message}")]
    Hypervisor {
        op: &'static str,
        domain: String,
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VmError {
    pub(crate) fn hypervisor(
        op: &'static str,
        domain: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Hypervisor {
            op,
            domain: domain.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error was raised before any external state was touched.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
