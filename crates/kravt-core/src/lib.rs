//! # kravt-core
//!
//! Host-side orchestration for kravt: the domain lifecycle and the bridge
//! network that follows it.
//!
//! ## Features
//!
//! - **Lifecycle**: define, start, info, destroy and undefine by domain name
//! - **Bridge networking**: Best-effort `ip` commands that never abort a
//!   lifecycle command
//! - **Configuration**: Environment variables with defaults

pub mod cmd;
mod config;
mod error;
mod lifecycle;
pub mod net;

pub use cmd::{CommandRunner, HostCommand, SystemRunner};
pub use config::KravtConfig;
pub use error::{CommandError, CoreError, NetworkError, Result};
pub use lifecycle::LifecycleController;
pub use net::{BridgeProvisioner, NetworkOps};

// Re-export kravt-vm types commonly used alongside the controller.
pub use kravt_vm::{DomainHandle, DomainState, GuestSpec, Hypervisor, NetworkIntent, VmError};
