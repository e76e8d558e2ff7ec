//! Hypervisor collaborator traits.
//!
//! The tool keeps no state between invocations: a connection is opened for
//! one command and domains are found again by name every time.

use crate::error::Result;
use crate::state::DomainState;
use async_trait::async_trait;

/// Default connection URI.
pub const DEFAULT_CONNECT_URI: &str = "qemu:///system";

/// A connection to a hypervisor, scoped to a single command.
///
/// This abstraction lets the lifecycle logic run against libvirt directly,
/// against `virsh`, or against an in-memory mock in tests.
#[async_trait(?Send)]
pub trait Hypervisor {
    type Domain: DomainHandle;

    /// Register (persist) a domain from its XML descriptor.
    ///
    /// # Errors
    /// Returns `VmError::Hypervisor` if the hypervisor rejects the descriptor.
    async fn define_xml(&self, xml: &str) -> Result<Self::Domain>;

    /// Look up a defined domain by name.
    ///
    /// # Errors
    /// Returns `VmError::Hypervisor` if no such domain exists.
    async fn lookup_by_name(&self, name: &str) -> Result<Self::Domain>;
}

/// A defined domain.
#[async_trait(?Send)]
pub trait DomainHandle {
    fn name(&self) -> &str;

    /// Boot the domain.
    async fn start(&self) -> Result<()>;

    /// Forcibly stop the domain.
    async fn destroy(&self) -> Result<()>;

    /// Remove the domain's registration.
    async fn undefine(&self) -> Result<()>;

    async fn state(&self) -> Result<DomainState>;

    /// The live XML descriptor.
    async fn xml_desc(&self) -> Result<String>;
}
