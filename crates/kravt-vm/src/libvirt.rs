//! Hypervisor backend using the libvirt C API through the `virt` crate.
//!
//! Built only with the `libvirt` feature, which needs the libvirt client
//! library at link time.

use crate::descriptor::DomainDescriptor;
use crate::error::{Result, VmError};
use crate::hypervisor::{DomainHandle, Hypervisor};
use crate::state::DomainState;
use async_trait::async_trait;
use virt::connect::Connect;
use virt::domain::Domain;

/// A libvirt connection, closed on drop.
pub struct LibvirtHypervisor {
    uri: String,
    conn: Connect,
}

impl LibvirtHypervisor {
    /// Open a connection.
    ///
    /// # Errors
    /// Returns `VmError::Connection` if libvirt refuses the URI.
    pub fn open(uri: &str) -> Result<Self> {
        tracing::debug!(uri = %uri, "Connecting to libvirt");
        let conn = Connect::open(Some(uri)).map_err(|e| VmError::Connection {
            uri: uri.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            uri: uri.to_string(),
            conn,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for LibvirtHypervisor {
    fn drop(&mut self) {
        if let Err(e) = self.conn.close() {
            tracing::warn!(uri = %self.uri, error = %e, "Failed to close libvirt connection");
        }
    }
}

#[async_trait(?Send)]
impl Hypervisor for LibvirtHypervisor {
    type Domain = LibvirtDomain;

    async fn define_xml(&self, xml: &str) -> Result<LibvirtDomain> {
        let name = DomainDescriptor::from_xml(xml)?.name;
        let domain = Domain::define_xml(&self.conn, xml)
            .map_err(|e| VmError::hypervisor("define", &name, e))?;
        Ok(LibvirtDomain { name, domain })
    }

    async fn lookup_by_name(&self, name: &str) -> Result<LibvirtDomain> {
        let domain = Domain::lookup_by_name(&self.conn, name)
            .map_err(|e| VmError::hypervisor("look up", name, e))?;
        Ok(LibvirtDomain {
            name: name.to_string(),
            domain,
        })
    }
}

pub struct LibvirtDomain {
    name: String,
    domain: Domain,
}

#[async_trait(?Send)]
impl DomainHandle for LibvirtDomain {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<()> {
        self.domain
            .create()
            .map_err(|e| VmError::hypervisor("start", &self.name, e))?;
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        self.domain
            .destroy()
            .map_err(|e| VmError::hypervisor("destroy", &self.name, e))
    }

    async fn undefine(&self) -> Result<()> {
        self.domain
            .undefine()
            .map_err(|e| VmError::hypervisor("undefine", &self.name, e))
    }

    async fn state(&self) -> Result<DomainState> {
        let (state, _reason) = self
            .domain
            .get_state()
            .map_err(|e| VmError::hypervisor("query", &self.name, e))?;
        Ok(DomainState::from_raw(state))
    }

    async fn xml_desc(&self) -> Result<String> {
        self.domain
            .get_xml_desc(0)
            .map_err(|e| VmError::hypervisor("describe", &self.name, e))
    }
}
