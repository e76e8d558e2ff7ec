//! The five lifecycle operations over a domain addressed by name.

use crate::error::Result;
use crate::net::NetworkOps;
use kravt_vm::{build_descriptor, DomainDescriptor, DomainHandle, DomainState, GuestSpec, Hypervisor};

/// Drives one command against a hypervisor connection and the host network.
///
/// No state is kept between commands: every operation finds the domain again
/// by name, and `undefine` learns which bridges to remove from the live
/// descriptor.
pub struct LifecycleController<H, N> {
    hypervisor: H,
    network: N,
}

impl<H: Hypervisor, N: NetworkOps> LifecycleController<H, N> {
    pub fn new(hypervisor: H, network: N) -> Self {
        Self {
            hypervisor,
            network,
        }
    }

    pub fn hypervisor(&self) -> &H {
        &self.hypervisor
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Register a new domain, provisioning its bridge first.
    ///
    /// The descriptor is built and marshaled before anything on the host is
    /// touched. A bridge provisioned before a failed registration is left in
    /// place; `undefine` is the way to reconcile.
    ///
    /// # Errors
    /// Returns a validation error for an incomplete guest spec, or the hypervisor's
    /// error if registration or the start fails.
    pub async fn define(&self, spec: &GuestSpec, start: bool) -> Result<H::Domain> {
        let xml = build_descriptor(spec)?.to_xml()?;
        tracing::debug!(domain = %spec.name, xml = %xml, "Generated domain XML");

        if let Some(intent) = &spec.network {
            if let Err(e) = self.network.provision(intent).await {
                tracing::warn!(domain = %spec.name, error = %e, "Bridge provisioning incomplete");
            }
        }

        let domain = self.hypervisor.define_xml(&xml).await?;
        tracing::info!(domain = %domain.name(), "Domain defined");

        if start {
            domain.start().await?;
            tracing::info!(domain = %domain.name(), "Domain started");
        }
        Ok(domain)
    }

    pub async fn start(&self, name: &str) -> Result<()> {
        let domain = self.hypervisor.lookup_by_name(name).await?;
        domain.start().await?;
        tracing::info!(domain = %name, "Domain started");
        Ok(())
    }

    pub async fn info(&self, name: &str) -> Result<DomainState> {
        let domain = self.hypervisor.lookup_by_name(name).await?;
        let state = domain.state().await?;
        tracing::debug!(domain = %name, state = state.as_str(), "Domain state");
        Ok(state)
    }

    /// Forcibly stop a running domain.
    pub async fn destroy(&self, name: &str) -> Result<()> {
        let domain = self.hypervisor.lookup_by_name(name).await?;
        domain.destroy().await?;
        tracing::info!(domain = %name, "Domain destroyed");
        Ok(())
    }

    /// Remove a domain's registration, then tear down every bridge its live
    /// descriptor attaches to.
    ///
    /// An unreadable descriptor means no bridges are torn down. Returns the
    /// names of the bridges teardown was attempted for.
    ///
    /// # Errors
    /// Returns the hypervisor's error if the lookup, the optional destroy or
    /// the undefine fails. Teardown failures are only logged.
    pub async fn undefine(&self, name: &str, destroy_first: bool) -> Result<Vec<String>> {
        let domain = self.hypervisor.lookup_by_name(name).await?;
        let bridges = self.discover_bridges(&domain).await;

        if destroy_first {
            domain.destroy().await?;
            tracing::info!(domain = %name, "Domain destroyed");
        }
        domain.undefine().await?;
        tracing::info!(domain = %name, "Domain undefined");

        for bridge in &bridges {
            if let Err(e) = self.network.teardown(bridge).await {
                tracing::warn!(domain = %name, error = %e, "Bridge teardown incomplete");
            }
        }
        Ok(bridges)
    }

    async fn discover_bridges(&self, domain: &H::Domain) -> Vec<String> {
        let xml = match domain.xml_desc().await {
            Ok(xml) => xml,
            Err(e) => {
                tracing::warn!(domain = %domain.name(), error = %e, "Could not read live descriptor");
                return Vec::new();
            }
        };
        match DomainDescriptor::from_xml(&xml) {
            Ok(descriptor) => descriptor.bridge_names(),
            Err(e) => {
                tracing::warn!(domain = %domain.name(), error = %e, "Could not parse live descriptor");
                Vec::new()
            }
        }
    }
}
