//! # kravt-vm
//!
//! Domain description and hypervisor access for kravt.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kravt_vm::{build_descriptor, GuestSpec, NetworkIntent};
//!
//! # fn example() -> kravt_vm::Result<()> {
//! let spec = GuestSpec::builder()
//!     .name("vm1")
//!     .kernel("/boot/vmlinuz")
//!     .memory_mib(64)
//!     .with_network(NetworkIntent::default())
//!     .boot_arg("console=ttyS0")
//!     .build()?;
//!
//! let xml = build_descriptor(&spec)?.to_xml()?;
//! # let _ = xml;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Descriptors**: Typed libvirt domain XML, built from a [`GuestSpec`]
//!   and parsed back from live XML
//! - **Network intent**: Validated bridge addressing and guest boot parameters
//! - **Backends**: `virsh` by default, native libvirt with the `libvirt` feature

mod builder;
mod descriptor;
mod error;
mod guest;
mod hypervisor;
#[cfg(feature = "libvirt")]
mod libvirt;
mod network;
mod state;
mod virsh;

pub use builder::{
    assemble_cmdline, build_descriptor, LifecycleAction, BOOT_ARGS_SEPARATOR, LIFECYCLE_POLICY,
    VCPU_COUNT, VNC_LISTEN_ADDR,
};
pub use descriptor::{
    Clock, Cpu, Devices, DirRef, DomainDescriptor, Filesystem, FilesystemDriver, Graphics,
    Interface, InterfaceSource, MemBalloon, Memory, Model, Os, OsType, Vcpu,
};
pub use error::{Result, VmError};
pub use guest::{GuestSpec, GuestSpecBuilder, DEFAULT_MEMORY_MIB, DEFAULT_MOUNT_TAG};
pub use hypervisor::{DomainHandle, Hypervisor, DEFAULT_CONNECT_URI};
#[cfg(feature = "libvirt")]
pub use libvirt::{LibvirtDomain, LibvirtHypervisor};
pub use network::{
    derive_prefix_len, NetworkIntent, DEFAULT_BRIDGE_NAME, DEFAULT_GATEWAY_ADDR,
    DEFAULT_GUEST_ADDR, DEFAULT_NETMASK, MAX_IFNAME_LEN,
};
pub use state::DomainState;
pub use virsh::{VirshDomain, VirshHypervisor, DEFAULT_VIRSH_PROGRAM};
