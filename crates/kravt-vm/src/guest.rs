//! Guest parameters supplied to `define`.

use crate::error::{Result, VmError};
use crate::network::NetworkIntent;
use std::path::{Path, PathBuf};

/// Default guest-visible tag of the passthrough filesystem.
pub const DEFAULT_MOUNT_TAG: &str = "fs0";
/// Default guest memory in MiB.
pub const DEFAULT_MEMORY_MIB: u64 = 32;

/// Everything needed to describe one guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestSpec {
    /// Domain name, the key into the hypervisor's namespace.
    pub name: String,
    /// Absolute path to the kernel image.
    pub kernel_path: PathBuf,
    /// Absolute path of the host directory shared with the guest.
    pub rootfs_path: Option<PathBuf>,
    /// Tag the guest mounts the shared directory by.
    pub mount_tag: String,
    /// Memory in MiB (default: 32).
    pub memory_mib: u64,
    /// Passed verbatim after the `--` separator.
    pub extra_boot_args: Vec<String>,
    /// Bridged NIC, if requested.
    pub network: Option<NetworkIntent>,
}

impl GuestSpec {
    /// Create a new spec builder.
    pub fn builder() -> GuestSpecBuilder {
        GuestSpecBuilder::default()
    }

    /// Shared directory, if one was given and is non-empty.
    pub fn rootfs(&self) -> Option<&Path> {
        self.rootfs_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Validate the spec.
    ///
    /// # Errors
    /// Returns `VmError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(VmError::Validation("missing domain name".into()));
        }
        if self.kernel_path.as_os_str().is_empty() {
            return Err(VmError::Validation("missing kernel image path".into()));
        }
        if self.memory_mib == 0 {
            return Err(VmError::Validation("memory must be > 0 MiB".into()));
        }
        if self.rootfs().is_some() && self.mount_tag.is_empty() {
            return Err(VmError::Validation("rootfs tag must not be empty".into()));
        }
        Ok(())
    }
}

/// Builder for [`GuestSpec`].
#[derive(Debug, Clone)]
pub struct GuestSpecBuilder {
    name: String,
    kernel_path: PathBuf,
    rootfs_path: Option<PathBuf>,
    mount_tag: String,
    memory_mib: u64,
    extra_boot_args: Vec<String>,
    network: Option<NetworkIntent>,
}

impl Default for GuestSpecBuilder {
    fn default() -> Self {
        Self {
            name: String::new(),
            kernel_path: PathBuf::new(),
            rootfs_path: None,
            mount_tag: DEFAULT_MOUNT_TAG.to_string(),
            memory_mib: DEFAULT_MEMORY_MIB,
            extra_boot_args: Vec::new(),
            network: None,
        }
    }
}

impl GuestSpecBuilder {
    /// Set the domain name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the path to the kernel image.
    pub fn kernel(mut self, path: impl Into<PathBuf>) -> Self {
        self.kernel_path = path.into();
        self
    }

    /// Share a host directory with the guest.
    pub fn rootfs(mut self, path: impl Into<PathBuf>) -> Self {
        self.rootfs_path = Some(path.into());
        self
    }

    /// Set the mount tag of the shared directory.
    pub fn mount_tag(mut self, tag: impl Into<String>) -> Self {
        self.mount_tag = tag.into();
        self
    }

    /// Set memory in MiB.
    pub fn memory_mib(mut self, mib: u64) -> Self {
        self.memory_mib = mib;
        self
    }

    /// Append one kernel argument after the separator.
    pub fn boot_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_boot_args.push(arg.into());
        self
    }

    /// Append kernel arguments after the separator, keeping their order.
    pub fn boot_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_boot_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Attach the guest to a host bridge.
    pub fn with_network(mut self, intent: NetworkIntent) -> Self {
        self.network = Some(intent);
        self
    }

    /// Build the spec, resolving paths to absolute form and validating.
    ///
    /// Paths are resolved lexically against the working directory; the file
    /// system is not consulted.
    pub fn build(self) -> Result<GuestSpec> {
        let mut spec = GuestSpec {
            name: self.name,
            kernel_path: self.kernel_path,
            rootfs_path: self.rootfs_path.filter(|p| !p.as_os_str().is_empty()),
            mount_tag: self.mount_tag,
            memory_mib: self.memory_mib,
            extra_boot_args: self.extra_boot_args,
            network: self.network,
        };
        spec.validate()?;

        spec.kernel_path = absolutize(&spec.kernel_path)?;
        if let Some(rootfs) = spec.rootfs_path.take() {
            spec.rootfs_path = Some(absolutize(&rootfs)?);
        }
        Ok(spec)
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        VmError::Validation(format!("cannot resolve path {}: {e}", path.display()))
    })
}
