//! Translation of a [`GuestSpec`] into a complete [`DomainDescriptor`].

use crate::descriptor::{
    Clock, Cpu, DirRef, DomainDescriptor, Devices, Filesystem, FilesystemDriver, Graphics,
    Interface, InterfaceSource, MemBalloon, Memory, Model, Os, OsType, Vcpu,
};
use crate::error::Result;
use crate::guest::GuestSpec;

/// Token separating network parameters from the caller's kernel arguments.
pub const BOOT_ARGS_SEPARATOR: &str = "--";

/// vCPU count of every guest.
pub const VCPU_COUNT: u32 = 1;

/// Address the VNC console listens on.
pub const VNC_LISTEN_ADDR: &str = "127.0.0.1";

/// Action libvirt takes when the guest exits in a given way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Destroy,
    Restart,
    Preserve,
}

impl LifecycleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Destroy => "destroy",
            Self::Restart => "restart",
            Self::Preserve => "preserve",
        }
    }
}

/// Fixed lifecycle policy: (poweroff, reboot, crash).
pub const LIFECYCLE_POLICY: (LifecycleAction, LifecycleAction, LifecycleAction) = (
    LifecycleAction::Destroy,
    LifecycleAction::Restart,
    LifecycleAction::Preserve,
);

/// Assemble the guest kernel command line.
///
/// Network tokens (if any) come first, then the separator, then the caller's
/// arguments in the order given.
pub fn assemble_cmdline(spec: &GuestSpec) -> String {
    let mut args: Vec<String> = Vec::with_capacity(4 + spec.extra_boot_args.len());
    if let Some(net) = &spec.network {
        args.extend(net.boot_args());
    }
    args.push(BOOT_ARGS_SEPARATOR.to_string());
    args.extend(spec.extra_boot_args.iter().cloned());
    args.join(" ")
}

/// Build the descriptor of a guest.
///
/// Pure: performs no I/O. The guest spec is validated first.
///
/// # Errors
/// Returns `VmError::Validation` if the guest spec is incomplete.
pub fn build_descriptor(spec: &GuestSpec) -> Result<DomainDescriptor> {
    spec.validate()?;

    let (on_poweroff, on_reboot, on_crash) = LIFECYCLE_POLICY;

    let mut devices = Devices {
        graphics: vec![Graphics {
            graphics_type: "vnc".into(),
            port: Some(-1),
            autoport: Some("yes".into()),
            listen: Some(VNC_LISTEN_ADDR.into()),
        }],
        memballoon: Some(MemBalloon {
            model: "none".into(),
        }),
        ..Default::default()
    };

    if let Some(rootfs) = spec.rootfs() {
        devices.filesystems.push(Filesystem {
            fs_type: Some("mount".into()),
            access_mode: Some("passthrough".into()),
            driver: Some(FilesystemDriver {
                driver_type: Some("path".into()),
            }),
            source: Some(DirRef {
                dir: Some(rootfs.to_string_lossy().into_owned()),
            }),
            target: Some(DirRef {
                dir: Some(spec.mount_tag.clone()),
            }),
        });
    }

    if let Some(net) = &spec.network {
        devices.interfaces.push(Interface {
            iface_type: Some("bridge".into()),
            source: Some(InterfaceSource {
                bridge: Some(net.bridge_name().to_string()),
                network: None,
            }),
            model: Some(Model {
                model_type: Some("virtio".into()),
            }),
        });
    }

    let descriptor = DomainDescriptor {
        domain_type: "kvm".into(),
        name: spec.name.clone(),
        memory: Some(Memory {
            unit: Some("MiB".into()),
            value: spec.memory_mib,
        }),
        vcpu: Some(Vcpu {
            placement: Some("static".into()),
            count: VCPU_COUNT,
        }),
        os: Some(Os {
            os_type: Some(OsType {
                arch: None,
                machine: None,
                value: "hvm".into(),
            }),
            kernel: Some(spec.kernel_path.to_string_lossy().into_owned()),
            cmdline: Some(assemble_cmdline(spec)),
        }),
        cpu: Some(Cpu {
            mode: Some("host-model".into()),
        }),
        clock: Some(Clock {
            offset: Some("utc".into()),
            adjustment: Some("reset".into()),
        }),
        on_poweroff: Some(on_poweroff.as_str().into()),
        on_reboot: Some(on_reboot.as_str().into()),
        on_crash: Some(on_crash.as_str().into()),
        devices,
    };

    tracing::debug!(
        domain = %descriptor.name,
        memory_mib = spec.memory_mib,
        filesystems = descriptor.devices.filesystems.len(),
        interfaces = descriptor.devices.interfaces.len(),
        "Built domain descriptor"
    );

    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkIntent;
    use std::path::PathBuf;

    fn base_spec() -> GuestSpec {
        GuestSpec::builder()
            .name("vm1")
            .kernel("/boot/vmlinuz")
            .build()
            .unwrap()
    }

    #[test]
    fn test_define_example() {
        let spec = GuestSpec::builder()
            .name("vm1")
            .kernel("/boot/vmlinuz")
            .memory_mib(64)
            .with_network(NetworkIntent::default())
            .boot_arg("console=ttyS0")
            .build()
            .unwrap();

        let domain = build_descriptor(&spec).unwrap();

        assert_eq!(
            domain.memory,
            Some(Memory {
                unit: Some("MiB".into()),
                value: 64
            })
        );
        assert_eq!(domain.devices.interfaces.len(), 1);
        let iface = &domain.devices.interfaces[0];
        assert_eq!(iface.iface_type.as_deref(), Some("bridge"));
        assert_eq!(
            iface.source.as_ref().and_then(|s| s.bridge.as_deref()),
            Some("virbr0")
        );
        assert_eq!(
            iface.model.as_ref().and_then(|m| m.model_type.as_deref()),
            Some("virtio")
        );
        assert_eq!(
            domain.cmdline(),
            Some(
                "netdev.ipv4_addr=172.44.0.2 netdev.ipv4_gw_addr=172.44.0.1 \
                 netdev.ipv4_subnet_mask=255.255.255.0 -- console=ttyS0"
            )
        );
    }

    #[test]
    fn test_no_network() {
        let mut spec = base_spec();
        spec.extra_boot_args = vec!["console=ttyS0".into(), "quiet".into()];

        let domain = build_descriptor(&spec).unwrap();

        assert!(domain.devices.interfaces.is_empty());
        assert_eq!(domain.cmdline(), Some("-- console=ttyS0 quiet"));
        assert!(!domain.cmdline().unwrap().contains("netdev."));
    }

    #[test]
    fn test_cmdline_separator_only() {
        assert_eq!(assemble_cmdline(&base_spec()), "--");
    }

    #[test]
    fn test_cmdline_network_tokens_lead() {
        let mut spec = base_spec();
        spec.network =
            Some(NetworkIntent::parse("br9", "10.9.0.2", "10.9.0.1", "255.255.255.128").unwrap());
        spec.extra_boot_args = vec!["a=1".into(), "b".into()];

        let cmdline = assemble_cmdline(&spec);
        let tokens: Vec<&str> = cmdline.split(' ').collect();

        assert_eq!(
            tokens,
            vec![
                "netdev.ipv4_addr=10.9.0.2",
                "netdev.ipv4_gw_addr=10.9.0.1",
                "netdev.ipv4_subnet_mask=255.255.255.128",
                "--",
                "a=1",
                "b",
            ]
        );
    }

    #[test]
    fn test_rootfs_device() {
        let without = build_descriptor(&base_spec()).unwrap();
        assert!(without.devices.filesystems.is_empty());

        let mut spec = base_spec();
        spec.rootfs_path = Some(PathBuf::from("/srv/vm1"));
        spec.mount_tag = "root".into();

        let with = build_descriptor(&spec).unwrap();
        assert_eq!(with.devices.filesystems.len(), 1);
        let fs = &with.devices.filesystems[0];
        assert_eq!(
            fs.driver.as_ref().and_then(|d| d.driver_type.as_deref()),
            Some("path")
        );
        assert_eq!(
            fs.source.as_ref().and_then(|s| s.dir.as_deref()),
            Some("/srv/vm1")
        );
        assert_eq!(
            fs.target.as_ref().and_then(|t| t.dir.as_deref()),
            Some("root")
        );
    }

    #[test]
    fn test_empty_rootfs_path_has_no_device() {
        let mut spec = base_spec();
        spec.rootfs_path = Some(PathBuf::new());
        let domain = build_descriptor(&spec).unwrap();
        assert!(domain.devices.filesystems.is_empty());
    }

    #[test]
    fn test_fixed_resources_and_policy() {
        let domain = build_descriptor(&base_spec()).unwrap();

        assert_eq!(domain.domain_type, "kvm");
        let vcpu = domain.vcpu.as_ref().unwrap();
        assert_eq!(vcpu.count, 1);
        assert_eq!(vcpu.placement.as_deref(), Some("static"));
        assert_eq!(domain.on_poweroff.as_deref(), Some("destroy"));
        assert_eq!(domain.on_reboot.as_deref(), Some("restart"));
        assert_eq!(domain.on_crash.as_deref(), Some("preserve"));
        assert_eq!(
            domain.os.as_ref().and_then(|os| os.kernel.as_deref()),
            Some("/boot/vmlinuz")
        );
    }

    #[test]
    fn test_vnc_is_loopback_only() {
        let domain = build_descriptor(&base_spec()).unwrap();

        assert_eq!(domain.devices.graphics.len(), 1);
        let vnc = &domain.devices.graphics[0];
        assert_eq!(vnc.graphics_type, "vnc");
        assert_eq!(vnc.listen.as_deref(), Some("127.0.0.1"));
        assert_eq!(vnc.port, Some(-1));
    }

    #[test]
    fn test_validation_errors() {
        let mut spec = base_spec();
        spec.name.clear();
        assert!(build_descriptor(&spec).unwrap_err().is_validation());

        let mut spec = base_spec();
        spec.kernel_path = PathBuf::new();
        assert!(build_descriptor(&spec).unwrap_err().is_validation());
    }

    #[test]
    fn test_xml_marshaling() {
        let mut spec = base_spec();
        spec.rootfs_path = Some(PathBuf::from("/srv/vm1"));
        spec.network = Some(NetworkIntent::default());
        spec.extra_boot_args = vec!["console=ttyS0".into()];

        let domain = build_descriptor(&spec).unwrap();
        let xml = domain.to_xml().unwrap();

        assert!(xml.starts_with("<domain type=\"kvm\">"));
        assert!(xml.contains("<name>vm1</name>"));
        assert!(xml.contains("<memory unit=\"MiB\">32</memory>"));
        assert!(xml.contains("<vcpu placement=\"static\">1</vcpu>"));
        assert!(xml.contains("<kernel>/boot/vmlinuz</kernel>"));
        assert!(xml.contains("<source bridge=\"virbr0\"/>"));
        assert!(xml.contains("<target dir=\"fs0\"/>"));
        assert!(xml.contains("listen=\"127.0.0.1\""));
        assert!(xml.contains("<memballoon model=\"none\"/>"));

        // The hypervisor hands back what was registered; bridge discovery
        // must see the interface again.
        let parsed = DomainDescriptor::from_xml(&xml).unwrap();
        assert_eq!(parsed, domain);
        assert_eq!(parsed.bridge_names(), vec!["virbr0"]);
    }
}
