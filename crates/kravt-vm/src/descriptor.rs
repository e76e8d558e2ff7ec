//! libvirt domain descriptor object graph.
//!
//! Only the parts of the libvirt schema this tool writes or reads back are
//! modelled. Parsing is lenient: live descriptors returned by the hypervisor
//! carry many more elements, which are ignored.

use crate::error::{Result, VmError};
use serde::{Deserialize, Serialize};

/// A complete domain descriptor, serialized as `<domain>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "domain")]
pub struct DomainDescriptor {
    #[serde(rename = "@type")]
    pub domain_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Memory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcpu: Option<Vcpu>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Os>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Cpu>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<Clock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_poweroff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_reboot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_crash: Option<String>,
    #[serde(default)]
    pub devices: Devices,
}

/// `<memory unit="MiB">32</memory>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    #[serde(rename = "@unit", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "$text")]
    pub value: u64,
}

/// `<vcpu placement="static">1</vcpu>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vcpu {
    #[serde(rename = "@placement", default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
    #[serde(rename = "$text")]
    pub count: u32,
}

/// Boot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Os {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<OsType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmdline: Option<String>,
}

/// `<type>hvm</type>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsType {
    #[serde(rename = "@arch", default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(rename = "@machine", default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    #[serde(rename = "$text")]
    pub value: String,
}

/// `<cpu mode="host-model"/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    #[serde(rename = "@mode", default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// `<clock offset="utc" adjustment="reset"/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    #[serde(rename = "@offset", default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(rename = "@adjustment", default, skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<String>,
}

/// Device list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Devices {
    #[serde(rename = "filesystem", default, skip_serializing_if = "Vec::is_empty")]
    pub filesystems: Vec<Filesystem>,
    #[serde(rename = "interface", default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,
    #[serde(rename = "graphics", default, skip_serializing_if = "Vec::is_empty")]
    pub graphics: Vec<Graphics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memballoon: Option<MemBalloon>,
}

/// Host directory passed through to the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,
    #[serde(rename = "@accessmode", default, skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<FilesystemDriver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DirRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DirRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemDriver {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub driver_type: Option<String>,
}

/// `<source dir="..."/>` and `<target dir="..."/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirRef {
    #[serde(rename = "@dir", default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub iface_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<InterfaceSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSource {
    #[serde(rename = "@bridge", default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
    #[serde(rename = "@network", default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// `<model type="virtio"/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
}

/// Graphical console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graphics {
    #[serde(rename = "@type")]
    pub graphics_type: String,
    #[serde(rename = "@port", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(rename = "@autoport", default, skip_serializing_if = "Option::is_none")]
    pub autoport: Option<String>,
    #[serde(rename = "@listen", default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemBalloon {
    #[serde(rename = "@model")]
    pub model: String,
}

impl DomainDescriptor {
    /// Marshal to libvirt domain XML.
    pub fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string(self).map_err(|e| VmError::Xml(e.to_string()))
    }

    /// Parse a domain XML document, ignoring anything not modelled here.
    pub fn from_xml(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml).map_err(|e| VmError::Xml(e.to_string()))
    }

    /// Kernel command line, if the domain boots a kernel directly.
    pub fn cmdline(&self) -> Option<&str> {
        self.os.as_ref().and_then(|os| os.cmdline.as_deref())
    }

    /// Distinct names of the bridges the domain's `type='bridge'` interfaces
    /// attach to, in document order.
    ///
    /// Interfaces on a libvirt network also report a `bridge` once running;
    /// that device belongs to libvirt and is skipped.
    pub fn bridge_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for iface in &self.devices.interfaces {
            if iface.iface_type.as_deref() != Some("bridge") {
                continue;
            }
            let bridge = iface
                .source
                .as_ref()
                .and_then(|s| s.bridge.as_deref())
                .filter(|b| !b.is_empty());
            if let Some(bridge) = bridge {
                if !names.iter().any(|n| n == bridge) {
                    names.push(bridge.to_string());
                }
            }
        }
        names
    }
}
