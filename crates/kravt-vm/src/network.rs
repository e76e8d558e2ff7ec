//! Bridged networking parameters for a guest.

use crate::error::{Result, VmError};
use std::net::Ipv4Addr;

/// Default name of the host bridge device.
pub const DEFAULT_BRIDGE_NAME: &str = "virbr0";
/// Default guest address on the bridge.
pub const DEFAULT_GUEST_ADDR: Ipv4Addr = Ipv4Addr::new(172, 44, 0, 2);
/// Default gateway address, assigned to the bridge itself.
pub const DEFAULT_GATEWAY_ADDR: Ipv4Addr = Ipv4Addr::new(172, 44, 0, 1);
/// Default subnet mask.
pub const DEFAULT_NETMASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);

/// Kernel limit on interface names, excluding the trailing NUL.
pub const MAX_IFNAME_LEN: usize = 15;

/// A request to attach the guest to a host bridge.
///
/// Construction validates every field, so a `NetworkIntent` always carries a
/// contiguous netmask and its derived prefix length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkIntent {
    bridge_name: String,
    guest_addr: Ipv4Addr,
    gateway_addr: Ipv4Addr,
    netmask: Ipv4Addr,
    prefix_len: u8,
}

impl Default for NetworkIntent {
    fn default() -> Self {
        Self {
            bridge_name: DEFAULT_BRIDGE_NAME.to_string(),
            guest_addr: DEFAULT_GUEST_ADDR,
            gateway_addr: DEFAULT_GATEWAY_ADDR,
            netmask: DEFAULT_NETMASK,
            prefix_len: 24,
        }
    }
}

impl NetworkIntent {
    /// Create an intent from already-parsed addresses.
    ///
    /// # Errors
    /// Returns `VmError::Validation` if the bridge name is unusable or the
    /// netmask is not a contiguous prefix mask.
    pub fn new(
        bridge_name: impl Into<String>,
        guest_addr: Ipv4Addr,
        gateway_addr: Ipv4Addr,
        netmask: Ipv4Addr,
    ) -> Result<Self> {
        let bridge_name = bridge_name.into();
        validate_bridge_name(&bridge_name)?;

        let prefix_len = derive_prefix_len(netmask).ok_or_else(|| {
            VmError::Validation(format!("invalid IPv4 subnet mask: {netmask}"))
        })?;

        Ok(Self {
            bridge_name,
            guest_addr,
            gateway_addr,
            netmask,
            prefix_len,
        })
    }

    /// Create an intent from dotted-quad strings, as supplied on the command line.
    pub fn parse(bridge_name: &str, guest: &str, gateway: &str, netmask: &str) -> Result<Self> {
        let guest_addr = parse_addr(guest, "guest IPv4 address")?;
        let gateway_addr = parse_addr(gateway, "gateway IPv4 address")?;
        let netmask_addr = parse_addr(netmask, "IPv4 subnet mask")?;
        Self::new(bridge_name, guest_addr, gateway_addr, netmask_addr)
    }

    pub fn bridge_name(&self) -> &str {
        &self.bridge_name
    }

    pub fn guest_addr(&self) -> Ipv4Addr {
        self.guest_addr
    }

    pub fn gateway_addr(&self) -> Ipv4Addr {
        self.gateway_addr
    }

    pub fn netmask(&self) -> Ipv4Addr {
        self.netmask
    }

    /// Number of leading one-bits in the netmask.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Gateway address in CIDR notation, e.g. `172.44.0.1/24`.
    pub fn gateway_cidr(&self) -> String {
        format!("{}/{}", self.gateway_addr, self.prefix_len)
    }

    /// Kernel command-line tokens telling the guest how to configure its NIC.
    ///
    /// Order is fixed: guest address, gateway, subnet mask.
    pub fn boot_args(&self) -> [String; 3] {
        [
            format!("netdev.ipv4_addr={}", self.guest_addr),
            format!("netdev.ipv4_gw_addr={}", self.gateway_addr),
            format!("netdev.ipv4_subnet_mask={}", self.netmask),
        ]
    }
}

/// Convert a netmask to its prefix length.
///
/// Returns `None` if the one-bits of the mask are not contiguous from the top.
pub fn derive_prefix_len(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    let host_bits = !bits;
    // A valid mask's host part is of the form 2^k - 1.
    if host_bits & host_bits.wrapping_add(1) != 0 {
        return None;
    }
    Some(bits.leading_ones() as u8)
}

fn parse_addr(value: &str, what: &str) -> Result<Ipv4Addr> {
    value
        .trim()
        .parse()
        .map_err(|_| VmError::Validation(format!("invalid {what}: {value:?}")))
}

fn validate_bridge_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VmError::Validation("bridge name must not be empty".into()));
    }
    if name.len() > MAX_IFNAME_LEN {
        return Err(VmError::Validation(format!(
            "bridge name {name:?} exceeds {MAX_IFNAME_LEN} bytes"
        )));
    }
    if name.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(VmError::Validation(format!(
            "bridge name {name:?} contains invalid characters"
        )));
    }
    Ok(())
}
