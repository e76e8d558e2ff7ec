//! Configuration for kravt.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use crate::error::{CoreError, Result};
use crate::net::DEFAULT_IP_PROGRAM;
use kravt_vm::{DEFAULT_CONNECT_URI, DEFAULT_VIRSH_PROGRAM};

/// Host-side settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KravtConfig {
    /// Hypervisor connection URI.
    pub connect_uri: String,

    /// Run host network commands through `sudo` (default: true).
    pub use_sudo: bool,

    pub ip_program: String,

    /// `virsh` executable used by the command-line backend.
    pub virsh_program: String,
}

impl Default for KravtConfig {
    fn default() -> Self {
        Self {
            connect_uri: DEFAULT_CONNECT_URI.to_string(),
            use_sudo: true,
            ip_program: DEFAULT_IP_PROGRAM.to_string(),
            virsh_program: DEFAULT_VIRSH_PROGRAM.to_string(),
        }
    }
}

impl KravtConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `KRAVT_CONNECT` | `qemu:///system` |
    /// | `KRAVT_SUDO` | `true` |
    /// | `KRAVT_IP` | `ip` |
    /// | `KRAVT_VIRSH` | `virsh` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            connect_uri: lookup("KRAVT_CONNECT").unwrap_or(default.connect_uri),
            use_sudo: lookup("KRAVT_SUDO")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(default.use_sudo),
            ip_program: lookup("KRAVT_IP").unwrap_or(default.ip_program),
            virsh_program: lookup("KRAVT_VIRSH").unwrap_or(default.virsh_program),
        }
    }

    /// Override the connection URI, e.g. from a command-line flag.
    pub fn with_connect_uri(mut self, uri: impl Into<String>) -> Self {
        self.connect_uri = uri.into();
        self
    }

    /// Reject empty values.
    pub fn validate(&self) -> Result<()> {
        if self.connect_uri.trim().is_empty() {
            return Err(CoreError::Config("connection URI is empty".into()));
        }
        if self.ip_program.trim().is_empty() {
            return Err(CoreError::Config("ip program is empty".into()));
        }
        if self.virsh_program.trim().is_empty() {
            return Err(CoreError::Config("virsh program is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> KravtConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        KravtConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load(&[]);
        assert_eq!(config, KravtConfig::default());
        assert_eq!(config.connect_uri, "qemu:///system");
        assert!(config.use_sudo);
        assert_eq!(config.ip_program, "ip");
        assert_eq!(config.virsh_program, "virsh");
        config.validate().unwrap();
    }

    #[test]
    fn test_config_overrides() {
        let config = load(&[
            ("KRAVT_CONNECT", "qemu:///session"),
            ("KRAVT_IP", "/usr/sbin/ip"),
            ("KRAVT_VIRSH", "/opt/bin/virsh"),
        ]);
        assert_eq!(config.connect_uri, "qemu:///session");
        assert_eq!(config.ip_program, "/usr/sbin/ip");
        assert_eq!(config.virsh_program, "/opt/bin/virsh");
    }

    #[test]
    fn test_sudo_flag_parsing() {
        assert!(!load(&[("KRAVT_SUDO", "false")]).use_sudo);
        assert!(!load(&[("KRAVT_SUDO", "0")]).use_sudo);
        assert!(load(&[("KRAVT_SUDO", "yes")]).use_sudo);
    }

    #[test]
    fn test_connect_override() {
        let config = load(&[("KRAVT_CONNECT", "qemu:///session")])
            .with_connect_uri("test:///default");
        assert_eq!(config.connect_uri, "test:///default");
    }

    #[test]
    fn test_validate_rejects_empty() {
        let err = load(&[("KRAVT_CONNECT", "")]).validate().unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(err.is_validation());

        assert!(load(&[("KRAVT_IP", " ")]).validate().is_err());
        assert!(load(&[("KRAVT_VIRSH", "")]).validate().is_err());
    }
}
