//! Domain run state as reported by the hypervisor.

use serde::Serialize;
use std::fmt;

/// Run state of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainState {
    NoState,
    Running,
    Blocked,
    Paused,
    ShuttingDown,
    ShutOff,
    Crashed,
    Suspended,
    /// Any value the hypervisor reports that is not one of the above
    Unknown,
}

impl DomainState {
    /// Map a raw `virDomainState` code.
    pub fn from_raw(code: u32) -> Self {
        match code {
            0 => Self::NoState,
            1 => Self::Running,
            2 => Self::Blocked,
            3 => Self::Paused,
            4 => Self::ShuttingDown,
            5 => Self::ShutOff,
            6 => Self::Crashed,
            7 => Self::Suspended,
            _ => Self::Unknown,
        }
    }

    /// Map the output of `virsh domstate`.
    pub fn from_virsh(output: &str) -> Self {
        match output.trim() {
            "no state" => Self::NoState,
            "running" => Self::Running,
            "idle" | "blocked" => Self::Blocked,
            "paused" => Self::Paused,
            "in shutdown" => Self::ShuttingDown,
            "shut off" => Self::ShutOff,
            "crashed" => Self::Crashed,
            "pmsuspended" => Self::Suspended,
            _ => Self::Unknown,
        }
    }

    /// Short machine-readable id.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoState => "no-state",
            Self::Running => "running",
            Self::Blocked => "blocked",
            Self::Paused => "paused",
            Self::ShuttingDown => "shutting-down",
            Self::ShutOff => "shut-off",
            Self::Crashed => "crashed",
            Self::Suspended => "suspended",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoState => "no state",
            Self::Running => "running",
            Self::Blocked => "blocked on resource",
            Self::Paused => "paused",
            Self::ShuttingDown => "being shut down",
            Self::ShutOff => "shut off",
            Self::Crashed => "crashed",
            Self::Suspended => "suspended by guest power management",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DomainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_raw_codes_map_one_to_one() {
        let states: Vec<DomainState> = (0..8).map(DomainState::from_raw).collect();
        assert_eq!(
            states,
            vec![
                DomainState::NoState,
                DomainState::Running,
                DomainState::Blocked,
                DomainState::Paused,
                DomainState::ShuttingDown,
                DomainState::ShutOff,
                DomainState::Crashed,
                DomainState::Suspended,
            ]
        );

        let labels: HashSet<&str> = states.iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), 8);
        assert!(!labels.contains("unknown"));
    }

    #[test]
    fn test_unrecognised_code_falls_back() {
        assert_eq!(DomainState::from_raw(8), DomainState::Unknown);
        assert_eq!(DomainState::from_raw(u32::MAX), DomainState::Unknown);
        assert_eq!(DomainState::Unknown.label(), "unknown");
    }

    #[test]
    fn test_running_label() {
        assert_eq!(DomainState::from_raw(1).to_string(), "running");
    }

    #[test]
    fn test_virsh_output() {
        assert_eq!(DomainState::from_virsh("running\n\n"), DomainState::Running);
        assert_eq!(DomainState::from_virsh("shut off\n"), DomainState::ShutOff);
        assert_eq!(DomainState::from_virsh("in shutdown"), DomainState::ShuttingDown);
        assert_eq!(DomainState::from_virsh("idle"), DomainState::Blocked);
        assert_eq!(DomainState::from_virsh("pmsuspended"), DomainState::Suspended);
        assert_eq!(DomainState::from_virsh("exploded"), DomainState::Unknown);
    }

    #[test]
    fn test_serialize_as_short_id() {
        for code in 0..9 {
            let state = DomainState::from_raw(code);
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }
}
