//! Best-effort bridge provisioning on the host.

use crate::cmd::{CommandRunner, HostCommand};
use crate::error::NetworkError;
use async_trait::async_trait;
use kravt_vm::NetworkIntent;

/// Default `ip` executable, resolved through `PATH`.
pub const DEFAULT_IP_PROGRAM: &str = "ip";

/// Host network capability used by the lifecycle controller.
///
/// Both operations attempt every step. An `Err` lists the steps that failed;
/// callers log it and carry on.
#[async_trait(?Send)]
pub trait NetworkOps {
    /// Create the bridge, assign it the gateway address and bring it up.
    async fn provision(&self, intent: &NetworkIntent) -> Result<(), NetworkError>;

    /// Bring the bridge down and delete it.
    async fn teardown(&self, bridge: &str) -> Result<(), NetworkError>;
}

/// [`NetworkOps`] driving iproute2's `ip` command.
#[derive(Debug, Clone)]
pub struct BridgeProvisioner<R> {
    runner: R,
    sudo: bool,
    ip_program: String,
}

impl<R: CommandRunner> BridgeProvisioner<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            sudo: true,
            ip_program: DEFAULT_IP_PROGRAM.to_string(),
        }
    }

    /// Prefix every command with `sudo` (default: true).
    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn ip_program(mut self, program: impl Into<String>) -> Self {
        self.ip_program = program.into();
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn ip<const N: usize>(&self, args: [&str; N]) -> HostCommand {
        if self.sudo {
            HostCommand::new("sudo").arg(&self.ip_program).args(args)
        } else {
            HostCommand::new(&self.ip_program).args(args)
        }
    }

    pub fn provision_commands(&self, intent: &NetworkIntent) -> Vec<HostCommand> {
        let bridge = intent.bridge_name();
        let cidr = intent.gateway_cidr();
        vec![
            self.ip(["link", "add", "dev", bridge, "type", "bridge"]),
            self.ip(["address", "add", cidr.as_str(), "dev", bridge]),
            self.ip(["link", "set", "dev", bridge, "up"]),
        ]
    }

    pub fn teardown_commands(&self, bridge: &str) -> Vec<HostCommand> {
        vec![
            self.ip(["link", "set", "dev", bridge, "down"]),
            self.ip(["link", "del", "dev", bridge]),
        ]
    }

    async fn run_all(&self, bridge: &str, commands: Vec<HostCommand>) -> Result<(), NetworkError> {
        let mut failures = Vec::new();
        for command in &commands {
            if let Err(e) = self.runner.run(command).await {
                tracing::warn!(bridge = %bridge, error = %e, "Host network command failed");
                failures.push(e);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NetworkError {
                bridge: bridge.to_string(),
                failures,
            })
        }
    }
}

#[async_trait(?Send)]
impl<R: CommandRunner> NetworkOps for BridgeProvisioner<R> {
    async fn provision(&self, intent: &NetworkIntent) -> Result<(), NetworkError> {
        tracing::debug!(
            bridge = %intent.bridge_name(),
            gateway = %intent.gateway_cidr(),
            "Provisioning bridge"
        );
        self.run_all(intent.bridge_name(), self.provision_commands(intent))
            .await
    }

    async fn teardown(&self, bridge: &str) -> Result<(), NetworkError> {
        tracing::debug!(bridge = %bridge, "Tearing down bridge");
        self.run_all(bridge, self.teardown_commands(bridge)).await
    }
}
