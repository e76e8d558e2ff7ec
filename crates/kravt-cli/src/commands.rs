//! Subcommands and their handlers.

use clap::{Args, Subcommand, ValueEnum};
use kravt_core::{GuestSpec, Hypervisor, LifecycleController, NetworkIntent, NetworkOps};
use kravt_vm::{
    DEFAULT_BRIDGE_NAME, DEFAULT_GATEWAY_ADDR, DEFAULT_GUEST_ADDR, DEFAULT_MEMORY_MIB,
    DEFAULT_MOUNT_TAG, DEFAULT_NETMASK,
};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a new domain (and optionally its bridge)
    Define(DefineArgs),
    /// Boot a defined domain
    Start(DomainArgs),
    /// Print the state of a domain
    Info(InfoArgs),
    /// Forcibly stop a running domain
    Destroy(DomainArgs),
    /// Remove a domain and tear down the bridges it used
    Undefine(UndefineArgs),
}

#[derive(Args, Debug)]
pub struct DomainArgs {
    /// Domain name
    #[arg(long)]
    pub domain: String,
}

#[derive(Args, Debug)]
pub struct DefineArgs {
    /// Domain name
    #[arg(long)]
    pub domain: String,

    /// Path to kernel image
    #[arg(long)]
    pub kernel: PathBuf,

    /// Host directory shared with the guest as its root filesystem
    #[arg(long)]
    pub rootfs: Option<PathBuf>,

    /// Mount tag of the shared root filesystem
    #[arg(long, default_value = DEFAULT_MOUNT_TAG)]
    pub rootfs_tag: String,

    /// Attach the guest to a host bridge
    #[arg(long)]
    pub bridge: bool,

    #[arg(long, default_value = DEFAULT_BRIDGE_NAME)]
    pub bridge_name: String,

    /// Guest IPv4 address
    #[arg(long, default_value_t = DEFAULT_GUEST_ADDR.to_string())]
    pub bridge_guest: String,

    /// Gateway IPv4 address, assigned to the bridge
    #[arg(long, default_value_t = DEFAULT_GATEWAY_ADDR.to_string())]
    pub bridge_gateway: String,

    #[arg(long, default_value_t = DEFAULT_NETMASK.to_string())]
    pub bridge_netmask: String,

    /// Memory in MiB
    #[arg(long, default_value_t = DEFAULT_MEMORY_MIB)]
    pub memory: u64,

    /// Start the domain once defined
    #[arg(long)]
    pub start: bool,

    /// Extra kernel arguments
    #[arg(last = true)]
    pub boot_args: Vec<String>,
}

impl DefineArgs {
    pub fn guest_spec(&self) -> kravt_vm::Result<GuestSpec> {
        let mut builder = GuestSpec::builder()
            .name(&self.domain)
            .kernel(&self.kernel)
            .mount_tag(&self.rootfs_tag)
            .memory_mib(self.memory)
            .boot_args(self.boot_args.iter().cloned());

        if let Some(rootfs) = &self.rootfs {
            builder = builder.rootfs(rootfs);
        }
        if self.bridge {
            builder = builder.with_network(NetworkIntent::parse(
                &self.bridge_name,
                &self.bridge_guest,
                &self.bridge_gateway,
                &self.bridge_netmask,
            )?);
        }
        builder.build()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Domain name
    #[arg(long)]
    pub domain: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct UndefineArgs {
    /// Domain name
    #[arg(long)]
    pub domain: String,

    /// Destroy the domain before undefining it
    #[arg(long)]
    pub destroy: bool,
}

/// Run one subcommand. Results go to stdout; everything else is logged.
pub async fn execute<H, N>(
    command: Command,
    controller: &LifecycleController<H, N>,
) -> anyhow::Result<()>
where
    H: Hypervisor,
    N: NetworkOps,
{
    match command {
        Command::Define(args) => {
            let spec = args.guest_spec()?;
            controller.define(&spec, args.start).await?;
        }
        Command::Start(args) => controller.start(&args.domain).await?,
        Command::Info(args) => {
            let state = controller.info(&args.domain).await?;
            match args.format {
                OutputFormat::Text => println!("State: {}", state.label()),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "domain": args.domain, "state": state })
                ),
            }
        }
        Command::Destroy(args) => controller.destroy(&args.domain).await?,
        Command::Undefine(args) => {
            let bridges = controller.undefine(&args.domain, args.destroy).await?;
            if !bridges.is_empty() {
                tracing::info!(domain = %args.domain, ?bridges, "Bridges torn down");
            }
        }
    }
    Ok(())
}
