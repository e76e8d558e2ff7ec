//! kravt entry point.
//!
//! Defines, starts, inspects and removes kernel-booted domains, creating and
//! removing their host bridge alongside. One command runs per invocation;
//! nothing is remembered between runs.

mod commands;

use clap::Parser;
use commands::Command;
use kravt_core::{BridgeProvisioner, KravtConfig, LifecycleController, SystemRunner};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "kravt", version, about)]
struct Opts {
    /// Hypervisor connection URI
    ///
    /// Overrides `KRAVT_CONNECT`.
    #[arg(long, global = true)]
    connect: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let opts = Opts::parse();

    if let Err(e) = init_tracing(opts.verbose) {
        eprintln!("Error: failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(opts)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command results.
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(format!("kravt={level}").parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

/// Environment configuration with command-line overrides applied.
fn load_config(connect: Option<String>) -> KravtConfig {
    let config = KravtConfig::from_env();
    match connect {
        Some(uri) => config.with_connect_uri(uri),
        None => config,
    }
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    let config = load_config(opts.connect);
    config.validate()?;
    tracing::debug!(?config, "Configuration loaded");

    let network = BridgeProvisioner::new(SystemRunner)
        .sudo(config.use_sudo)
        .ip_program(&config.ip_program);
    let hypervisor = open_hypervisor(&config).await?;

    // The connection lives exactly as long as the controller.
    let controller = LifecycleController::new(hypervisor, network);
    commands::execute(opts.command, &controller).await
}

#[cfg(not(feature = "libvirt"))]
async fn open_hypervisor(config: &KravtConfig) -> kravt_vm::Result<kravt_vm::VirshHypervisor> {
    kravt_vm::VirshHypervisor::connect(&config.virsh_program, &config.connect_uri).await
}

#[cfg(feature = "libvirt")]
async fn open_hypervisor(config: &KravtConfig) -> kravt_vm::Result<kravt_vm::LibvirtHypervisor> {
    kravt_vm::LibvirtHypervisor::open(&config.connect_uri)
}
