// bmcmux: drive one BMC through whichever providers answer
use std::io::stderr;
use std::path::PathBuf;
use std::time::Duration;

use bmcmux_bmc::{BmcResetType, Context};
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

mod cmd;
mod config;

use cmd::bmc::SolCommand;
use cmd::boot_device::BootDeviceArgs;
use cmd::power::PowerCommand;
use cmd::sel::SelCommand;

#[derive(Parser, Debug)]
#[command(author, version, about = "Vendor-neutral BMC control", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// BMC config file
    #[arg(short, long, global = true, default_value = "bmcmux.yaml")]
    config: PathBuf,

    /// Give up on the whole command after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Verbose output - shows more detailed logs
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the configured providers and their capabilities
    Providers,
    /// Query or change the power state
    #[command(subcommand)]
    Power(PowerCommand),
    /// Set the next boot device
    BootDevice(BootDeviceArgs),
    /// Reset the BMC itself (warm or cold)
    BmcReset {
        reset_type: BmcResetType,
    },
    /// System event log
    #[command(subcommand)]
    Sel(SelCommand),
    /// Send a non-maskable interrupt to the host
    Nmi,
    /// Serial-over-LAN
    #[command(subcommand)]
    Sol(SolCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let default_directives = format!(
        "bmcmux={level},bmcmux_bmc={level}",
        level = default_level
    );
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    registry()
        .with(filter)
        .with(fmt::layer().with_writer(stderr))
        .init();

    let config = config::load(&cli.config)?;
    debug!(path = %cli.config.display(), host = %config.host, "Loaded config");

    let ctx = Context::background();
    let cancel = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, cancelling");
            cancel.cancel();
        }
    });
    let ctx = match cli.timeout {
        Some(secs) => ctx.with_timeout(Duration::from_secs(secs)),
        None => ctx,
    };

    match cli.command {
        Commands::Providers => cmd::providers::run(&config),
        Commands::Power(command) => cmd::power::run(&config, ctx, command).await,
        Commands::BootDevice(args) => cmd::boot_device::run(&config, ctx, args).await,
        Commands::BmcReset { reset_type } => cmd::bmc::reset(&config, ctx, reset_type).await,
        Commands::Sel(command) => cmd::sel::run(&config, ctx, command).await,
        Commands::Nmi => cmd::bmc::nmi(&config, ctx).await,
        Commands::Sol(command) => cmd::bmc::sol(&config, ctx, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmcmux_bmc::BootDevice;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_boot_device() {
        let cli = Cli::parse_from([
            "bmcmux",
            "--config",
            "bmc.yaml",
            "boot-device",
            "pxe",
            "--persistent",
        ]);
        match cli.command {
            Commands::BootDevice(args) => {
                assert_eq!(args.device, BootDevice::Pxe);
                assert!(args.persistent);
                assert!(!args.efi);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("bmc.yaml"));
    }

    #[test]
    fn test_parse_power_and_reset() {
        let cli = Cli::parse_from(["bmcmux", "power", "cycle"]);
        assert!(matches!(cli.command, Commands::Power(PowerCommand::Cycle)));

        let cli = Cli::parse_from(["bmcmux", "bmc-reset", "cold", "--timeout", "5"]);
        assert!(matches!(
            cli.command,
            Commands::BmcReset {
                reset_type: BmcResetType::Cold
            }
        ));
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_rejects_unknown_boot_device() {
        assert!(Cli::try_parse_from(["bmcmux", "boot-device", "tape"]).is_err());
    }
}
