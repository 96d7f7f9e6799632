//! # CRTP Commander
//!
//! Fly a Crazyflie over Bluetooth LE with a gamepad.
//!
//! ```bash
//! crtp-commander probe
//! crtp-commander --config config/default.toml fly
//! ```
//!
//! `fly` connects to the first paired Crazyflie, then streams commander
//! setpoints until Ctrl+C or until the link drops.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::time::{interval, Duration};
use tracing::{info, warn};

use crtp_commander::commander::CommandLoop;
use crtp_commander::config::Config;
use crtp_commander::controller::FlightAxesSource;
use crtp_commander::logging::init_logging;
use crtp_commander::transport::link::GattLink;

/// Config file picked up when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Shown when no paired Crazyflie exposes the CRTP service
const PAIRING_INSTRUCTIONS: &str =
    "Crazyflie not found. Please pair it in Settings > Devices > Bluetooth first";

#[derive(Debug, Parser)]
#[command(name = "crtp-commander", version, about = "Fly a Crazyflie over BLE with a gamepad")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check whether a Crazyflie is paired
    Probe,
    /// Stream gamepad setpoints until Ctrl+C
    Fly,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let _logging = init_logging(&config.logging)?;

    info!("CRTP Commander v{} starting...", env!("CARGO_PKG_VERSION"));

    #[cfg(windows)]
    {
        let link = Arc::new(crtp_commander::transport::winrt::WinRtGattLink::new());
        match cli.command {
            Command::Probe => probe(link).await,
            Command::Fly => {
                let source = crtp_commander::controller::winrt_gamepad::WinRtGamepadSource::open(
                    &config.controller,
                )?;
                fly(link, source, &config).await
            }
        }
    }

    #[cfg(not(windows))]
    {
        let _ = (cli.command, &config);
        anyhow::bail!("No Bluetooth LE backend is available on this platform")
    }
}

/// Fail with the pairing instructions unless a Crazyflie is paired
#[cfg_attr(not(windows), allow(dead_code))]
async fn ensure_paired<L: GattLink>(commander: &CommandLoop<L>) -> Result<()> {
    if commander.probe().await {
        Ok(())
    } else {
        anyhow::bail!(PAIRING_INSTRUCTIONS)
    }
}

#[cfg_attr(not(windows), allow(dead_code))]
async fn probe<L: GattLink>(link: Arc<L>) -> Result<()> {
    ensure_paired(&CommandLoop::new(link)).await?;
    info!("Crazyflie found");
    Ok(())
}

#[cfg_attr(not(windows), allow(dead_code))]
async fn fly<L, S>(link: Arc<L>, source: S, config: &Config) -> Result<()>
where
    L: GattLink,
    S: FlightAxesSource + 'static,
{
    let mut commander = CommandLoop::new(link);
    ensure_paired(&commander).await?;

    if !commander.start(source, config.scaling).await? {
        anyhow::bail!("Could not connect to a Crazyflie");
    }

    info!("Flying, press Ctrl+C to stop");

    let mut status = interval(Duration::from_millis(config.logging.status_interval_ms));
    let mut last_count: u64 = 0;

    loop {
        tokio::select! {
            _ = status.tick() => {
                let sent = commander.packets_sent();
                info!("Sent {} packets (+{})", sent, sent - last_count);
                last_count = sent;

                if !commander.is_running() {
                    warn!("Command loop ended on its own");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let exit = commander.stop().await;
    info!(
        "Command loop finished: {:?}, {} packets sent",
        exit,
        commander.packets_sent()
    );

    Ok(())
}
