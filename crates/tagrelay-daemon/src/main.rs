//! tagrelay - SensorTag to IoT Hub telemetry relay daemon
//!
//! Discovers the configured SensorTag devices over the local wireless link,
//! keeps one session per device, and periodically forwards each device's
//! aggregated readings to the hub.

mod config;
mod fleet;
mod publisher;
mod session;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tagrelay_hub::{HttpSink, TelemetrySink};
use tagrelay_link::mock::MockLink;

#[derive(Parser, Debug)]
#[command(name = "tagrelay")]
#[command(about = "SensorTag to IoT Hub telemetry relay daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tagrelay.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write a template configuration file and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("tagrelay v{}", env!("CARGO_PKG_VERSION"));

    if args.write_config {
        config::save_default_config(&args.config)?;
        println!("Wrote template configuration to {}", args.config.display());
        return Ok(());
    }

    let config = config::load_config(&args.config)?;
    if let Err(err) = config.validate() {
        anyhow::bail!(
            "{} in {}; run with --write-config to generate a template",
            err,
            args.config.display()
        );
    }

    info!(
        hub = %config.hub.name,
        devices = config.devices.len(),
        interval_ms = config.relay.transmit_interval_ms,
        "Configuration loaded"
    );

    // TODO: native BLE SensorLink backend; the mock link keeps the daemon
    // runnable end to end until one lands.
    let link = Arc::new(MockLink::new());

    let fleet = fleet::FleetCoordinator::new(config.clone());
    fleet
        .run(link, |descriptor| {
            let conn = config.connection_string(descriptor);
            Arc::new(HttpSink::new(conn)) as Arc<dyn TelemetrySink>
        })
        .await;

    Ok(())
}
