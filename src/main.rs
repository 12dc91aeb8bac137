use clap::Parser;
use http_sensor_bridge::config::{self, Config};
use http_sensor_bridge::host::AccessoryRegistry;
use http_sensor_bridge::input::SensorPoller;
use http_sensor_bridge::logging::init_logger;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

/// Expose an HTTP sensor endpoint as temperature, humidity and light sensors.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Sensor endpoint to poll
    #[arg(long, env = "SENSOR_URL")]
    url: Option<String>,

    /// Poll period in milliseconds
    #[arg(long, env = "SENSOR_UPDATE_INTERVAL_MS")]
    update_interval: Option<u64>,

    /// Host-style JSON accessory config ({"url": ..., "updateInterval": ...})
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accessory name shown by the host
    #[arg(long, env = "ACCESSORY_NAME")]
    name: Option<String>,
}

fn load_config(args: Args) -> http_sensor_bridge::error::Result<Config> {
    let mut config = Config::from_env();
    if let Some(path) = &args.config {
        config = config.with_poller_file(path)?;
    }

    // Command line wins over file and environment
    if let Some(url) = args.url {
        config.poller.url = Some(url);
    }
    if let Some(ms) = args.update_interval {
        config.poller.update_interval = Some(ms);
    }
    if let Some(name) = args.name {
        config.accessory.name = name;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads env fallbacks
    config::load_dotenv();
    init_logger();
    info!("Starting HTTP Sensor Bridge");

    let config = match load_config(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration loaded:");
    info!("  Accessory: {}", config.accessory.name);
    info!(
        "  URL: {}",
        config.poller.url.as_deref().unwrap_or("<not set>")
    );
    info!("  Update interval: {:?}", config.poller.poll_interval());

    let poller = match SensorPoller::from_config(&config.accessory.name, config.poller.clone()) {
        Ok(poller) => Arc::new(poller),
        Err(e) => {
            error!("Failed to create sensor poller: {}", e);
            std::process::exit(1);
        }
    };

    let mut host = AccessoryRegistry::new();
    host.register(poller.clone());

    let handle = poller.start();
    info!("HTTP Sensor Bridge is running (Ctrl+C to exit)");

    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    handle.stop().await;

    let stats = poller.stats();
    info!(
        "HTTP Sensor Bridge stopped ({} successful, {} failed fetches)",
        stats.successes, stats.failures
    );
    for value in host.read_all() {
        info!(
            "  Last {}: {} {}",
            value.kind.characteristic(),
            value.value,
            value.kind.unit()
        );
    }
}
