//! Fetch a sensor endpoint once and print what the bridge would expose.
//!
//! Usage:
//!   cargo run --bin fetch-once -- http://10.0.0.40/sensors
//!
//! Without an argument the URL comes from SENSOR_URL (or .env).

use http_sensor_bridge::config::{self, Config};
use http_sensor_bridge::input::SensorPoller;
use http_sensor_bridge::logging::init_logger;
use log::{error, info};

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    config::load_dotenv();

    init_logger();

    let mut config = Config::from_env();
    if let Some(url) = std::env::args().nth(1) {
        config.poller.url = Some(url);
    }

    let poller = match SensorPoller::from_config(&config.accessory.name, config.poller) {
        Ok(poller) => poller,
        Err(e) => {
            error!("Failed to create sensor poller: {}", e);
            std::process::exit(1);
        }
    };

    match poller.refresh().await {
        Ok(reading) => {
            info!(">>> Temperature: {:.1} °C", reading.temperature);
            info!(">>> Humidity:    {:.1} %", reading.humidity);
            info!(">>> Light:       {:.0} lx", reading.ambient_light);
        }
        Err(e) => {
            error!("Fetch failed: {}", e);
            std::process::exit(1);
        }
    }
}
