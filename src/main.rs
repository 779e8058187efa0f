//! ==============================================================================
//! main.rs - weather station entry point
//! ==============================================================================
//!
//! purpose:
//!     runs the station: reads the sensors on a fixed interval, appends every
//!     reading to the csv log and serves the dashboard.
//!
//! responsibilities:
//!     - load station.toml (or defaults) and install the tracing subscriber
//!     - decide between hardware and mock sensors (platform.rs)
//!     - --check-sensors: one read, print, exit
//!     - create the data directory and the log header
//!     - spawn the web server, run the logger loop until ctrl-c
//!
//! architecture:
//!
//!     ┌─────────────────────────────────────────────────────────────┐
//!     │                     weather-station                         │
//!     │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//!     │  │ logger loop │  │ web server  │  │ lcd / alerts        │  │
//!     │  │ (300s)      │  │ (port 5000) │  │ (optional)          │  │
//!     │  └──────┬──────┘  └──────┬──────┘  └──────────┬──────────┘  │
//!     │         └────────────────┼────────────────────┘             │
//!     │                    ┌─────┴─────┐                            │
//!     │                    │  station  │ <- station.rs              │
//!     │                    └─────┬─────┘                            │
//!     └──────────────────────────┼──────────────────────────────────┘
//!                    ┌───────────┴───────────┐
//!                    ▼                       ▼
//!             ┌─────────────┐         ┌─────────────┐
//!             │ SensorHub   │         │ WeatherLog  │
//!             │ dht22/bmp280│         │ (csv)       │
//!             └─────────────┘         └─────────────┘
//!
//! ==============================================================================

use weather_station::alerts::WeatherAlerts;
use weather_station::config::StationConfig;
use weather_station::email::EmailNotifier;
use weather_station::lcd::{self, LcdPanel};
use weather_station::logger::WeatherLog;
use weather_station::logging::init_logging;
use weather_station::platform::{self, Platform};
use weather_station::sensors::{self, SensorHub};
use weather_station::server::{self, AppState};
use weather_station::station::{self, LoggerOutputs, Station};

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "weather-station", version, about = "Home weather station: sensor logging and web dashboard")]
struct Args {
    /// path to station.toml (default: config/station.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// use mock sensors even on a raspberry pi
    #[arg(long)]
    mock: bool,

    /// read every sensor once, print the result and exit
    #[arg(long)]
    check_sensors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // step 1: load configuration, then logging (the level lives in the config)
    let config_path = args.config.clone().or_else(StationConfig::find_file);
    let config = match &config_path {
        Some(path) => StationConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => StationConfig::default(),
    };
    init_logging(&config.logging.level);

    // startup banner
    println!("===========================================================");
    println!("  Weather Station");
    println!("  DHT22 + BMP280 | CSV log | live dashboard");
    println!("===========================================================");
    match &config_path {
        Some(path) => tracing::info!("[CONFIG] Loaded from {}", path.display()),
        None => tracing::warn!("[CONFIG] No config file found - using defaults"),
    }

    // step 2: pick sensors for this machine
    let platform = Platform::detect();
    if let Platform::RaspberryPi { model } = &platform {
        tracing::info!("[STARTUP] Detected {}", model);
    }
    let mock = platform::use_mock_sensors(&platform, args.mock);
    config.print_summary(mock);

    let hub = SensorHub::new(sensors::select(&config.sensors, mock));

    if args.check_sensors {
        let [dht, bmp] = station::check_sensors(&hub).await?;
        println!("{}", dht);
        println!("{}", bmp);
        return Ok(());
    }

    // step 3: prepare the log
    std::fs::create_dir_all(&config.logging.data_dir)
        .with_context(|| format!("creating data directory {}", config.logging.data_dir.display()))?;
    let log = WeatherLog::new(&config.logging.log_file);
    log.init()?;
    tracing::info!("[STARTUP] ✓ Logging to {}", log.path().display());

    let station = Station::new(hub, log);

    // step 4: optional outputs
    let mut lcd = config.lcd.enabled.then(|| LcdPanel::new(lcd::select(&config.lcd, mock), &config.lcd));
    if let Some(panel) = lcd.as_mut() {
        panel.show_message("Weather Station\nStarting...");
    }
    let alerts = match (config.alerts.enabled, &config.alerts.email) {
        (false, _) => None,
        (true, None) => Some(WeatherAlerts::new(config.alerts.clone())),
        (true, Some(email)) => {
            let notifier = EmailNotifier::new(email).context("configuring [alerts.email]")?;
            tracing::info!("[ALERT] Mailing alerts to {}", notifier.recipients());
            Some(WeatherAlerts::new(config.alerts.clone()).with_email(notifier))
        }
    };

    // step 5: start the web server in background
    let addr = config.web.socket_addr()?;
    let web_state = AppState::new(station.clone(), config.dashboard.clone());
    tokio::spawn(async move {
        if let Err(e) = server::serve(web_state, addr).await {
            tracing::error!("[WEB] {:#}", e);
        }
    });

    // step 6: logger loop until ctrl-c
    let interval = Duration::from_secs(config.logging.interval_seconds.max(1));
    let outputs = LoggerOutputs { lcd, alerts, show_sensor_data: config.logging.show_sensor_data };
    println!("────────────────────────────────────────────────────────────");

    let mut lcd = tokio::select! {
        _ = station::run_logger(station, interval, outputs) => None,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            tracing::info!("[SHUTDOWN] Weather station stopped by user");
            // the loop owned the panel; reopen it for the goodbye message
            config.lcd.enabled.then(|| LcdPanel::new(lcd::select(&config.lcd, mock), &config.lcd))
        }
    };

    if let Some(panel) = lcd.as_mut() {
        panel.show_message("Weather Station\nShutdown");
    }
    Ok(())
}
