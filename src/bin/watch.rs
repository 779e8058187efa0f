//! ==============================================================================
//! watch.rs - terminal dashboard
//! ==============================================================================
//!
//! purpose:
//!     the dashboard view for a terminal. polls a running station's readings
//!     endpoint with the same refresh contract as the browser page and prints
//!     the view after every applied update.
//!
//! usage:
//!     weather-watch --url http://raspberrypi.local:5000
//!     weather-watch --once
//!
//! ==============================================================================

use weather_station::config::StationConfig;
use weather_station::dashboard::{self, HttpSource, MemoryPage, Poller, TracingSink};
use weather_station::logging::init_logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "weather-watch", version, about = "Live weather station readings in the terminal")]
struct Args {
    /// base url of the station's web server
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    url: String,

    /// refresh period (default: dashboard.refresh_interval_ms from station.toml)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// per-request timeout; unset waits as long as the http client does
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// refresh once, print and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging("info");

    let config = StationConfig::load_or_default().dashboard;
    let layout = config.layout.clone();
    let interval = Duration::from_millis(args.interval_ms.unwrap_or(config.refresh_interval_ms).max(1));
    let source = HttpSource::new(&args.url, &config.endpoint, args.timeout_secs.map(Duration::from_secs))?;
    let page = Arc::new(Mutex::new(MemoryPage::dashboard(&layout)));

    if args.once {
        if dashboard::refresh_once(&source, &page, &layout, &TracingSink).await {
            println!("{}", page.lock().await);
        }
        return Ok(());
    }

    tracing::info!("[WATCH] Polling {}", source.url());
    let handle = Poller::new(source, page.clone(), layout)
        .interval(interval)
        .start()
        .await
        .context("dashboard page has no marker element")?;
    let mut applied = handle.applied();

    loop {
        tokio::select! {
            changed = applied.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", page.lock().await);
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                break;
            }
        }
    }

    handle.stop();
    Ok(())
}
