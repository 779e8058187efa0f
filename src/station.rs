//! ==============================================================================
//! station.rs - the running weather station
//! ==============================================================================
//!
//! purpose:
//!     ties the sensors to the csv log and to the web api.
//!
//! responsibilities:
//!     - current_reading(): fresh sensor read, formatted for display
//!     - history(): logged rows of the last N hours
//!     - run_logger(): the background logging loop (csv + lcd + alerts)
//!
//! relationships:
//!     - uses: sensors (SensorHub), logger.rs (WeatherLog), lcd.rs, alerts.rs
//!     - used by: server.rs (api handlers), main.rs (logger loop)
//!
//! ==============================================================================

use crate::alerts::WeatherAlerts;
use crate::domain::{CurrentReading, DisplayValue, SensorSnapshot, TIMESTAMP_FORMAT};
use crate::lcd::LcdPanel;
use crate::logger::WeatherLog;
use crate::sensors::SensorHub;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// shown in place of a value the sensors never produced
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone)]
pub struct Station {
    hub: SensorHub,
    log: Arc<WeatherLog>,
}

impl Station {
    pub fn new(hub: SensorHub, log: WeatherLog) -> Self {
        Self { hub, log: Arc::new(log) }
    }

    pub async fn current_reading(&self) -> CurrentReading {
        format_reading(&self.hub.read().await)
    }

    /// logged rows of the last `hours`; errors are logged and read as empty
    pub async fn history(&self, hours: u32) -> Vec<SensorSnapshot> {
        let log = self.log.clone();
        let now = chrono::Local::now().naive_local();
        match tokio::task::spawn_blocking(move || log.history(hours, now)).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                tracing::error!("[LOGGER] Error reading historical data: {}", e);
                Vec::new()
            }
            Err(e) => {
                tracing::error!("[LOGGER] History task failed: {}", e);
                Vec::new()
            }
        }
    }

    /// read the sensors and append one row to the log
    pub async fn log_once(&self) -> Result<SensorSnapshot> {
        let snapshot = self.hub.read().await;
        let log = self.log.clone();
        let row = snapshot.clone();
        tokio::task::spawn_blocking(move || log.append(&row))
            .await
            .context("log task join error")?
            .context("failed to append weather log")?;
        Ok(snapshot)
    }
}

fn display(value: Option<f32>, unit: &str) -> DisplayValue {
    match value {
        Some(v) => DisplayValue::Text(format!("{:.1}{}", v, unit)),
        None => DisplayValue::from(NOT_AVAILABLE),
    }
}

/// display-ready strings; the dashboard writes these verbatim
pub fn format_reading(snapshot: &SensorSnapshot) -> CurrentReading {
    CurrentReading {
        timestamp: Some(DisplayValue::Text(snapshot.timestamp.format(TIMESTAMP_FORMAT).to_string())),
        temperature_dht: Some(display(snapshot.temperature_dht, "°C")),
        temperature_bmp: Some(display(snapshot.temperature_bmp, "°C")),
        humidity: Some(display(snapshot.humidity, "%")),
        pressure: Some(display(snapshot.pressure, "hPa")),
        altitude: Some(display(snapshot.altitude, "m")),
    }
}

/// console summary of one logged reading
pub fn summary_lines(snapshot: &SensorSnapshot) -> [String; 2] {
    let dht = match (snapshot.temperature_dht, snapshot.humidity) {
        (Some(t), Some(h)) => format!("DHT22: {:.1}°C, {:.1}%", t, h),
        _ => "DHT22: Reading failed".to_string(),
    };
    let bmp = match (snapshot.temperature_bmp, snapshot.pressure, snapshot.altitude) {
        (Some(t), Some(p), Some(a)) => format!("BMP280: {:.1}°C, {:.1}hPa, {:.1}m", t, p, a),
        _ => "BMP280: Reading failed or not connected".to_string(),
    };
    [dht, bmp]
}

/// one read of every sensor, for `--check-sensors`; fails when nothing answered
pub async fn check_sensors(hub: &SensorHub) -> Result<[String; 2]> {
    let snapshot = hub.read().await;
    let values = [
        snapshot.temperature_dht,
        snapshot.humidity,
        snapshot.temperature_bmp,
        snapshot.pressure,
        snapshot.altitude,
    ];
    if values.iter().all(Option::is_none) {
        anyhow::bail!("no sensor returned a reading");
    }
    Ok(summary_lines(&snapshot))
}

/// optional outputs driven by the logging loop
#[derive(Default)]
pub struct LoggerOutputs {
    pub lcd: Option<LcdPanel>,
    pub alerts: Option<WeatherAlerts>,
    pub show_sensor_data: bool,
}

/// log every `interval`, starting immediately; runs until cancelled
pub async fn run_logger(station: Station, interval: Duration, mut outputs: LoggerOutputs) {
    tracing::info!("[LOGGER] Logging data every {} seconds", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        log_cycle(&station, &mut outputs).await;
    }
}

async fn log_cycle(station: &Station, outputs: &mut LoggerOutputs) {
    let snapshot = match station.log_once().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!("[LOGGER] {:#}", e);
            return;
        }
    };

    if outputs.show_sensor_data {
        let ts = snapshot.timestamp.format(TIMESTAMP_FORMAT);
        for line in summary_lines(&snapshot) {
            tracing::info!("[{}] {}", ts, line);
        }
    }

    // the panel may drive real hardware; update it off the runtime threads
    if let Some(mut lcd) = outputs.lcd.take() {
        let (temperature, humidity, pressure) = (snapshot.primary_temperature(), snapshot.humidity, snapshot.pressure);
        match tokio::task::spawn_blocking(move || {
            lcd.show_weather(temperature, humidity, pressure);
            lcd
        })
        .await
        {
            Ok(lcd) => outputs.lcd = Some(lcd),
            Err(e) => tracing::error!("[LCD] Display task failed, disabling panel: {}", e),
        }
    }

    if let Some(alerts) = outputs.alerts.as_mut() {
        let last_hour = station.history(1).await;
        alerts.check_and_report(&snapshot, &last_hour).await;
    }
}
