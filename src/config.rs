//! ==============================================================================
//! config.rs - Station Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `station.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - SensorsConfig: DHT22 GPIO pin, BMP280 I2C address, sea level pressure.
//!     - LoggingConfig: CSV log location, logging interval, log level.
//!     - WebConfig: Listen address of the dashboard server.
//!     - DashboardConfig: Browser/terminal refresh period and page targets.
//!     - LcdConfig / AlertsConfig: optional extras, both off by default.
//!
//! every section (and every field) has a default, so a partial file is fine.
//!
//! ==============================================================================

use crate::dashboard::PageLayout;

use anyhow::Context;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StationConfig {
    pub sensors: SensorsConfig,
    pub logging: LoggingConfig,
    pub web: WebConfig,
    pub dashboard: DashboardConfig,
    pub lcd: LcdConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorsConfig {
    /// GPIO pin for the DHT22 (BCM numbering)
    pub dht22_pin: u8,
    /// I2C address of the BMP280 (0x76 or 0x77)
    pub bmp280_address: u8,
    /// sea level pressure in hPa, used for altitude
    pub sea_level_pressure: f32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub interval_seconds: u64,
    pub level: String,
    pub show_sensor_data: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub refresh_interval_ms: u64,
    pub endpoint: String,
    pub layout: PageLayout,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LcdConfig {
    pub enabled: bool,
    pub cols: usize,
    pub rows: usize,
    /// HD44780 wiring, BCM numbering (4-bit mode)
    pub rs_pin: u8,
    pub en_pin: u8,
    pub d4_pin: u8,
    pub d5_pin: u8,
    pub d6_pin: u8,
    pub d7_pin: u8,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertsConfig {
    pub enabled: bool,
    /// high temperature threshold in °C
    pub temp_high: f32,
    /// low temperature threshold in °C
    pub temp_low: f32,
    /// high humidity threshold in %
    pub humidity_high: f32,
    /// pressure change threshold in hPa per hour
    pub pressure_change: f32,
    /// minimum seconds between two alerts of the same kind
    pub cooldown_seconds: u64,
    /// mail alerts as well; console only when absent
    pub email: Option<EmailConfig>,
}

/// smtp delivery of alerts (STARTTLS + login)
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub recipients: Vec<String>,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self { dht22_pin: 4, bmp280_address: 0x76, sea_level_pressure: 1013.25 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_file: PathBuf::from("data").join("weather_log.csv"),
            interval_seconds: 300,
            level: "info".to_string(),
            show_sensor_data: true,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5000 }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 30_000,
            endpoint: "/api/current".to_string(),
            layout: PageLayout::default(),
        }
    }
}

impl Default for LcdConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cols: 16,
            rows: 2,
            rs_pin: 27,
            en_pin: 22,
            d4_pin: 25,
            d5_pin: 24,
            d6_pin: 23,
            d7_pin: 18,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            temp_high: 30.0,
            temp_low: 0.0,
            humidity_high: 80.0,
            pressure_change: 3.0,
            cooldown_seconds: 3600,
            email: None,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            sender: String::new(),
            recipients: Vec::new(),
        }
    }
}

impl WebConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

impl StationConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: StationConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// first of the default locations that exists
    pub fn find_file() -> Option<PathBuf> {
        [
            PathBuf::from("config").join("station.toml"),
            PathBuf::from("..").join("config").join("station.toml"),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Load with default fallback
    pub fn load_or_default() -> Self {
        if let Some(path) = Self::find_file() {
            match Self::load(&path) {
                Ok(config) => {
                    tracing::info!("[CONFIG] Loaded from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::warn!("[CONFIG] Failed to load {}: {}", path.display(), e);
                }
            }
        }

        tracing::warn!("[CONFIG] No config file found - using defaults");
        Self::default()
    }

    /// Print configuration summary
    pub fn print_summary(&self, mock_sensors: bool) {
        println!("┌─────────────────────────────────────────┐");
        println!("│          STATION CONFIGURATION          │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Sensors: {}", if mock_sensors { "mock" } else { "hardware" });
        println!("│ DHT22 pin: {}", self.sensors.dht22_pin);
        println!("│ BMP280 address: 0x{:02x}", self.sensors.bmp280_address);
        println!("│ Log file: {}", self.logging.log_file.display());
        println!("│ Log interval: {}s", self.logging.interval_seconds);
        println!("│ Web: http://{}:{}", self.web.host, self.web.port);
        println!("│ LCD: {} | Alerts: {}", on_off(self.lcd.enabled), on_off(self.alerts.enabled));
        if let Some(email) = self.alerts.email.as_ref().filter(|_| self.alerts.enabled) {
            println!("│ Alert mail: {} via {}:{}", email.recipients.join(", "), email.smtp_server, email.smtp_port);
        }
        println!("└─────────────────────────────────────────┘");
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
