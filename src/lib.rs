//! home weather station: dht22 + bmp280 sensors, a csv log, alerts, an optional
//! character lcd and a self-refreshing web dashboard.
//!
//! the binaries (`weather-station`, `weather-watch`) are thin wrappers over
//! these modules.

pub mod alerts;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod email;
pub mod error;
pub mod lcd;
pub mod logger;
pub mod logging;
pub mod platform;
pub mod sensors;
pub mod server;
pub mod station;
pub mod templates;
