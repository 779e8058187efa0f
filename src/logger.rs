//! ==============================================================================
//! logger.rs - CSV weather log
//! ==============================================================================
//!
//! purpose:
//!     appends one row per logging cycle and reads recent rows back for the
//!     history api and the pressure-trend alert.
//!
//! format:
//!     timestamp,temperature_dht,humidity,temperature_bmp,pressure,altitude
//!     2024-01-01 10:00:00,21.5,45.0,21.3,1013.2,0.8
//!
//!    a failed sensor leaves its cells empty. cells that do not parse as a
//!    number (older logs wrote "None") read back as missing.
//!
//! ==============================================================================

use crate::domain::SensorSnapshot;
use crate::error::LogError;

use chrono::{Duration, NaiveDateTime};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 6] = ["timestamp", "temperature_dht", "humidity", "temperature_bmp", "pressure", "altitude"];

#[derive(Clone, Debug)]
pub struct WeatherLog {
    path: PathBuf,
}

impl WeatherLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// create the file with its header row if it does not exist yet
    ///
    /// returns whether a new file was created.
    pub fn init(&self) -> Result<bool, LogError> {
        if self.has_content() {
            return Ok(false);
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| self.io(source))?;
        }

        let mut writer = csv::Writer::from_path(&self.path).map_err(|source| self.csv(source))?;
        writer.write_record(HEADER).map_err(|source| self.csv(source))?;
        writer.flush().map_err(|source| self.io(source))?;

        tracing::info!("[LOGGER] Created log file: {}", self.path.display());
        Ok(true)
    }

    pub fn append(&self, snapshot: &SensorSnapshot) -> Result<(), LogError> {
        self.init()?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io(source))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(snapshot).map_err(|source| self.csv(source))?;
        writer.flush().map_err(|source| self.io(source))?;
        Ok(())
    }

    /// rows strictly newer than `now - hours`, oldest first
    ///
    /// a missing log is an empty history. unreadable rows are skipped.
    pub fn history(&self, hours: u32, now: NaiveDateTime) -> Result<Vec<SensorSnapshot>, LogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        // a window reaching past the calendar means no cutoff
        let cutoff = now.checked_sub_signed(Duration::hours(i64::from(hours)));
        let mut reader = csv::Reader::from_path(&self.path).map_err(|source| self.csv(source))?;

        let mut rows = Vec::new();
        for (line, row) in reader.deserialize::<SensorSnapshot>().enumerate() {
            match row {
                Ok(snapshot) if cutoff.map_or(true, |c| snapshot.timestamp > c) => rows.push(snapshot),
                Ok(_) => {}
                Err(e) => tracing::debug!("[LOGGER] Skipping unreadable row {}: {}", line + 2, e),
            }
        }
        rows.sort_by_key(|s| s.timestamp);
        Ok(rows)
    }

    fn has_content(&self) -> bool {
        fs::metadata(&self.path).map(|m| m.len() > 0).unwrap_or(false)
    }

    fn io(&self, source: std::io::Error) -> LogError {
        LogError::Io { path: self.path.clone(), source }
    }

    fn csv(&self, source: csv::Error) -> LogError {
        LogError::Csv { path: self.path.clone(), source }
    }
}
