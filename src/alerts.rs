//! ==============================================================================
//! alerts.rs - weather alerts
//! ==============================================================================
//!
//! purpose:
//!     detects threshold crossings and fast pressure changes after each logging
//!     cycle and reports them on the console (tracing at warn level).
//!
//! rules:
//!     - temperature above temp_high / below temp_low (dht22, bmp280 as fallback)
//!     - humidity above humidity_high
//!     - |pressure now - oldest pressure in the last hour| above pressure_change
//!
//!    the same kind of alert is not repeated within cooldown_seconds.
//!    with [alerts.email] configured, every non-empty batch is also mailed
//!    (email.rs); a failed send is logged and the station keeps running.
//!
//! ==============================================================================

use crate::config::AlertsConfig;
use crate::domain::SensorSnapshot;
use crate::email::EmailNotifier;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlertKind {
    HighTemperature,
    LowTemperature,
    HighHumidity,
    PressureChange,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub struct WeatherAlerts {
    config: AlertsConfig,
    cooldown: Duration,
    last_fired: HashMap<AlertKind, Instant>,
    email: Option<EmailNotifier>,
}

impl WeatherAlerts {
    pub fn new(config: AlertsConfig) -> Self {
        let cooldown = Duration::from_secs(config.cooldown_seconds);
        Self { config, cooldown, last_fired: HashMap::new(), email: None }
    }

    pub fn with_email(mut self, notifier: EmailNotifier) -> Self {
        self.email = Some(notifier);
        self
    }

    /// evaluate one reading; `last_hour` is the logged history of the past hour
    pub fn check(&mut self, current: &SensorSnapshot, last_hour: &[SensorSnapshot], now: Instant) -> Vec<Alert> {
        let mut candidates = Vec::new();

        if let Some(temp) = current.primary_temperature() {
            if temp > self.config.temp_high {
                candidates.push(Alert {
                    kind: AlertKind::HighTemperature,
                    message: format!(
                        "High temperature alert: {:.1}°C exceeds threshold of {}°C",
                        temp, self.config.temp_high
                    ),
                });
            } else if temp < self.config.temp_low {
                candidates.push(Alert {
                    kind: AlertKind::LowTemperature,
                    message: format!(
                        "Low temperature alert: {:.1}°C below threshold of {}°C",
                        temp, self.config.temp_low
                    ),
                });
            }
        }

        if let Some(humidity) = current.humidity {
            if humidity > self.config.humidity_high {
                candidates.push(Alert {
                    kind: AlertKind::HighHumidity,
                    message: format!(
                        "High humidity alert: {:.1}% exceeds threshold of {}%",
                        humidity, self.config.humidity_high
                    ),
                });
            }
        }

        if let Some(change) = current.pressure.and_then(|p| pressure_change(p, last_hour)) {
            if change.abs() > self.config.pressure_change {
                let direction = if change > 0.0 { "rising" } else { "falling" };
                candidates.push(Alert {
                    kind: AlertKind::PressureChange,
                    message: format!(
                        "Significant pressure change: {} by {:.1}hPa in the last hour",
                        direction,
                        change.abs()
                    ),
                });
            }
        }

        candidates.retain(|alert| self.cooled_down(alert.kind, now));
        candidates
    }

    /// check, report on the console and mail the batch if configured
    pub async fn check_and_report(&mut self, current: &SensorSnapshot, last_hour: &[SensorSnapshot]) -> Vec<Alert> {
        let alerts = self.check(current, last_hour, Instant::now());
        for alert in &alerts {
            tracing::warn!(kind = ?alert.kind, "[ALERT] {}", alert);
        }

        if let Some(notifier) = self.email.clone().filter(|_| !alerts.is_empty()) {
            let batch = alerts.clone();
            let recipients = notifier.recipients();
            match tokio::task::spawn_blocking(move || notifier.send(&batch)).await {
                Ok(Ok(())) => tracing::info!("[ALERT] Email alert sent to {}", recipients),
                Ok(Err(e)) => tracing::error!("[ALERT] Error sending email alert: {:#}", e),
                Err(e) => tracing::error!("[ALERT] Email task failed: {}", e),
            }
        }
        alerts
    }

    fn cooled_down(&mut self, kind: AlertKind, now: Instant) -> bool {
        match self.last_fired.get(&kind) {
            Some(last) if now.duration_since(*last) <= self.cooldown => false,
            _ => {
                self.last_fired.insert(kind, now);
                true
            }
        }
    }
}

/// current pressure minus the oldest pressure in `last_hour` (oldest first)
pub fn pressure_change(current: f32, last_hour: &[SensorSnapshot]) -> Option<f32> {
    last_hour.iter().find_map(|s| s.pressure).map(|oldest| current - oldest)
}
