//! ==============================================================================
//! sensors - DHT22 / BMP280 access
//! ==============================================================================
//!
//! purpose:
//!     provides a unified interface for the two weather sensors.
//!     abstracts away the difference between running on a real Raspberry Pi
//!     (adafruit drivers via python subprocess) and a development machine (mocks).
//!
//! relationships:
//!     - mock.rs:     random-walk readings, occasional simulated failures
//!     - adafruit.rs: real hardware through python3 + adafruit libraries
//!     - used by: station.rs (through SensorHub)
//!     - selected by: main.rs (platform.rs decides mock vs hardware)
//!
//! fallback:
//!     a failed read is logged and the hub serves the last valid value for that
//!     sensor instead. `None` only before the first successful read.
//!
//! ==============================================================================

pub mod adafruit;
pub mod mock;

pub use adafruit::AdafruitSensors;
pub use mock::MockSensors;

use crate::config::SensorsConfig;
use crate::domain::SensorSnapshot;

use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// one dht22 sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DhtSample {
    pub temperature: f32,
    pub humidity: f32,
}

/// one bmp280 sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BmpSample {
    pub temperature: f32,
    pub pressure: f32,
    pub altitude: f32,
}

/// blocking access to both sensors
pub trait SensorProvider: Send {
    fn name(&self) -> &'static str;
    fn read_dht22(&mut self) -> Result<DhtSample>;
    fn read_bmp280(&mut self) -> Result<BmpSample>;

    /// minimum spacing between two dht22 reads
    fn dht22_interval(&self) -> Duration {
        Duration::ZERO
    }

    /// minimum spacing between two bmp280 reads
    fn bmp280_interval(&self) -> Duration {
        Duration::ZERO
    }
}

/// pick the provider for this machine
pub fn select(config: &SensorsConfig, mock: bool) -> Box<dyn SensorProvider> {
    if mock {
        tracing::info!("[SENSORS] Using mock sensors for development");
        Box::new(MockSensors::new(config))
    } else {
        tracing::info!(
            "[SENSORS] Using hardware sensors (DHT22 on D{}, BMP280 at 0x{:02x})",
            config.dht22_pin,
            config.bmp280_address
        );
        Box::new(AdafruitSensors::new(config))
    }
}

#[derive(Default)]
struct HubState {
    last_dht: Option<DhtSample>,
    last_bmp: Option<BmpSample>,
    dht_read_at: Option<Instant>,
    bmp_read_at: Option<Instant>,
}

/// shared, clone-able handle to the sensors
///
/// reads are serialized so the per-sensor spacing is respected no matter how
/// many callers (logger loop, api requests) ask at once.
#[derive(Clone)]
pub struct SensorHub {
    provider: Arc<std::sync::Mutex<Box<dyn SensorProvider>>>,
    state: Arc<Mutex<HubState>>,
    dht_interval: Duration,
    bmp_interval: Duration,
}

impl SensorHub {
    pub fn new(provider: Box<dyn SensorProvider>) -> Self {
        let dht_interval = provider.dht22_interval();
        let bmp_interval = provider.bmp280_interval();
        tracing::debug!("[SENSORS] Hub using {} provider", provider.name());
        Self {
            provider: Arc::new(std::sync::Mutex::new(provider)),
            state: Arc::new(Mutex::new(HubState::default())),
            dht_interval,
            bmp_interval,
        }
    }

    /// read both sensors once
    pub async fn read(&self) -> SensorSnapshot {
        let mut state = self.state.lock().await;
        let timestamp = chrono::Local::now().naive_local();

        wait_for_spacing(state.dht_read_at, self.dht_interval).await;
        let dht = self.call(|p| p.read_dht22()).await;
        state.dht_read_at = Some(Instant::now());
        match dht {
            Ok(sample) => state.last_dht = Some(sample),
            Err(e) => tracing::warn!("[DHT22] ⚠ Read error: {:#}", e),
        }

        wait_for_spacing(state.bmp_read_at, self.bmp_interval).await;
        let bmp = self.call(|p| p.read_bmp280()).await;
        state.bmp_read_at = Some(Instant::now());
        match bmp {
            Ok(sample) => state.last_bmp = Some(sample),
            Err(e) => tracing::warn!("[BMP280] ⚠ Read error: {:#}", e),
        }

        SensorSnapshot {
            timestamp,
            temperature_dht: state.last_dht.map(|s| s.temperature),
            humidity: state.last_dht.map(|s| s.humidity),
            temperature_bmp: state.last_bmp.map(|s| s.temperature),
            pressure: state.last_bmp.map(|s| s.pressure),
            altitude: state.last_bmp.map(|s| s.altitude),
        }
    }

    // offload blocking io to dedicated thread
    async fn call<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn SensorProvider) -> Result<T> + Send + 'static,
    {
        let provider = self.provider.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = provider.lock().map_err(|_| anyhow!("sensor provider lock poisoned"))?;
            f(&mut **guard)
        })
        .await
        .context("sensor task join error")?
    }
}

async fn wait_for_spacing(last: Option<Instant>, spacing: Duration) {
    if let Some(last) = last {
        let elapsed = last.elapsed();
        if elapsed < spacing {
            tokio::time::sleep(spacing - elapsed).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// replays scripted results; an empty script fails
    #[derive(Default)]
    pub struct ScriptedSensors {
        pub dht: VecDeque<Result<DhtSample>>,
        pub bmp: VecDeque<Result<BmpSample>>,
    }

    impl ScriptedSensors {
        pub fn fixed(dht: DhtSample, bmp: BmpSample) -> Self {
            let mut sensors = Self::default();
            for _ in 0..8 {
                sensors.dht.push_back(Ok(dht));
                sensors.bmp.push_back(Ok(bmp));
            }
            sensors
        }
    }

    impl SensorProvider for ScriptedSensors {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn read_dht22(&mut self) -> Result<DhtSample> {
            self.dht.pop_front().unwrap_or_else(|| Err(anyhow!("no reading scripted")))
        }

        fn read_bmp280(&mut self) -> Result<BmpSample> {
            self.bmp.pop_front().unwrap_or_else(|| Err(anyhow!("no reading scripted")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedSensors;
    use super::*;

    const DHT: DhtSample = DhtSample { temperature: 21.5, humidity: 45.0 };
    const BMP: BmpSample = BmpSample { temperature: 21.3, pressure: 1013.0, altitude: 2.0 };

    #[tokio::test]
    async fn read_combines_both_sensors() {
        let hub = SensorHub::new(Box::new(ScriptedSensors::fixed(DHT, BMP)));
        let snapshot = hub.read().await;
        assert_eq!(snapshot.temperature_dht, Some(21.5));
        assert_eq!(snapshot.humidity, Some(45.0));
        assert_eq!(snapshot.temperature_bmp, Some(21.3));
        assert_eq!(snapshot.pressure, Some(1013.0));
        assert_eq!(snapshot.altitude, Some(2.0));
    }

    #[tokio::test]
    async fn failed_read_falls_back_to_last_valid() {
        let mut sensors = ScriptedSensors::default();
        sensors.dht.push_back(Ok(DHT));
        sensors.dht.push_back(Err(anyhow!("checksum did not validate")));
        sensors.bmp.push_back(Err(anyhow!("not found")));
        sensors.bmp.push_back(Ok(BMP));
        let hub = SensorHub::new(Box::new(sensors));

        let first = hub.read().await;
        assert_eq!(first.temperature_dht, Some(21.5));
        assert_eq!(first.pressure, None);

        let second = hub.read().await;
        assert_eq!(second.temperature_dht, Some(21.5));
        assert_eq!(second.pressure, Some(1013.0));
    }

    struct SlowDht(u32);

    impl SensorProvider for SlowDht {
        fn name(&self) -> &'static str {
            "slow"
        }
        fn read_dht22(&mut self) -> Result<DhtSample> {
            self.0 += 1;
            Ok(DHT)
        }
        fn read_bmp280(&mut self) -> Result<BmpSample> {
            Ok(BMP)
        }
        fn dht22_interval(&self) -> Duration {
            Duration::from_secs(2)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_reads_respect_spacing() {
        let hub = SensorHub::new(Box::new(SlowDht(0)));
        let start = Instant::now();
        hub.read().await;
        hub.read().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
