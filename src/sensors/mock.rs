//! mock sensors for development off the pi.
//!
//! each read nudges the previous value by a small random step, clamped to a
//! plausible range, and occasionally fails the way a real DHT22 does.

use super::{BmpSample, DhtSample, SensorProvider};
use crate::config::SensorsConfig;

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const DHT_FAILURE_RATE: f64 = 0.05;
const BMP_FAILURE_RATE: f64 = 0.03;

/// altitude in meters from pressure (international barometric formula)
pub fn altitude_from_pressure(pressure_hpa: f32, sea_level_hpa: f32) -> f32 {
    44330.0 * (1.0 - (pressure_hpa / sea_level_hpa).powf(0.1903))
}

pub struct MockSensors {
    rng: StdRng,
    dht: DhtSample,
    bmp: BmpSample,
    sea_level_pressure: f32,
    dht_failure_rate: f64,
    bmp_failure_rate: f64,
    dht_interval: Duration,
    bmp_interval: Duration,
}

impl MockSensors {
    pub fn new(config: &SensorsConfig) -> Self {
        tracing::info!(
            "[MOCK] DHT22 on pin {}, BMP280 at 0x{:x}",
            config.dht22_pin,
            config.bmp280_address
        );
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// deterministic readings for a given seed
    pub fn seeded(config: &SensorsConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &SensorsConfig, rng: StdRng) -> Self {
        let pressure = config.sea_level_pressure;
        Self {
            rng,
            dht: DhtSample { temperature: 21.0, humidity: 50.0 },
            bmp: BmpSample {
                temperature: 20.0,
                pressure,
                altitude: altitude_from_pressure(pressure, config.sea_level_pressure),
            },
            sea_level_pressure: config.sea_level_pressure,
            dht_failure_rate: DHT_FAILURE_RATE,
            bmp_failure_rate: BMP_FAILURE_RATE,
            dht_interval: Duration::from_secs(2),
            bmp_interval: Duration::from_secs(1),
        }
    }

    pub fn with_failure_rates(mut self, dht: f64, bmp: f64) -> Self {
        self.dht_failure_rate = dht;
        self.bmp_failure_rate = bmp;
        self
    }

    pub fn with_read_intervals(mut self, dht: Duration, bmp: Duration) -> Self {
        self.dht_interval = dht;
        self.bmp_interval = bmp;
        self
    }
}

impl SensorProvider for MockSensors {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn read_dht22(&mut self) -> Result<DhtSample> {
        self.dht.temperature = (self.dht.temperature + self.rng.gen_range(-0.5..=0.5)).clamp(10.0, 40.0);
        self.dht.humidity = (self.dht.humidity + self.rng.gen_range(-2.0..=2.0)).clamp(20.0, 90.0);

        if self.rng.gen_bool(self.dht_failure_rate) {
            bail!("simulated DHT22 read error");
        }
        Ok(self.dht)
    }

    fn read_bmp280(&mut self) -> Result<BmpSample> {
        self.bmp.temperature = (self.bmp.temperature + self.rng.gen_range(-0.3..=0.3)).clamp(10.0, 40.0);
        self.bmp.pressure = (self.bmp.pressure + self.rng.gen_range(-1.0..=1.0)).clamp(950.0, 1050.0);
        self.bmp.altitude = altitude_from_pressure(self.bmp.pressure, self.sea_level_pressure);

        if self.rng.gen_bool(self.bmp_failure_rate) {
            bail!("simulated BMP280 read error");
        }
        Ok(self.bmp)
    }

    fn dht22_interval(&self) -> Duration {
        self.dht_interval
    }

    fn bmp280_interval(&self) -> Duration {
        self.bmp_interval
    }
}
