//! ==============================================================================
//! adafruit.rs - hardware sensors through the adafruit python drivers
//! ==============================================================================
//!
//! purpose:
//!     reads the REAL DHT22 (gpio) and BMP280 (i2c) on a raspberry pi.
//!
//! why subprocess to python?:
//!     dht22 sensors require precise bit-banging timing (~microseconds).
//!     pure rust in userspace is unreliable due to lack of real-time guarantees.
//!     adafruit_dht handles this correctly with retries and timing compensation,
//!     and adafruit_bmp280 applies the chip's factory compensation for us.
//!
//! each read is one short-lived `python3 -c` process printing a json object.
//!
//! ==============================================================================

use super::{BmpSample, DhtSample, SensorProvider};
use crate::config::SensorsConfig;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::process::Command;
use std::time::Duration;

pub struct AdafruitSensors {
    dht_pin: u8,
    bmp_address: u8,
    sea_level_pressure: f32,
}

impl AdafruitSensors {
    pub fn new(config: &SensorsConfig) -> Self {
        Self {
            dht_pin: config.dht22_pin,
            bmp_address: config.bmp280_address,
            sea_level_pressure: config.sea_level_pressure,
        }
    }
}

/// the bmp280 answers on one of two addresses depending on the SDO pin
pub fn alternate_bmp280_address(address: u8) -> u8 {
    if address == 0x76 { 0x77 } else { 0x76 }
}

impl SensorProvider for AdafruitSensors {
    fn name(&self) -> &'static str {
        "adafruit"
    }

    fn read_dht22(&mut self) -> Result<DhtSample> {
        let script = format!(
            r#"
import sys
try:
    import adafruit_dht
    import board
    import json

    # create dht22 sensor on specified pin
    dht = adafruit_dht.DHT22(board.D{}, use_pulseio=False)

    try:
        t, h = dht.temperature, dht.humidity
        if t is not None and h is not None:
            print(json.dumps({{"t": t, "h": h}}))
        else:
            print("null")
    finally:
        dht.exit()
except Exception as e:
    # Print ONLY the error message to stderr (no traceback with paths)
    print(str(e), file=sys.stderr)
    sys.exit(1)
"#,
            self.dht_pin
        );

        parse_dht_output(&run_python(&script, &[])?)
    }

    fn read_bmp280(&mut self) -> Result<BmpSample> {
        let script = format!(
            r#"
import sys
try:
    import adafruit_bmp280
    import board
    import busio
    import json

    i2c = busio.I2C(board.SCL, board.SDA)
    sensor = None
    for address in ({primary}, {alternate}):
        try:
            sensor = adafruit_bmp280.Adafruit_BMP280_I2C(i2c, address=address)
            break
        except ValueError:
            continue

    if sensor is None:
        print("BMP280 not found at 0x{primary:02x} or 0x{alternate:02x}", file=sys.stderr)
        sys.exit(1)

    sensor.sea_level_pressure = {sea_level}
    print(json.dumps({{"t": sensor.temperature, "p": sensor.pressure, "a": sensor.altitude}}))
except Exception as e:
    print(str(e), file=sys.stderr)
    sys.exit(1)
"#,
            primary = self.bmp_address,
            alternate = alternate_bmp280_address(self.bmp_address),
            sea_level = self.sea_level_pressure,
        );

        parse_bmp_output(&run_python(&script, &[])?)
    }

    // the dht22 cannot be sampled faster than every 2 seconds
    fn dht22_interval(&self) -> Duration {
        Duration::from_secs(2)
    }

    fn bmp280_interval(&self) -> Duration {
        Duration::from_secs(1)
    }
}

/// run `python3 -c script args..`; stdout on success, stderr as the error
pub(crate) fn run_python(script: &str, args: &[&str]) -> Result<String> {
    let output = Command::new("python3")
        .arg("-c")
        .arg(script)
        .args(args)
        .output()
        .context("Failed to run python3")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("Python error: {}", stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[derive(Deserialize)]
struct DhtOutput {
    t: f32,
    h: f32,
}

#[derive(Deserialize)]
struct BmpOutput {
    t: f32,
    p: f32,
    a: f32,
}

fn parse_dht_output(stdout: &str) -> Result<DhtSample> {
    if stdout == "null" || stdout.is_empty() {
        return Err(anyhow!("Sensor returned null"));
    }
    let parsed: DhtOutput = serde_json::from_str(stdout)
        .map_err(|e| anyhow!("JSON parse error: {} (got: {})", e, stdout))?;
    Ok(DhtSample { temperature: parsed.t, humidity: parsed.h })
}

fn parse_bmp_output(stdout: &str) -> Result<BmpSample> {
    let parsed: BmpOutput = serde_json::from_str(stdout)
        .map_err(|e| anyhow!("JSON parse error: {} (got: {})", e, stdout))?;
    Ok(BmpSample { temperature: parsed.t, pressure: parsed.p, altitude: parsed.a })
}
