use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// wall-clock format used for log rows, api payloads and the dashboard
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// one raw sample from both sensors
///
/// this is also the csv row and the element type of `/api/history/{hours}`.
/// a `None` value means the sensor has never produced a valid reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,

    /// dht22 temperature in celsius
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub temperature_dht: Option<f32>,

    /// dht22 relative humidity (0-100%)
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub humidity: Option<f32>,

    /// bmp280 temperature in celsius
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub temperature_bmp: Option<f32>,

    /// bmp280 pressure in hPa
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub pressure: Option<f32>,

    /// altitude in meters, derived from pressure
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub altitude: Option<f32>,
}

impl SensorSnapshot {
    /// temperature to show when only one value fits: dht22 first, bmp280 as fallback
    pub fn primary_temperature(&self) -> Option<f32> {
        self.temperature_dht.or(self.temperature_bmp)
    }
}

/// a display-ready scalar: either pre-formatted text or a bare json number
///
/// rendered verbatim, no rounding or unit handling happens on the client side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Number(n) => match n.as_f64().filter(|_| n.is_f64()) {
                Some(x) => f.write_str(&browser_number(x)),
                None => write!(f, "{}", n),
            },
            DisplayValue::Text(s) => f.write_str(s),
        }
    }
}

/// a float the way a browser stringifies it: `1013.0` is "1013", exponents
/// only outside [1e-6, 1e21) and always signed
fn browser_number(x: f64) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    let magnitude = x.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return x.to_string();
    }
    let sci = format!("{:e}", x);
    match sci.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => sci,
    }
}

impl From<&str> for DisplayValue {
    fn from(s: &str) -> Self {
        DisplayValue::Text(s.to_string())
    }
}

impl From<String> for DisplayValue {
    fn from(s: String) -> Self {
        DisplayValue::Text(s)
    }
}

/// the snapshot served by `/api/current` and applied by the dashboard each cycle
///
/// fields absent from a payload deserialize to `None` and their targets are skipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentReading {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DisplayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_dht: Option<DisplayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_bmp: Option<DisplayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<DisplayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<DisplayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<DisplayValue>,
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
