//! decides whether this process talks to real sensors.

use std::path::Path;

/// present on raspberry pi os (and other device-tree boards)
pub const DEVICE_TREE_MODEL: &str = "/sys/firmware/devicetree/base/model";

/// set to `true` to force mock sensors
pub const MOCK_ENV_VAR: &str = "USE_MOCK_SENSORS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Platform {
    RaspberryPi { model: String },
    Other,
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(windows) {
            return Platform::Other;
        }
        Self::detect_from(Path::new(DEVICE_TREE_MODEL))
    }

    pub fn detect_from(model_path: &Path) -> Self {
        match std::fs::read_to_string(model_path) {
            Ok(raw) => Platform::RaspberryPi {
                model: raw.trim_end_matches('\0').trim().to_string(),
            },
            Err(_) => Platform::Other,
        }
    }

    pub fn is_raspberry_pi(&self) -> bool {
        matches!(self, Platform::RaspberryPi { .. })
    }
}

pub fn parse_mock_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// mock sensors unless we are on a pi, or when forced by flag or env
pub fn use_mock_sensors(platform: &Platform, forced: bool) -> bool {
    let from_env = std::env::var(MOCK_ENV_VAR).map(|v| parse_mock_flag(&v)).unwrap_or(false);
    forced || from_env || !platform.is_raspberry_pi()
}
