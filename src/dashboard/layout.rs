use super::Selector;

use serde::Deserialize;

/// literal prefix written before the timestamp
pub const TIMESTAMP_PREFIX: &str = "Last updated: ";

/// where each field of a `CurrentReading` goes on the page
///
/// the temperature selector is positional: its first match receives the dht22
/// value and its second the bmp280 value. every other target is a single element.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    /// marks the live dashboard view; polling only starts when it is present
    pub marker: Selector,
    pub timestamp: Selector,
    pub temperatures: Selector,
    pub humidity: Selector,
    pub pressure: Selector,
    pub altitude: Selector,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            marker: Selector::class("dashboard"),
            timestamp: Selector::id("last-updated"),
            temperatures: Selector::class("temperature-value"),
            humidity: Selector::id("humidity-value"),
            pressure: Selector::id("pressure-value"),
            altitude: Selector::id("altitude-value"),
        }
    }
}
