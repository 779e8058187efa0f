//! ==============================================================================
//! templates.rs - dashboard and history html
//! ==============================================================================
//!
//! the dashboard page carries the marker element, one element per layout target
//! and an inline script that re-fetches the readings endpoint on a fixed period.
//! element attributes and script selectors are both generated from the same
//! `PageLayout`, so the page and the refresh logic cannot drift apart.
//!
//! ==============================================================================

use crate::config::DashboardConfig;
use crate::dashboard::{PageLayout, Selector};
use crate::dashboard::layout::TIMESTAMP_PREFIX;
use crate::domain::{CurrentReading, DisplayValue, SensorSnapshot, TIMESTAMP_FORMAT};

const STYLE: &str = r#"
    body { font-family: system-ui, sans-serif; margin: 0; padding: 2rem; background: #1a1a2e; color: #eee; }
    h1 { margin-top: 0; }
    a { color: #7fb3ff; }
    .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 1rem; }
    .card { background: #16213e; border-radius: 8px; padding: 1rem; }
    .card h2 { font-size: 0.9rem; color: #888; margin: 0 0 0.5rem; font-weight: normal; }
    .card span { font-size: 1.8rem; }
    .updated { color: #888; margin-top: 1.5rem; }
    table { border-collapse: collapse; width: 100%; }
    th, td { padding: 0.4rem 0.8rem; border-bottom: 1px solid #333; text-align: right; }
    th:first-child, td:first-child { text-align: left; }
"#;

// placeholders are replaced with json string literals
const REFRESH_SCRIPT: &str = r#"
(function () {
    const REFRESH_MS = __REFRESH_MS__;
    const ENDPOINT = __ENDPOINT__;
    const MARKER = __MARKER__;
    const TIMESTAMP = __TIMESTAMP__;
    const TEMPERATURES = __TEMPERATURES__;
    const HUMIDITY = __HUMIDITY__;
    const PRESSURE = __PRESSURE__;
    const ALTITUDE = __ALTITUDE__;
    const PREFIX = __PREFIX__;

    let started = 0;
    let applied = 0;

    function write(selector, value) {
        const el = document.querySelector(selector);
        if (el && value !== undefined) el.textContent = value;
    }

    async function updateReadings() {
        const seq = ++started;
        try {
            const response = await fetch(ENDPOINT);
            if (!response.ok) throw new Error('HTTP ' + response.status);
            const data = await response.json();
            if (seq <= applied) return;
            applied = seq;

            if (data.timestamp !== undefined) write(TIMESTAMP, PREFIX + data.timestamp);
            const temps = document.querySelectorAll(TEMPERATURES);
            if (temps.length >= 2) {
                if (data.temperature_dht !== undefined) temps[0].textContent = data.temperature_dht;
                if (data.temperature_bmp !== undefined) temps[1].textContent = data.temperature_bmp;
            }
            write(HUMIDITY, data.humidity);
            write(PRESSURE, data.pressure);
            write(ALTITUDE, data.altitude);
        } catch (err) {
            console.error('Error fetching current readings:', err);
        }
    }

    document.addEventListener('DOMContentLoaded', function () {
        if (document.querySelector(MARKER)) setInterval(updateReadings, REFRESH_MS);
    });
})();
"#;

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn js_string(s: &str) -> String {
    // a json string is a valid js string literal; `</` must not close the script tag
    serde_json::Value::from(s).to_string().replace("</", "<\\/")
}

fn selector_literal(selector: &Selector) -> String {
    js_string(&selector.to_string())
}

fn page(title: &str, body: &str, script: Option<&str>) -> String {
    let script = script.map(|s| format!("<script>{}</script>", s)).unwrap_or_default();
    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
{body}
{script}
</body>
</html>"#,
        title = html_escape(title),
        style = STYLE,
        body = body,
        script = script,
    )
}

fn card(label: &str, selector: &Selector, value: &str) -> String {
    format!(
        r#"<div class="card"><h2>{}</h2><span {}>{}</span></div>"#,
        html_escape(label),
        selector.html_attribute(),
        html_escape(value)
    )
}

fn text_or_na(value: &Option<DisplayValue>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

pub fn refresh_script(config: &DashboardConfig) -> String {
    let layout = &config.layout;
    REFRESH_SCRIPT
        .replace("__REFRESH_MS__", &config.refresh_interval_ms.to_string())
        .replace("__ENDPOINT__", &js_string(&config.endpoint))
        .replace("__MARKER__", &selector_literal(&layout.marker))
        .replace("__TIMESTAMP__", &selector_literal(&layout.timestamp))
        .replace("__TEMPERATURES__", &selector_literal(&layout.temperatures))
        .replace("__HUMIDITY__", &selector_literal(&layout.humidity))
        .replace("__PRESSURE__", &selector_literal(&layout.pressure))
        .replace("__ALTITUDE__", &selector_literal(&layout.altitude))
        .replace("__PREFIX__", &js_string(TIMESTAMP_PREFIX))
}

/// live dashboard; server-rendered with `reading`, then refreshed in the browser
pub fn dashboard(reading: &CurrentReading, config: &DashboardConfig) -> String {
    let layout: &PageLayout = &config.layout;
    let cards = [
        card("Temperature (DHT22)", &layout.temperatures, &text_or_na(&reading.temperature_dht)),
        card("Temperature (BMP280)", &layout.temperatures, &text_or_na(&reading.temperature_bmp)),
        card("Humidity", &layout.humidity, &text_or_na(&reading.humidity)),
        card("Pressure", &layout.pressure, &text_or_na(&reading.pressure)),
        card("Altitude", &layout.altitude, &text_or_na(&reading.altitude)),
    ]
    .join("\n");

    let body = format!(
        r#"<div {marker}>
<h1>Weather Station</h1>
<div class="cards">
{cards}
</div>
<p class="updated"><span {timestamp}>{prefix}{ts}</span></p>
<p><a href="/history">History</a></p>
</div>"#,
        marker = layout.marker.html_attribute(),
        cards = cards,
        timestamp = layout.timestamp.html_attribute(),
        prefix = TIMESTAMP_PREFIX,
        ts = html_escape(&text_or_na(&reading.timestamp)),
    );

    page("Weather Station", &body, Some(&refresh_script(config)))
}

fn cell(value: Option<f32>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "N/A".to_string())
}

/// static table of logged rows, newest first
pub fn history(rows: &[SensorSnapshot], hours: u32) -> String {
    let body_rows: String = rows
        .iter()
        .rev()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                r.timestamp.format(TIMESTAMP_FORMAT),
                cell(r.temperature_dht),
                cell(r.humidity),
                cell(r.temperature_bmp),
                cell(r.pressure),
                cell(r.altitude),
            )
        })
        .collect();

    let table = if rows.is_empty() {
        "<p>No data logged yet.</p>".to_string()
    } else {
        format!(
            "<table>\n<tr><th>Time</th><th>DHT22 (°C)</th><th>Humidity (%)</th>\
             <th>BMP280 (°C)</th><th>Pressure (hPa)</th><th>Altitude (m)</th></tr>\n{}</table>",
            body_rows
        )
    };

    let body = format!(
        "<h1>Weather History</h1>\n<p>Last {} hours, {} readings. <a href=\"/\">Dashboard</a></p>\n{}",
        hours,
        rows.len(),
        table
    );
    page("Weather History", &body, None)
}
