//! ==============================================================================
//! lcd.rs - character display output
//! ==============================================================================
//!
//! purpose:
//!     shows the latest reading on a small character display (16x2 by default):
//!
//!    ```text
//!         T:21.5C H:45.0%
//!         Press: 1013.2hPa
//!    ```
//!
//! relationships:
//!     - used by: station.rs (logger loop, after every logged reading)
//!     - CharacterDisplay is the hardware seam. Hd44780Display drives the real
//!       panel over gpio through adafruit_character_lcd (python subprocess, like
//!       the sensors); ConsoleDisplay is the mock that logs each frame instead.
//!
//! ==============================================================================

use crate::config::LcdConfig;
use crate::sensors::adafruit::run_python;

use anyhow::Result;

pub trait CharacterDisplay: Send {
    fn show(&mut self, lines: &[String]) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// logs every frame; stands in for the panel off hardware
#[derive(Default)]
pub struct ConsoleDisplay;

impl CharacterDisplay for ConsoleDisplay {
    fn show(&mut self, lines: &[String]) -> Result<()> {
        tracing::info!("[LCD] {}", lines.join(" | "));
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        tracing::debug!("[LCD] clear");
        Ok(())
    }
}

/// hd44780 in 4-bit mode on the configured bcm pins
pub struct Hd44780Display {
    rs: u8,
    en: u8,
    data: [u8; 4],
    cols: usize,
    rows: usize,
}

impl Hd44780Display {
    pub fn new(config: &LcdConfig) -> Self {
        Self {
            rs: config.rs_pin,
            en: config.en_pin,
            data: [config.d4_pin, config.d5_pin, config.d6_pin, config.d7_pin],
            cols: config.cols,
            rows: config.rows,
        }
    }

    /// python that opens the panel and runs `action` with it bound to `lcd`
    ///
    /// frame lines arrive as argv so no text is ever spliced into the source.
    pub fn script(&self, action: &str) -> String {
        let [d4, d5, d6, d7] = self.data;
        format!(
            r#"
import sys
try:
    import board
    import digitalio
    import adafruit_character_lcd.character_lcd as characterlcd

    def pin(n):
        return digitalio.DigitalInOut(getattr(board, "D%d" % n))

    lcd = characterlcd.Character_LCD_Mono(
        pin({rs}), pin({en}), pin({d4}), pin({d5}), pin({d6}), pin({d7}), {cols}, {rows})
    {action}
except Exception as e:
    print(str(e), file=sys.stderr)
    sys.exit(1)
"#,
            rs = self.rs,
            en = self.en,
            d4 = d4,
            d5 = d5,
            d6 = d6,
            d7 = d7,
            cols = self.cols,
            rows = self.rows,
            action = action,
        )
    }
}

impl CharacterDisplay for Hd44780Display {
    fn show(&mut self, lines: &[String]) -> Result<()> {
        let script = self.script(r#"lcd.clear(); lcd.message = "\n".join(sys.argv[1:])"#);
        let args: Vec<&str> = lines.iter().map(String::as_str).collect();
        run_python(&script, &args)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        run_python(&self.script("lcd.clear()"), &[])?;
        Ok(())
    }
}

/// pick the panel backend for this machine
pub fn select(config: &LcdConfig, mock: bool) -> Box<dyn CharacterDisplay> {
    if mock {
        tracing::info!("[LCD] Using console display");
        Box::new(ConsoleDisplay)
    } else {
        tracing::info!(
            "[LCD] Using HD44780 {}x{} (RS=D{}, EN=D{})",
            config.cols,
            config.rows,
            config.rs_pin,
            config.en_pin
        );
        Box::new(Hd44780Display::new(config))
    }
}

pub struct LcdPanel {
    display: Box<dyn CharacterDisplay>,
    cols: usize,
    rows: usize,
}

impl LcdPanel {
    pub fn new(display: Box<dyn CharacterDisplay>, config: &LcdConfig) -> Self {
        Self { display, cols: config.cols, rows: config.rows }
    }

    pub fn show_weather(&mut self, temperature: Option<f32>, humidity: Option<f32>, pressure: Option<f32>) {
        let lines = weather_lines(temperature, humidity, pressure);
        self.show(&lines);
    }

    /// free text, truncated to what fits on the panel
    pub fn show_message(&mut self, message: &str) {
        let lines = message_lines(message, self.cols, self.rows);
        self.show(&lines);
    }

    pub fn clear(&mut self) {
        if let Err(e) = self.display.clear() {
            tracing::warn!("[LCD] Error clearing display: {:#}", e);
        }
    }

    fn show(&mut self, lines: &[String]) {
        let fitted: Vec<String> = lines
            .iter()
            .take(self.rows)
            .map(|l| l.chars().take(self.cols).collect())
            .collect();
        if let Err(e) = self.display.show(&fitted) {
            tracing::warn!("[LCD] Error updating display: {:#}", e);
        }
    }
}

pub fn weather_lines(temperature: Option<f32>, humidity: Option<f32>, pressure: Option<f32>) -> [String; 2] {
    let top = match (temperature, humidity) {
        (Some(t), Some(h)) => format!("T:{:.1}C H:{:.1}%", t, h),
        _ => "Temp/Hum: Error".to_string(),
    };
    let bottom = match pressure {
        Some(p) => format!("Press: {:.1}hPa", p),
        None => "Press: Error".to_string(),
    };
    [top, bottom]
}

/// split a message over the rows; explicit newlines start a new row
pub fn message_lines(message: &str, cols: usize, rows: usize) -> Vec<String> {
    let budget = cols * rows;
    let mut lines = Vec::new();
    let mut used = 0;

    for part in message.split('\n') {
        let mut chars = part.chars().peekable();
        loop {
            if lines.len() == rows || used == budget {
                return lines;
            }
            let line: String = chars.by_ref().take(cols.min(budget - used)).collect();
            used += line.chars().count();
            lines.push(line);
            if chars.peek().is_none() {
                break;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn weather_rows() {
        let [top, bottom] = weather_lines(Some(21.54), Some(45.0), Some(1013.24));
        assert_eq!(top, "T:21.5C H:45.0%");
        assert_eq!(bottom, "Press: 1013.2hPa");
    }

    #[test]
    fn weather_rows_with_errors() {
        let [top, bottom] = weather_lines(Some(21.0), None, None);
        assert_eq!(top, "Temp/Hum: Error");
        assert_eq!(bottom, "Press: Error");
    }

    #[test]
    fn message_wraps_and_truncates_to_32_chars() {
        let lines = message_lines("abcdefghijklmnopqrstuvwxyz0123456789", 16, 2);
        assert_eq!(lines, vec!["abcdefghijklmnop", "qrstuvwxyz012345"]);
    }

    #[test]
    fn message_respects_newlines() {
        let lines = message_lines("Weather Station\nStarting...", 16, 2);
        assert_eq!(lines, vec!["Weather Station", "Starting..."]);
    }

    #[derive(Clone, Default)]
    struct Recording(Arc<Mutex<Vec<String>>>);

    impl CharacterDisplay for Recording {
        fn show(&mut self, lines: &[String]) -> Result<()> {
            *self.0.lock().unwrap() = lines.to_vec();
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.0.lock().unwrap().clear();
            Ok(())
        }
    }

    #[test]
    fn panel_fits_lines_to_geometry() {
        let frame = Recording::default();
        let config = LcdConfig { enabled: true, cols: 8, rows: 1, ..LcdConfig::default() };
        let mut panel = LcdPanel::new(Box::new(frame.clone()), &config);

        panel.show_weather(Some(21.0), Some(40.0), Some(1000.0));
        assert_eq!(*frame.0.lock().unwrap(), vec!["T:21.0C ".to_string()]);

        panel.show_message("Weather Station\nShutdown");
        assert_eq!(*frame.0.lock().unwrap(), vec!["Weather ".to_string()]);

        panel.clear();
        assert!(frame.0.lock().unwrap().is_empty());
    }

    #[test]
    fn hd44780_script_uses_configured_wiring() {
        let display = Hd44780Display::new(&LcdConfig::default());
        let script = display.script("lcd.clear()");

        assert!(script.contains("pin(27), pin(22), pin(25), pin(24), pin(23), pin(18), 16, 2)"));
        assert!(script.contains("    lcd.clear()\n"));
        assert!(script.contains("sys.exit(1)"));
    }

    #[test]
    fn hd44780_follows_custom_pins() {
        let config = LcdConfig {
            cols: 20,
            rows: 4,
            rs_pin: 5,
            en_pin: 6,
            d4_pin: 12,
            d5_pin: 13,
            d6_pin: 19,
            d7_pin: 26,
            ..LcdConfig::default()
        };
        let script = Hd44780Display::new(&config).script("pass");
        assert!(script.contains("pin(5), pin(6), pin(12), pin(13), pin(19), pin(26), 20, 4)"));
    }
}
