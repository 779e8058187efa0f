use super::layout::TIMESTAMP_PREFIX;
use super::{Page, PageLayout};
use crate::domain::{CurrentReading, DisplayValue};

/// write one reading into the page
///
/// fields go in a fixed order: timestamp, temperature pair, humidity, pressure,
/// altitude. a missing target or a missing field is skipped; nothing else on the
/// page is touched.
pub fn apply<P: Page + ?Sized>(page: &mut P, layout: &PageLayout, reading: &CurrentReading) {
    if let (Some(node), Some(timestamp)) = (page.select(&layout.timestamp), &reading.timestamp) {
        page.set_text(node, &format!("{}{}", TIMESTAMP_PREFIX, timestamp));
    }

    let temperatures = page.select_all(&layout.temperatures);
    if let &[dht, bmp, ..] = temperatures.as_slice() {
        write(page, dht, &reading.temperature_dht);
        write(page, bmp, &reading.temperature_bmp);
    }

    for (selector, value) in [
        (&layout.humidity, &reading.humidity),
        (&layout.pressure, &reading.pressure),
        (&layout.altitude, &reading.altitude),
    ] {
        if let Some(node) = page.select(selector) {
            write(page, node, value);
        }
    }
}

fn write<P: Page + ?Sized>(page: &mut P, node: super::NodeId, value: &Option<DisplayValue>) {
    if let Some(value) = value {
        page.set_text(node, &value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Element, MemoryPage, Selector};

    fn scenario_reading() -> CurrentReading {
        serde_json::from_str(
            r#"{"timestamp":"2024-01-01 10:00:00","temperature_dht":"21.5","temperature_bmp":"21.3","humidity":"45","pressure":"1013","altitude":"120"}"#,
        )
        .unwrap()
    }

    #[test]
    fn scenario_all_targets_present() {
        let layout = PageLayout::default();
        let mut page = MemoryPage::dashboard(&layout);

        apply(&mut page, &layout, &scenario_reading());

        assert_eq!(page.text_of(&layout.timestamp), Some("Last updated: 2024-01-01 10:00:00"));
        assert_eq!(page.texts_of(&layout.temperatures), vec!["21.5", "21.3"]);
        assert_eq!(page.text_of(&layout.humidity), Some("45"));
        assert_eq!(page.text_of(&layout.pressure), Some("1013"));
        assert_eq!(page.text_of(&layout.altitude), Some("120"));
    }

    #[test]
    fn numeric_values_are_written_verbatim() {
        let layout = PageLayout::default();
        let mut page = MemoryPage::dashboard(&layout);
        let reading: CurrentReading =
            serde_json::from_str(r#"{"timestamp":"t","temperature_dht":21.5,"temperature_bmp":-3,"humidity":45.25}"#)
                .unwrap();

        apply(&mut page, &layout, &reading);

        assert_eq!(page.texts_of(&layout.temperatures), vec!["21.5", "-3"]);
        assert_eq!(page.text_of(&layout.humidity), Some("45.25"));
    }

    #[test]
    fn single_temperature_element_is_left_alone() {
        let layout = PageLayout::default();
        let mut page = MemoryPage::new();
        page.push(Element::matching(&layout.marker, "marker"));
        page.push(Element::matching(&layout.temperatures, "only one").with_text("--"));
        page.push(Element::matching(&layout.humidity, "Humidity").with_text("--"));

        apply(&mut page, &layout, &scenario_reading());

        assert_eq!(page.texts_of(&layout.temperatures), vec!["--"]);
        assert_eq!(page.text_of(&layout.humidity), Some("45"));
    }

    #[test]
    fn absent_targets_do_not_block_other_fields() {
        let layout = PageLayout::default();
        let mut page = MemoryPage::new();
        page.push(Element::matching(&layout.timestamp, ""));
        page.push(Element::matching(&layout.pressure, "Pressure"));

        apply(&mut page, &layout, &scenario_reading());

        assert_eq!(page.text_of(&layout.timestamp), Some("Last updated: 2024-01-01 10:00:00"));
        assert_eq!(page.text_of(&layout.pressure), Some("1013"));
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let layout = PageLayout::default();
        let mut once = MemoryPage::dashboard(&layout);
        apply(&mut once, &layout, &scenario_reading());

        let mut twice = once.clone();
        apply(&mut twice, &layout, &scenario_reading());

        assert_eq!(once, twice);
    }

    #[test]
    fn unrelated_elements_are_untouched() {
        let layout = PageLayout::default();
        let mut page = MemoryPage::dashboard(&layout);
        let footer = page.push(Element::new("footer").with_id("footer").with_text("history link"));

        apply(&mut page, &layout, &scenario_reading());

        assert_eq!(page.text(footer), Some("history link"));
        assert_eq!(page.text_of(&Selector::id("footer")), Some("history link"));
    }

    #[test]
    fn custom_layout_is_honoured() {
        let layout = PageLayout {
            humidity: Selector::id("rh"),
            ..PageLayout::default()
        };
        let mut page = MemoryPage::dashboard(&layout);

        apply(&mut page, &layout, &scenario_reading());

        assert_eq!(page.text_of(&Selector::id("rh")), Some("45"));
    }
}
