//! ==============================================================================
//! dashboard - live view refresh (poller + fetcher/renderer)
//! ==============================================================================
//!
//! purpose:
//!     keeps the "current conditions" view up to date by periodically pulling
//!     `/api/current` and writing the six display fields into the page.
//!
//! relationships:
//!     - page.rs:   Page trait, selectors, MemoryPage
//!     - layout.rs: which selector each field is written to
//!     - fetch.rs:  ReadingSource trait + reqwest-backed HttpSource
//!     - render.rs: the fixed-order write of one reading
//!     - poller.rs: the timer and its handle
//!     - used by: src/bin/watch.rs (terminal dashboard)
//!
//! the browser dashboard runs the same contract as an inline script, see
//! templates.rs.
//!
//! ==============================================================================

pub mod fetch;
pub mod layout;
pub mod page;
pub mod poller;
pub mod render;

pub use fetch::{HttpSource, ReadingSource};
pub use layout::PageLayout;
pub use page::{Element, MemoryPage, NodeId, Page, Selector};
pub use poller::{Poller, PollerHandle};

use crate::error::FetchError;

use tokio::sync::Mutex;

/// where failed cycles are reported; never shown on the page
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, error: &FetchError);
}

/// reports through `tracing` at error level
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, error: &FetchError) {
        tracing::error!(code = error.error_code(), "[DASHBOARD] Error fetching current readings: {}", error);
    }
}

/// run a single fetch-parse-render cycle outside any timer
///
/// returns whether the page was updated. on failure exactly one diagnostic is
/// reported and the page is left as it was.
pub async fn refresh_once<S, P>(source: &S, page: &Mutex<P>, layout: &PageLayout, sink: &dyn DiagnosticSink) -> bool
where
    S: ReadingSource,
    P: Page,
{
    match source.fetch().await {
        Ok(reading) => {
            render::apply(&mut *page.lock().await, layout, &reading);
            true
        }
        Err(e) => {
            sink.report(&e);
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::domain::{CurrentReading, DisplayValue};

    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub fn reading(timestamp: &str, temperature: &str) -> CurrentReading {
        CurrentReading {
            timestamp: Some(DisplayValue::from(timestamp)),
            temperature_dht: Some(DisplayValue::from(temperature)),
            temperature_bmp: Some(DisplayValue::from(temperature)),
            humidity: Some(DisplayValue::from("45")),
            pressure: Some(DisplayValue::from("1013")),
            altitude: Some(DisplayValue::from("120")),
        }
    }

    #[derive(Clone, Default)]
    pub struct CallCount(Arc<AtomicUsize>);

    impl CallCount {
        pub fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    type Scripted = (Duration, Result<CurrentReading, FetchError>);

    /// replays scripted results in order, each after its delay
    #[derive(Default)]
    pub struct StubSource {
        script: std::sync::Mutex<VecDeque<Scripted>>,
        calls: CallCount,
    }

    impl StubSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> CallCount {
            self.calls.clone()
        }

        pub fn push_ok(&self, delay: Duration, reading: CurrentReading) {
            self.script.lock().unwrap().push_back((delay, Ok(reading)));
        }

        pub fn push_transport_error(&self, delay: Duration) {
            let error = FetchError::Transport {
                url: "stub".to_string(),
                source: Box::new(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused")),
            };
            self.script.lock().unwrap().push_back((delay, Err(error)));
        }

        pub fn push_err(&self, delay: Duration, error: FetchError) {
            self.script.lock().unwrap().push_back((delay, Err(error)));
        }
    }

    impl ReadingSource for StubSource {
        async fn fetch(&self) -> Result<CurrentReading, FetchError> {
            self.calls.0.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            let (delay, result) = next.unwrap_or_else(|| {
                let error = FetchError::Status { url: "stub".to_string(), status: 503 };
                (Duration::ZERO, Err(error))
            });
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }

    #[derive(Default)]
    pub struct RecordingSink {
        entries: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingSink {
        pub fn count(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn report(&self, error: &FetchError) {
            self.entries.lock().unwrap().push(error.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::dashboard::fetch::parse_reading;

    use std::time::Duration;

    #[tokio::test]
    async fn successful_cycle_writes_every_field() {
        let source = StubSource::new();
        source.push_ok(Duration::ZERO, reading("2024-01-01 10:00:00", "21.5"));
        let layout = PageLayout::default();
        let page = Mutex::new(MemoryPage::dashboard(&layout));
        let sink = RecordingSink::default();

        assert!(refresh_once(&source, &page, &layout, &sink).await);

        let page = page.lock().await;
        assert_eq!(page.text_of(&layout.timestamp), Some("Last updated: 2024-01-01 10:00:00"));
        assert_eq!(page.text_of(&layout.altitude), Some("120"));
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn network_failure_touches_nothing_and_reports_once() {
        let source = StubSource::new();
        source.push_transport_error(Duration::ZERO);
        let layout = PageLayout::default();
        let page = Mutex::new(MemoryPage::dashboard(&layout));
        let before = page.lock().await.clone();
        let sink = RecordingSink::default();

        assert!(!refresh_once(&source, &page, &layout, &sink).await);

        assert_eq!(*page.lock().await, before);
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn malformed_body_touches_nothing_and_reports_once() {
        let source = StubSource::new();
        let decode_error = parse_reading("stub", b"{\"timestamp\": ").unwrap_err();
        source.push_err(Duration::ZERO, decode_error);
        let layout = PageLayout::default();
        let page = Mutex::new(MemoryPage::dashboard(&layout));
        let before = page.lock().await.clone();
        let sink = RecordingSink::default();

        assert!(!refresh_once(&source, &page, &layout, &sink).await);

        assert_eq!(*page.lock().await, before);
        assert_eq!(sink.count(), 1);
    }
}
