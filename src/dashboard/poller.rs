//! ==============================================================================
//! poller.rs - periodic dashboard refresh
//! ==============================================================================
//!
//! purpose:
//!     keeps a dashboard view fresh without reloading it. one timer per view,
//!     fixed period, no jitter, no backoff. every tick runs one refresh cycle:
//!     fetch -> parse -> apply.
//!
//! lifecycle:
//!     `Poller::start` checks for the dashboard marker first. no marker, no timer.
//!     otherwise it returns a `PollerHandle` that owns the timer task; stopping or
//!     dropping the handle cancels the timer and every cycle still in flight.
//!
//! ordering:
//!     cycles do not block each other, so responses can arrive out of order.
//!     each cycle takes a sequence number when it starts and only applies if
//!     nothing newer has been applied yet (last started wins).
//!
//! ==============================================================================

use super::{DiagnosticSink, Page, PageLayout, ReadingSource, TracingSink, render};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

/// browser dashboard refresh period
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(30_000);

pub struct Poller<S, P> {
    source: Arc<S>,
    page: Arc<Mutex<P>>,
    layout: Arc<PageLayout>,
    interval: Duration,
    sink: Arc<dyn DiagnosticSink>,
}

impl<S: ReadingSource, P: Page + 'static> Poller<S, P> {
    pub fn new(source: S, page: Arc<Mutex<P>>, layout: PageLayout) -> Self {
        Self {
            source: Arc::new(source),
            page,
            layout: Arc::new(layout),
            interval: DEFAULT_INTERVAL,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// start refreshing the page; `None` when the page is not a dashboard view
    pub async fn start(self) -> Option<PollerHandle> {
        if !self.page.lock().await.has(&self.layout.marker) {
            tracing::debug!("[DASHBOARD] No {} marker on page, polling not started", self.layout.marker);
            return None;
        }

        let (applied_tx, applied_rx) = watch::channel(0u64);
        let cycle = Arc::new(Cycle {
            source: self.source,
            page: self.page,
            layout: self.layout,
            sink: self.sink,
            applied: applied_tx,
        });
        let period = self.interval;

        tracing::info!("[DASHBOARD] Refreshing every {}ms", period.as_millis());
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut in_flight = JoinSet::new();
            let mut sequence = 0u64;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        sequence += 1;
                        let cycle = cycle.clone();
                        in_flight.spawn(async move { cycle.run(sequence).await });
                    }
                    Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                }
            }
        });

        Some(PollerHandle { task, applied: applied_rx })
    }
}

/// owns a running poller; dropping it stops the polling
pub struct PollerHandle {
    task: JoinHandle<()>,
    applied: watch::Receiver<u64>,
}

impl PollerHandle {
    /// sequence number of the last cycle written to the page (0 before the first)
    pub fn applied(&self) -> watch::Receiver<u64> {
        self.applied.clone()
    }

    pub fn stop(self) {
        // drop does the work
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Cycle<S, P> {
    source: Arc<S>,
    page: Arc<Mutex<P>>,
    layout: Arc<PageLayout>,
    sink: Arc<dyn DiagnosticSink>,
    applied: watch::Sender<u64>,
}

impl<S: ReadingSource, P: Page> Cycle<S, P> {
    async fn run(&self, sequence: u64) {
        let reading = match self.source.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                self.sink.report(&e);
                return;
            }
        };

        let mut page = self.page.lock().await;
        let last = *self.applied.borrow();
        if sequence <= last {
            tracing::debug!("[DASHBOARD] Dropping stale cycle {} (already applied {})", sequence, last);
            return;
        }
        render::apply(&mut *page, &self.layout, &reading);
        self.applied.send_replace(sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::MemoryPage;
    use crate::dashboard::testing::{RecordingSink, StubSource, reading};

    fn dashboard_page() -> Arc<Mutex<MemoryPage>> {
        Arc::new(Mutex::new(MemoryPage::dashboard(&PageLayout::default())))
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_marker_means_no_timer_and_no_fetch() {
        let source = StubSource::new();
        let calls = source.calls();
        let page = Arc::new(Mutex::new(MemoryPage::new()));

        let handle = Poller::new(source, page, PageLayout::default()).start().await;
        assert!(handle.is_none());

        wait(120_000).await;
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_every_thirty_seconds_starting_after_one_period() {
        let source = StubSource::new();
        for i in 0..3 {
            source.push_ok(Duration::ZERO, reading(&format!("t{}", i), "20"));
        }
        let calls = source.calls();
        let page = dashboard_page();

        let handle = Poller::new(source, page.clone(), PageLayout::default()).start().await.unwrap();

        wait(29_900).await;
        assert_eq!(calls.get(), 0);

        wait(200).await;
        assert_eq!(calls.get(), 1);
        assert_eq!(*handle.applied().borrow(), 1);

        wait(60_000).await;
        assert_eq!(calls.get(), 3);
        let layout = PageLayout::default();
        assert_eq!(page.lock().await.text_of(&layout.timestamp), Some("Last updated: t2"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_reported_once_and_polling_continues() {
        let source = StubSource::new();
        source.push_transport_error(Duration::ZERO);
        source.push_ok(Duration::ZERO, reading("2024-01-01 10:00:00", "21.5"));
        let sink = Arc::new(RecordingSink::default());
        let page = dashboard_page();
        let before = page.lock().await.clone();

        let _handle = Poller::new(source, page.clone(), PageLayout::default())
            .diagnostics(sink.clone())
            .start()
            .await
            .unwrap();

        wait(30_100).await;
        assert_eq!(sink.count(), 1);
        assert_eq!(*page.lock().await, before);

        wait(30_000).await;
        assert_eq!(sink.count(), 1);
        let layout = PageLayout::default();
        assert_eq!(page.lock().await.texts_of(&layout.temperatures)[0], "21.5");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_discarded() {
        let source = StubSource::new();
        // cycle 1 starts at 30s and resolves at 75s, after cycle 2 (60s -> 61s)
        source.push_ok(Duration::from_secs(45), reading("old", "10"));
        source.push_ok(Duration::from_secs(1), reading("new", "20"));
        let page = dashboard_page();
        let layout = PageLayout::default();

        let handle = Poller::new(source, page.clone(), layout.clone()).start().await.unwrap();

        wait(62_000).await;
        assert_eq!(page.lock().await.text_of(&layout.timestamp), Some("Last updated: new"));
        assert_eq!(*handle.applied().borrow(), 2);

        wait(15_000).await;
        assert_eq!(page.lock().await.text_of(&layout.timestamp), Some("Last updated: new"));
        assert_eq!(*handle.applied().borrow(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_polling() {
        let source = StubSource::new();
        for _ in 0..5 {
            source.push_ok(Duration::ZERO, reading("t", "20"));
        }
        let calls = source.calls();

        let handle = Poller::new(source, dashboard_page(), PageLayout::default()).start().await.unwrap();
        wait(35_000).await;
        assert_eq!(calls.get(), 1);
        assert!(handle.is_running());

        handle.stop();
        wait(200_000).await;
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_cancels_in_flight_cycle() {
        let source = StubSource::new();
        source.push_ok(Duration::from_secs(10), reading("late", "20"));
        let page = dashboard_page();
        let before = page.lock().await.clone();

        let handle = Poller::new(source, page.clone(), PageLayout::default()).start().await.unwrap();
        wait(31_000).await;
        drop(handle);

        wait(20_000).await;
        assert_eq!(*page.lock().await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interval() {
        let source = StubSource::new();
        for _ in 0..4 {
            source.push_ok(Duration::ZERO, reading("t", "20"));
        }
        let calls = source.calls();

        let _handle = Poller::new(source, dashboard_page(), PageLayout::default())
            .interval(Duration::from_secs(5))
            .start()
            .await
            .unwrap();

        wait(20_500).await;
        assert_eq!(calls.get(), 4);
    }
}
