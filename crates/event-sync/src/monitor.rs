use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bridge_types::Event;

use crate::fetcher::EventFetcher;
use crate::source::EventSource;

const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Drives one [`EventFetcher`] on a dedicated background worker that loops:
/// fetch, deliver non-empty batches, signal sync-done exactly once after the
/// first *successful* fetch (even if it was empty), then poll forever at a
/// small fixed interval. A failing initial fetch is retried at the same
/// interval rather than treated as an empty success — two monitors agreeing
/// they're synced is what lets `EventProcessor::periodic_scan` start acting,
/// so reporting sync-done on a chain view that was never actually read would
/// hand the processor a partial view to act on.
///
/// Runs on its own OS thread with a single-threaded Tokio runtime, keeping
/// this subsystem off the main runtime entirely. An uncaught panic anywhere
/// in the worker aborts the whole process — the agent must not continue
/// reacting to a chain view it can no longer trust.
pub struct EventMonitor {
    name: &'static str,
    stop: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl EventMonitor {
    pub fn start<S, OnEvents, OnSyncDone>(
        name: &'static str,
        mut fetcher: EventFetcher<S>,
        on_new_events: OnEvents,
        on_sync_done: OnSyncDone,
    ) -> Self
    where
        S: EventSource + 'static,
        OnEvents: Fn(Vec<Event>) + Send + 'static,
        OnSyncDone: Fn() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = stop.clone();

        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                        .expect("failed to build monitor runtime");
                    runtime.block_on(Self::run(name, &mut fetcher, worker_stop, on_new_events, on_sync_done));
                }));

                if result.is_err() {
                    tracing::error!(monitor = name, "event monitor panicked, aborting process");
                    std::process::exit(1);
                }
            })
            .expect("failed to spawn event monitor thread");

        Self { name, stop, handle: Some(handle) }
    }

    async fn run<S, OnEvents, OnSyncDone>(
        name: &'static str,
        fetcher: &mut EventFetcher<S>,
        stop: Arc<AtomicBool>,
        on_new_events: OnEvents,
        on_sync_done: OnSyncDone,
    ) where
        S: EventSource,
        OnEvents: Fn(Vec<Event>),
        OnSyncDone: Fn(),
    {
        tracing::info!(monitor = name, "event monitor started");

        let events = loop {
            match fetcher.fetch().await {
                Ok(events) => break events,
                Err(err) => {
                    tracing::error!(monitor = name, %err, "initial fetch failed, retrying");
                    if stop.load(Ordering::Relaxed) {
                        tracing::info!(monitor = name, "event monitor stopped before initial sync completed");
                        return;
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        };
        if !events.is_empty() {
            on_new_events(events);
        }
        on_sync_done();
        tracing::info!(monitor = name, "initial sync done");

        while !stop.load(Ordering::Relaxed) {
            match fetcher.fetch().await {
                Ok(events) if !events.is_empty() => on_new_events(events),
                Ok(_) => {}
                Err(err) => tracing::error!(monitor = name, %err, "event fetch failed"),
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        tracing::info!(monitor = name, "event monitor stopped");
    }

    /// Cooperative shutdown: flips the stop flag and joins the worker
    /// thread, bounded to `STOP_JOIN_TIMEOUT` so `stop()` never blocks
    /// forever on a wedged worker.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let name = self.name;
            let (tx, rx) = std::sync::mpsc::channel();
            let waiter = std::thread::spawn(move || {
                let _ = tx.send(handle.join());
            });
            if rx.recv_timeout(STOP_JOIN_TIMEOUT).is_err() {
                tracing::warn!(monitor = name, "event monitor did not stop within timeout");
            }
            let _ = waiter.join();
        }
    }
}

impl Drop for EventMonitor {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
