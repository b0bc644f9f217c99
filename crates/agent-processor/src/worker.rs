//! Runs an [`EventProcessor`](crate::processor::EventProcessor) on its own
//! dedicated OS thread with a single-threaded Tokio runtime, the same shape
//! [`event_sync::EventMonitor`] uses for the two event-fetching workers. An
//! uncaught panic anywhere in the processor aborts the whole process: the
//! agent must never keep acting on requests/claims after its own tracked
//! state may have been left inconsistent.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_provider::Provider;

use crate::processor::EventProcessor;

const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ProcessorHandle {
    stop: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ProcessorHandle {
    pub fn spawn<Ps, Pt>(processor: EventProcessor<Ps, Pt>) -> Self
    where
        Ps: Provider + Clone + Send + Sync + 'static,
        Pt: Provider + Clone + Send + Sync + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = stop.clone();

        let handle = std::thread::Builder::new()
            .name("event-processor".to_string())
            .spawn(move || {
                let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                        .expect("failed to build event processor runtime");
                    runtime.block_on(processor.run(worker_stop));
                }));

                if result.is_err() {
                    tracing::error!("event processor panicked, aborting process");
                    std::process::exit(1);
                }
            })
            .expect("failed to spawn event processor thread");

        Self { stop, handle: Some(handle) }
    }

    /// Cooperative shutdown: flips the stop flag and joins the worker
    /// thread, bounded to [`STOP_JOIN_TIMEOUT`] so `stop()` never blocks
    /// forever on a wedged processor.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let (tx, rx) = std::sync::mpsc::channel();
            let waiter = std::thread::spawn(move || {
                let _ = tx.send(handle.join());
            });
            if rx.recv_timeout(STOP_JOIN_TIMEOUT).is_err() {
                tracing::warn!("event processor did not stop within timeout");
            }
            let _ = waiter.join();
        }
    }
}

impl Drop for ProcessorHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
