//! The pending-event deque shared between every `EventMonitor` producer and
//! the single `EventProcessor` consumer, plus the monotone sync-done
//! counter. Both are protected by one mutex (spec §5), mirroring
//! `beamer.chain.EventProcessor`'s single `threading.Lock` guarding
//! `self._events`/`self._num_syncs_done`; `parking_lot::Mutex` replaces
//! `threading.Lock` and `tokio::sync::Notify` replaces `threading.Event`,
//! giving the processor the same "sleep up to 1s, wake up early on new
//! events" behavior without a condvar.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};

use bridge_types::Event;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Two monitors per chain pair (request-manager on source, fill-manager on
/// target); synced once each reaches `2`.
const EXPECTED_MONITORS: u8 = 2;

#[derive(Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
    notify: Notify,
    num_syncs_done: AtomicU8,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by an `EventMonitor`'s `on_new_events` callback.
    pub fn push_batch(&self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        self.events.lock().extend(events);
        self.notify.notify_one();
    }

    /// Called by an `EventMonitor`'s `on_sync_done` callback, once per
    /// monitor.
    pub fn mark_sync_done(&self) {
        let previous = self.num_syncs_done.fetch_add(1, Ordering::SeqCst);
        debug_assert!(previous < EXPECTED_MONITORS, "sync_done called more times than monitors exist");
        self.notify.notify_one();
    }

    pub fn fully_synced(&self) -> bool {
        self.num_syncs_done.load(Ordering::SeqCst) >= EXPECTED_MONITORS
    }

    /// A point-in-time copy of the pending queue, to drive one fixed-point
    /// drain iteration (spec §4.7 step 1).
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().iter().cloned().collect()
    }

    /// Removes the first `drained_count` entries (the ones just snapshotted
    /// and processed) and appends `unprocessed` to the tail — re-queue to
    /// tail, never to head, so one isolated unresolvable event can't starve
    /// the rest of the queue (spec §4.7 rationale).
    pub fn requeue_after_drain(&self, drained_count: usize, unprocessed: Vec<Event>) {
        let mut guard = self.events.lock();
        for _ in 0..drained_count {
            guard.pop_front();
        }
        guard.extend(unprocessed);
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Waits up to `timeout` for either a new batch or a sync-done signal,
    /// so the periodic scan still runs every second even while idle (§5).
    pub async fn wait_for_activity(&self, timeout: std::time::Duration) {
        let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::FixedBytes;
    use bridge_types::events::RequestCreated;
    use bridge_types::{ChainId, RequestId};

    fn sample_event() -> Event {
        Event::RequestCreated(RequestCreated {
            request_id: RequestId(FixedBytes::repeat_byte(1)),
            source_chain_id: 1 as ChainId,
            target_chain_id: 2 as ChainId,
            source_token_address: Default::default(),
            target_token_address: Default::default(),
            source_address: Default::default(),
            target_address: Default::default(),
            amount: Default::default(),
            nonce: Default::default(),
            valid_until: 1_000,
        })
    }

    #[test]
    fn requeue_preserves_order_relative_to_other_unprocessed_events() {
        let queue = EventQueue::new();
        queue.push_batch(vec![sample_event(), sample_event(), sample_event()]);

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.len(), 3);

        // Pretend the middle event couldn't be applied yet.
        queue.requeue_after_drain(3, vec![snapshot[1].clone()]);

        assert_eq!(queue.snapshot().len(), 1);
    }

    #[test]
    fn sync_done_requires_both_monitors() {
        let queue = EventQueue::new();
        assert!(!queue.fully_synced());
        queue.mark_sync_done();
        assert!(!queue.fully_synced());
        queue.mark_sync_done();
        assert!(queue.fully_synced());
    }
}
