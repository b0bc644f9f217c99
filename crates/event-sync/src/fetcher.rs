use bridge_types::{AgentResult, Event};

use crate::source::EventSource;

/// Lazy, restartable sequence of events for one contract, starting at a
/// known deployment block. Source rollups are assumed to
/// hand back deterministic, non-reorging confirmed ordering, so `from_block`
/// only ever advances — this fetcher never rewinds.
pub struct EventFetcher<S> {
    source: S,
    from_block: u64,
}

impl<S: EventSource> EventFetcher<S> {
    pub fn new(source: S, deployment_block: u64) -> Self {
        Self { source, from_block: deployment_block }
    }

    /// Reads `latest_block`, scans `[from_block, latest_block]` in windows
    /// sized to the chain's range limit, and coalesces the result into one
    /// time-ordered slice. Returns an empty vec (and leaves the cursor in
    /// place) if there's nothing new yet.
    pub async fn fetch(&mut self) -> AgentResult<Vec<Event>> {
        let latest = self.source.latest_block().await?;
        if self.from_block > latest {
            return Ok(Vec::new());
        }

        let max_range = self.source.max_range().max(1);
        let mut events = Vec::new();
        let mut start = self.from_block;
        while start <= latest {
            let end = start.saturating_add(max_range - 1).min(latest);
            let mut batch = self.source.fetch_window(start, end).await?;
            events.append(&mut batch);
            start = end + 1;
        }

        self.from_block = latest + 1;
        Ok(events)
    }

    pub fn from_block(&self) -> u64 {
        self.from_block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct StubSource {
        latest: AtomicU64,
        max_range: u64,
        calls: Mutex<Vec<(u64, u64)>>,
    }

    #[async_trait]
    impl EventSource for StubSource {
        fn max_range(&self) -> u64 {
            self.max_range
        }

        async fn latest_block(&self) -> AgentResult<u64> {
            Ok(self.latest.load(Ordering::SeqCst))
        }

        async fn fetch_window(&self, from_block: u64, to_block: u64) -> AgentResult<Vec<Event>> {
            self.calls.lock().unwrap().push((from_block, to_block));
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn windows_respect_max_range_and_cursor_never_rewinds() {
        let source = StubSource { latest: AtomicU64::new(25), max_range: 10, calls: Mutex::new(Vec::new()) };
        let mut fetcher = EventFetcher::new(source, 0);

        fetcher.fetch().await.unwrap();
        assert_eq!(*fetcher.source.calls.lock().unwrap(), vec![(0, 9), (10, 19), (20, 25)]);
        assert_eq!(fetcher.from_block(), 26);

        // Nothing new: latest hasn't advanced, fetch is a no-op and the
        // cursor does not move backwards.
        let empty = fetcher.fetch().await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(fetcher.from_block(), 26);
    }
}
