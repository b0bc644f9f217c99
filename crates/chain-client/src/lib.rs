//! Typed JSON-RPC facade over one rollup:
//! block reads with an LRU cache, contract call/send plumbing, receipt
//! waiting, and rate-limit-aware retry.

pub mod block_cache;
pub mod client;
pub mod retry;

pub use client::{connect, BlockSelector, ChainClient};
pub use retry::{with_retry, DEFAULT_SEND_ATTEMPTS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_selector_equality() {
        assert_eq!(BlockSelector::Number(1), BlockSelector::Number(1));
        assert_ne!(BlockSelector::Number(1), BlockSelector::Latest);
    }
}
