use crate::ids::ChainId;

/// `(chain_id, block_number, block_timestamp)` — the latest observed block
/// header for one chain. Time-based predicates (`valid_until`, `termination`)
/// are evaluated against this instead of wall-clock, so that
/// the agent's notion of "now" always matches the chain it is about to send
/// a transaction to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockReference {
    pub chain_id: ChainId,
    pub block_number: u64,
    pub block_timestamp: u64,
}

impl BlockReference {
    pub fn is_at_or_after(&self, unix_seconds: u64) -> bool {
        self.block_timestamp >= unix_seconds
    }
}
