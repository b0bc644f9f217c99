use thiserror::Error;

/// The error taxonomy shared by every crate that talks to
/// a chain or reacts to chain events. Each variant carries the retry
/// semantics described there in its doc comment, not in code scattered
/// across callers.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Network error, rate limit, or timeout. Retried at a lower layer
    /// (`chain-client`), bounded by a fixed attempt count.
    #[error("transient RPC error: {0}")]
    TransientRpc(String),

    /// The contract refused the call. Never retried automatically; the
    /// periodic scan may attempt an alternative path on the next tick.
    #[error("contract reverted: {0}")]
    ContractRevert(String),

    /// A state-machine transition disallowed by the contract was observed
    /// via an event anyway. Logged and the event is dropped — this must
    /// never panic, since a bad event could be adversarial input.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Misconfiguration, missing relayer binary, non-whitelisted LP address,
    /// corrupted keystore. The process exits non-zero on startup, or aborts
    /// from a worker after a stack dump if discovered later.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl AgentError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentError::TransientRpc(_))
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
