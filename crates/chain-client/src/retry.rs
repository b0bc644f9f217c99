use std::time::Duration;

use bridge_types::AgentError;
use rand::Rng;

/// Default send-retry budget: up to 5 attempts, sleeping
/// 0.5s-3.0s between them. Matches `beamer.agent.util.transact`'s
/// `random.randint(5, 30) / 10.0`.
pub const DEFAULT_SEND_ATTEMPTS: u32 = 5;
const BACKOFF_MIN_MS: u64 = 500;
const BACKOFF_MAX_MS: u64 = 3000;

pub fn jittered_backoff() -> Duration {
    let millis = rand::thread_rng().gen_range(BACKOFF_MIN_MS..=BACKOFF_MAX_MS);
    Duration::from_millis(millis)
}

/// Runs `attempt` up to `attempts` times, retrying only on
/// [`AgentError::TransientRpc`]. A [`AgentError::ContractRevert`] (or any
/// other variant) is never retried — it is surfaced to the caller
/// immediately, since a contract-logic failure will not resolve itself by
/// resubmitting the same call.
pub async fn with_retry<T, F, Fut>(attempts: u32, mut attempt: F) -> Result<T, AgentError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AgentError>>,
{
    let mut remaining = attempts.max(1);
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(AgentError::TransientRpc(reason)) => {
                remaining -= 1;
                if remaining == 0 {
                    tracing::error!(reason, "transact failed, giving up");
                    return Err(AgentError::TransientRpc(format!(
                        "too many failed attempts: {reason}"
                    )));
                }
                tracing::warn!(reason, remaining, "transact failed, retrying");
                tokio::time::sleep(jittered_backoff()).await;
            }
            Err(other) => return Err(other),
        }
    }
}
