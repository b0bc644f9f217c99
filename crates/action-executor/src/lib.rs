//! Typed send-and-wait wrappers for every transaction the agent issues
//! against the request-manager, fill-manager, and an ERC-20 allowance.
//!
//! Every call here goes through the same two-step shape `ChainClient`
//! already provides: submit with a bounded retry budget, then poll for a
//! receipt with a bounded timeout. What this crate adds on top is
//! classifying the result into something the event processor can act on
//! without inspecting `alloy` error internals itself.

use std::future::Future;
use std::time::Duration;

use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::Provider;
use bridge_contracts::{IERC20, IFillManager, IRequestManager};
use bridge_types::{AgentError, AgentResult, Claim, ChainId, Request};
use chain_client::ChainClient;

const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one submitted action, already distinguishing "try again
/// later" from "this will never succeed as sent" so the caller doesn't have
/// to pattern-match on [`AgentError`] itself.
#[derive(Debug)]
pub enum ActionOutcome {
    Accepted(TxHash),
    Reverted(String),
    Transient(String),
}

fn classify_send_err(err: impl std::fmt::Display) -> AgentError {
    let message = err.to_string();
    if message.to_lowercase().contains("revert") {
        AgentError::ContractRevert(message)
    } else {
        AgentError::TransientRpc(message)
    }
}

async fn send_and_wait<P, F, Fut>(
    client: &ChainClient<P>,
    submit: F,
    timeout: Duration,
    poll_interval: Duration,
) -> AgentResult<ActionOutcome>
where
    P: Provider + Clone + Send + Sync + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = AgentResult<TxHash>>,
{
    let tx_hash = match client.send_with_retry(submit).await {
        Ok(tx_hash) => tx_hash,
        Err(AgentError::ContractRevert(reason)) => return Ok(ActionOutcome::Reverted(reason)),
        Err(AgentError::TransientRpc(reason)) => return Ok(ActionOutcome::Transient(reason)),
        Err(other) => return Err(other),
    };

    match client.wait_receipt(tx_hash, timeout, poll_interval).await {
        Ok(receipt) => Ok(ActionOutcome::Accepted(receipt.transaction_hash)),
        Err(AgentError::ContractRevert(reason)) => Ok(ActionOutcome::Reverted(reason)),
        Err(AgentError::TransientRpc(reason)) => Ok(ActionOutcome::Transient(reason)),
        Err(other) => Err(other),
    }
}

/// Submits the agent's transactions against one source/target rollup pair.
/// `Ps`/`Pt` are the concrete provider types `chain_client::connect` hands
/// back for each side — almost always different instantiations since they
/// point at different RPC endpoints.
pub struct ActionExecutor<Ps, Pt> {
    source: ChainClient<Ps>,
    target: ChainClient<Pt>,
    request_manager: Address,
    fill_manager: Address,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl<Ps, Pt> ActionExecutor<Ps, Pt>
where
    Ps: Provider + Clone + Send + Sync + 'static,
    Pt: Provider + Clone + Send + Sync + 'static,
{
    pub fn new(
        source: ChainClient<Ps>,
        target: ChainClient<Pt>,
        request_manager: Address,
        fill_manager: Address,
    ) -> Self {
        Self {
            source,
            target,
            request_manager,
            fill_manager,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn source(&self) -> &ChainClient<Ps> {
        &self.source
    }

    pub fn target(&self) -> &ChainClient<Pt> {
        &self.target
    }

    /// Approves the fill-manager to pull `amount` of `token` on the target
    /// rollup, ahead of a fill.
    pub async fn approve(&self, token: Address, amount: U256) -> AgentResult<ActionOutcome> {
        let erc20 = IERC20::new(token, self.target.provider());
        let fill_manager = self.fill_manager;
        send_and_wait(
            &self.target,
            || async {
                erc20
                    .approve(fill_manager, amount)
                    .send()
                    .await
                    .map(|pending| *pending.tx_hash())
                    .map_err(classify_send_err)
            },
            self.wait_timeout,
            self.poll_interval,
        )
        .await
    }

    /// Fills a request on the target rollup.
    pub async fn fill(&self, request: &Request) -> AgentResult<ActionOutcome> {
        let contract = IFillManager::new(self.fill_manager, self.target.provider());
        let request_id = request.id.0;
        let source_chain_id = U256::from(request.source_chain_id);
        let target_token_address = request.target_token_address;
        let target_address = request.target_address;
        let amount = request.amount;

        send_and_wait(
            &self.target,
            || async {
                contract
                    .fillRequest(request_id, source_chain_id, target_token_address, target_address, amount)
                    .send()
                    .await
                    .map(|pending| *pending.tx_hash())
                    .map_err(classify_send_err)
            },
            self.wait_timeout,
            self.poll_interval,
        )
        .await
    }

    /// Submits `invalidateFill` on the target rollup's fill-manager, so a
    /// dishonest fill claim can no longer be backed by this fill id.
    pub async fn invalidate_fill(
        &self,
        request_id: bridge_types::RequestId,
        fill_id: bridge_types::FillId,
        source_chain_id: ChainId,
    ) -> AgentResult<ActionOutcome> {
        let contract = IFillManager::new(self.fill_manager, self.target.provider());
        send_and_wait(
            &self.target,
            || async {
                contract
                    .invalidateFill(request_id.0, fill_id.0, U256::from(source_chain_id))
                    .send()
                    .await
                    .map(|pending| *pending.tx_hash())
                    .map_err(classify_send_err)
            },
            self.wait_timeout,
            self.poll_interval,
        )
        .await
    }

    /// Submits a claim on the source rollup, staking `value` wei.
    pub async fn claim(
        &self,
        request: &Request,
        fill_id: bridge_types::FillId,
        value: U256,
    ) -> AgentResult<ActionOutcome> {
        let contract = IRequestManager::new(self.request_manager, self.source.provider());
        let request_id = request.id.0;
        send_and_wait(
            &self.source,
            || async {
                contract
                    .claimRequest(request_id, fill_id.0)
                    .value(value)
                    .send()
                    .await
                    .map(|pending| *pending.tx_hash())
                    .map_err(classify_send_err)
            },
            self.wait_timeout,
            self.poll_interval,
        )
        .await
    }

    /// Outbids the current leader of a claim's challenge game with `value`
    /// additional wei.
    pub async fn challenge(&self, claim: &Claim, value: U256) -> AgentResult<ActionOutcome> {
        let contract = IRequestManager::new(self.request_manager, self.source.provider());
        let claim_id = U256::from(claim.claim_id.0);
        send_and_wait(
            &self.source,
            || async {
                contract
                    .challengeClaim(claim_id)
                    .value(value)
                    .send()
                    .await
                    .map(|pending| *pending.tx_hash())
                    .map_err(classify_send_err)
            },
            self.wait_timeout,
            self.poll_interval,
        )
        .await
    }

    /// Withdraws a resolved claim's stakes/deposit to the caller's own
    /// account.
    pub async fn withdraw(&self, claim: &Claim) -> AgentResult<ActionOutcome> {
        let contract = IRequestManager::new(self.request_manager, self.source.provider());
        let claim_id = U256::from(claim.claim_id.0);
        send_and_wait(
            &self.source,
            || async {
                contract
                    .withdraw(claim_id)
                    .send()
                    .await
                    .map(|pending| *pending.tx_hash())
                    .map_err(classify_send_err)
            },
            self.wait_timeout,
            self.poll_interval,
        )
        .await
    }

    /// Withdraws a resolved claim on behalf of another account — used to
    /// pay out a challenger who beat a dishonest claimer but never claims
    /// the stake themselves.
    pub async fn withdraw_on_behalf_of(
        &self,
        on_behalf_of: Address,
        claim: &Claim,
    ) -> AgentResult<ActionOutcome> {
        let contract = IRequestManager::new(self.request_manager, self.source.provider());
        let claim_id = U256::from(claim.claim_id.0);
        send_and_wait(
            &self.source,
            || async {
                contract
                    .withdrawOnBehalfOf(on_behalf_of, claim_id)
                    .send()
                    .await
                    .map(|pending| *pending.tx_hash())
                    .map_err(classify_send_err)
            },
            self.wait_timeout,
            self.poll_interval,
        )
        .await
    }
}
