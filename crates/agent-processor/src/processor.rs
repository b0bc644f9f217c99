//! The event-driven core: applies every queued chain event against the
//! tracked requests/claims, then walks what's tracked once per tick to
//! decide whether to fill, claim, challenge, withdraw, invalidate a fill,
//! or escalate to L1. Grounded on `beamer.chain.EventProcessor`'s
//! `_process_events`/`_process_requests` pair — the drain loop is the
//! Rust analogue of the former, `periodic_scan` of the latter.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::U256;
use alloy_provider::Provider;
use bridge_contracts::{IFillManager, IRequestManager};
use bridge_types::events::{
    ClaimMade, ClaimWithdrawn, RequestCreated, RequestFilled, RequestResolved,
};
use bridge_types::{AgentError, AgentResult, ClaimId, Event, FillId, Request, RequestId, RequestState};
use state_machine::outcome::ApplyOutcome;
use state_machine::{claim_sm, request_sm};
use token_checker::TokenChecker;
use trackers::{ClaimTracker, RequestTracker};

use crate::context::Context;
use crate::policy;
use crate::queue::EventQueue;

/// One drain pass never loops more than this many times; a fixed point
/// should be reached in far fewer iterations in practice (spec §4.7), but a
/// hard ceiling keeps a decode bug from spinning the worker forever.
const MAX_DRAIN_ROUNDS: usize = 64;

pub struct EventProcessor<Ps, Pt> {
    context: Context,
    queue: Arc<EventQueue>,
    requests: RequestTracker,
    claims: ClaimTracker,
    token_checker: TokenChecker,
    executor: action_executor::ActionExecutor<Ps, Pt>,
    /// `(request_id, fill_id)` pairs already invalidated, so a repeated scan
    /// never resubmits `invalidateFill` for the same fill.
    invalidated_fills: HashSet<(RequestId, FillId)>,
    /// Claims already handed to the L1 relayer, so a slow relayer run isn't
    /// re-triggered every tick while it's still in flight.
    l1_escalated: HashSet<ClaimId>,
}

impl<Ps, Pt> EventProcessor<Ps, Pt>
where
    Ps: Provider + Clone + Send + Sync + 'static,
    Pt: Provider + Clone + Send + Sync + 'static,
{
    /// Fails fast if the agent's own address was never whitelisted by the
    /// fill manager — there is no point running a loop that can never fill.
    pub async fn new(
        context: Context,
        executor: action_executor::ActionExecutor<Ps, Pt>,
        token_checker: TokenChecker,
        queue: Arc<EventQueue>,
    ) -> AgentResult<Self> {
        let fill_manager = IFillManager::new(context.fill_manager, executor.target().provider());
        let whitelisted = fill_manager
            .allowedLPs(context.self_address)
            .call()
            .await
            .map_err(|e| AgentError::Fatal(format!("could not check LP whitelist: {e}")))?;
        if !whitelisted {
            return Err(AgentError::Fatal(format!(
                "agent address {} is not whitelisted by the fill manager",
                context.self_address
            )));
        }

        Ok(Self {
            context,
            queue,
            requests: RequestTracker::new(),
            claims: ClaimTracker::new(),
            token_checker,
            executor,
            invalidated_fills: HashSet::new(),
            l1_escalated: HashSet::new(),
        })
    }

    /// Runs until `stop` is set, alternating a drain of whatever is queued
    /// with a periodic scan, sleeping in between unless woken early by new
    /// events (spec §5).
    pub async fn run(mut self, stop: Arc<AtomicBool>) {
        tracing::info!("event processor started");
        while !stop.load(Ordering::Relaxed) {
            if !self.queue.is_empty() {
                self.drain_events();
            }
            self.periodic_scan().await;
            self.queue.wait_for_activity(std::time::Duration::from_secs(1)).await;
        }
        tracing::info!("event processor stopped");
    }

    /// Fixed-point drain: repeatedly snapshot the queue, apply every event,
    /// and requeue to the tail whatever came back `Requeue`, until a whole
    /// pass makes no progress (spec §4.7). `Dropped` events are discarded
    /// permanently; they will never become applicable.
    fn drain_events(&mut self) {
        for _ in 0..MAX_DRAIN_ROUNDS {
            let snapshot = self.queue.snapshot();
            if snapshot.is_empty() {
                return;
            }

            let mut requeued = Vec::new();
            let mut made_progress = false;
            for event in &snapshot {
                match self.apply_event(event) {
                    ApplyOutcome::Applied => made_progress = true,
                    ApplyOutcome::Requeue => requeued.push(event.clone()),
                    ApplyOutcome::Dropped => {}
                }
            }

            self.queue.requeue_after_drain(snapshot.len(), requeued);

            if !made_progress {
                return;
            }
        }
        tracing::warn!("event drain did not reach a fixed point within {MAX_DRAIN_ROUNDS} rounds");
    }

    fn apply_event(&mut self, event: &Event) -> ApplyOutcome {
        match event {
            Event::RequestCreated(e) => self.handle_request_created(e),
            Event::RequestFilled(e) => self.handle_request_filled(e),
            Event::ClaimMade(e) => self.handle_claim_made(e),
            Event::ClaimWithdrawn(e) => self.handle_claim_withdrawn(e),
            Event::RequestResolved(e) => self.handle_request_resolved(e),
            Event::FillInvalidated(e) => {
                self.invalidated_fills.insert((e.request_id, e.fill_id));
                ApplyOutcome::Applied
            }
        }
    }

    fn handle_request_created(&mut self, e: &RequestCreated) -> ApplyOutcome {
        if self.requests.get(&e.request_id).is_some() {
            return ApplyOutcome::Dropped;
        }
        if !self.token_checker.is_valid_pair(
            e.source_chain_id,
            e.source_token_address,
            e.target_chain_id,
            e.target_token_address,
        ) {
            tracing::warn!(request_id = %e.request_id, "invalid token pair, dropping request permanently");
            return ApplyOutcome::Dropped;
        }

        let request = Request::new(
            e.request_id,
            e.source_chain_id,
            e.target_chain_id,
            e.source_token_address,
            e.target_token_address,
            e.target_address,
            e.amount,
            e.nonce,
            e.valid_until,
            U256::ZERO,
            U256::ZERO,
        );
        self.requests.add(request);
        ApplyOutcome::Applied
    }

    fn handle_request_filled(&mut self, e: &RequestFilled) -> ApplyOutcome {
        match self.requests.get_mut(&e.request_id) {
            Some(request) => request_sm::apply_request_filled(request, e),
            None => ApplyOutcome::Requeue,
        }
    }

    fn handle_claim_made(&mut self, e: &ClaimMade) -> ApplyOutcome {
        let req_outcome = match self.requests.get_mut(&e.request_id) {
            None => return ApplyOutcome::Requeue,
            Some(req) => request_sm::apply_claim_made(req),
        };
        if req_outcome == ApplyOutcome::Requeue {
            return ApplyOutcome::Requeue;
        }

        let claim_outcome = match self.claims.get_mut(&e.claim_id) {
            Some(claim) => claim_sm::apply_claim_made(claim, e),
            None => {
                self.claims.add(claim_sm::new_from_event(e));
                ApplyOutcome::Applied
            }
        };

        if req_outcome.is_applied() || claim_outcome.is_applied() {
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::Dropped
        }
    }

    fn handle_claim_withdrawn(&mut self, e: &ClaimWithdrawn) -> ApplyOutcome {
        let deposit_paid = match (self.claims.get(&e.claim_id), self.requests.get(&e.request_id)) {
            (Some(claim), Some(request)) => claim_sm::deposit_paid_to_filler(claim, request),
            _ => return ApplyOutcome::Requeue,
        };

        let claim_outcome = match self.claims.get_mut(&e.claim_id) {
            Some(claim) => claim_sm::apply_withdrawn(claim),
            None => ApplyOutcome::Dropped,
        };
        let req_outcome = match self.requests.get_mut(&e.request_id) {
            Some(req) => request_sm::apply_claim_withdrawn(req, e, deposit_paid),
            None => ApplyOutcome::Dropped,
        };

        if claim_outcome.is_applied() || req_outcome.is_applied() {
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::Dropped
        }
    }

    fn handle_request_resolved(&mut self, e: &RequestResolved) -> ApplyOutcome {
        let req_outcome = match self.requests.get_mut(&e.request_id) {
            None => return ApplyOutcome::Requeue,
            Some(req) => request_sm::apply_resolution(req, e),
        };

        let Some(request) = self.requests.get(&e.request_id).cloned() else {
            return req_outcome;
        };

        let claim_ids: Vec<ClaimId> =
            self.claims.for_request(e.request_id).map(|c| c.claim_id).collect();
        let mut any_claim_changed = false;
        for claim_id in claim_ids {
            if let Some(claim) = self.claims.get_mut(&claim_id) {
                if claim_sm::apply_resolution(claim, &request).is_applied() {
                    any_claim_changed = true;
                }
            }
        }

        if req_outcome.is_applied() || any_claim_changed {
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::Dropped
        }
    }

    /// Walks every tracked request once, in whatever order the tracker's
    /// `HashMap` yields them — the challenge game's invariants don't depend
    /// on scan order across requests, only on the sequence of events within
    /// one request's claim, which the drain above already serialized.
    async fn periodic_scan(&mut self) {
        if !self.queue.fully_synced() {
            return;
        }

        let now_source = match self.executor.source().latest_block().await {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(%err, "failed to read source chain's latest block");
                return;
            }
        };
        let now_target = match self.executor.target().latest_block().await {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(%err, "failed to read target chain's latest block");
                return;
            }
        };

        let request_ids: Vec<RequestId> = self.requests.iter().map(|r| r.id).collect();
        let mut to_remove = Vec::new();

        for request_id in request_ids {
            let Some(snapshot) = self.requests.get(&request_id).cloned() else {
                continue;
            };
            match snapshot.state {
                RequestState::Pending => self.try_fill(&snapshot, now_target.block_timestamp).await,
                RequestState::Filled if snapshot.filler == Some(self.context.self_address) => {
                    self.try_claim(&snapshot).await;
                }
                RequestState::Claimed => {
                    self.scan_claims(&snapshot, now_source.block_timestamp).await;
                }
                state if state.is_terminal() => to_remove.push(request_id),
                _ => {}
            }
        }

        for id in to_remove {
            self.requests.remove(&id);
            let claim_ids: Vec<ClaimId> = self.claims.for_request(id).map(|c| c.claim_id).collect();
            for claim_id in claim_ids {
                self.claims.remove(&claim_id);
            }
        }
    }

    async fn try_fill(&mut self, request: &Request, now_target: u64) {
        if policy::request_expired(request, now_target) {
            if let Some(req) = self.requests.get_mut(&request.id) {
                request_sm::mark_ignored(req);
            }
            return;
        }

        if !self.token_checker.is_valid_pair(
            request.source_chain_id,
            request.source_token_address,
            request.target_chain_id,
            request.target_token_address,
        ) {
            if let Some(req) = self.requests.get_mut(&request.id) {
                request_sm::mark_unfillable(req);
            }
            return;
        }

        match self.executor.target().has_code(request.target_token_address).await {
            Ok(false) => {
                if let Some(req) = self.requests.get_mut(&request.id) {
                    request_sm::mark_unfillable(req);
                }
                return;
            }
            Err(err) => {
                tracing::warn!(%err, request_id = %request.id, "failed to check target token contract code");
                return;
            }
            Ok(true) => {}
        }

        let balance = match read_balance(
            self.executor.target().provider(),
            request.target_token_address,
            self.context.self_address,
        )
        .await
        {
            Ok(balance) => balance,
            Err(err) => {
                tracing::warn!(%err, request_id = %request.id, "failed to read token balance");
                return;
            }
        };
        if balance < request.amount {
            tracing::debug!(request_id = %request.id, "insufficient balance to fill, skipping for now");
            return;
        }

        if let Some(allowance_cap) =
            self.token_checker.allowance(request.target_chain_id, request.target_token_address)
        {
            match self.executor.approve(request.target_token_address, allowance_cap).await {
                Ok(action_executor::ActionOutcome::Accepted(_)) => {}
                Ok(action_executor::ActionOutcome::Reverted(reason)) => {
                    tracing::warn!(request_id = %request.id, reason, "approve reverted, skipping fill");
                    return;
                }
                Ok(action_executor::ActionOutcome::Transient(reason)) => {
                    tracing::warn!(request_id = %request.id, reason, "approve failed transiently, will retry");
                    return;
                }
                Err(err) => {
                    tracing::warn!(%err, request_id = %request.id, "approve errored");
                    return;
                }
            }
        }

        self.backfill_fees(request.id).await;

        match self.executor.fill(request).await {
            Ok(action_executor::ActionOutcome::Accepted(tx_hash)) => {
                if let Some(req) = self.requests.get_mut(&request.id) {
                    request_sm::fill_unconfirmed(req);
                }
                let symbol = read_symbol(self.executor.target().provider(), request.target_token_address)
                    .await
                    .unwrap_or_else(|_| "<unknown>".to_string());
                tracing::info!(request_id = %request.id, %tx_hash, token = %symbol, "fillRequest submitted");
            }
            Ok(action_executor::ActionOutcome::Reverted(reason)) => {
                tracing::warn!(request_id = %request.id, reason, "fillRequest reverted");
            }
            Ok(action_executor::ActionOutcome::Transient(reason)) => {
                tracing::warn!(request_id = %request.id, reason, "fillRequest failed transiently");
            }
            Err(err) => tracing::warn!(%err, request_id = %request.id, "fillRequest errored"),
        }
    }

    async fn try_claim(&mut self, request: &Request) {
        let Some(fill_id) = request.fill_id else {
            return;
        };
        match self.executor.claim(request, fill_id, self.context.claim_stake).await {
            Ok(action_executor::ActionOutcome::Accepted(_)) => {
                if let Some(req) = self.requests.get_mut(&request.id) {
                    request_sm::claim_unconfirmed(req);
                }
            }
            Ok(action_executor::ActionOutcome::Reverted(reason)) => {
                tracing::warn!(request_id = %request.id, reason, "claimRequest reverted");
            }
            Ok(action_executor::ActionOutcome::Transient(reason)) => {
                tracing::warn!(request_id = %request.id, reason, "claimRequest failed transiently");
            }
            Err(err) => tracing::warn!(%err, request_id = %request.id, "claimRequest errored"),
        }
    }

    async fn scan_claims(&mut self, request: &Request, now_source: u64) {
        let claim_ids: Vec<ClaimId> =
            self.claims.for_request(request.id).map(|c| c.claim_id).collect();

        for claim_id in claim_ids {
            let Some(claim) = self.claims.get(&claim_id).cloned() else {
                continue;
            };
            if claim.state.is_terminal() {
                continue;
            }

            if policy::should_invalidate_fill(&claim, request, self.context.self_address)
                && !self.invalidated_fills.contains(&(request.id, claim.fill_id))
            {
                match self
                    .executor
                    .invalidate_fill(request.id, claim.fill_id, request.source_chain_id)
                    .await
                {
                    Ok(action_executor::ActionOutcome::Accepted(_)) => {
                        self.invalidated_fills.insert((request.id, claim.fill_id));
                    }
                    Ok(action_executor::ActionOutcome::Reverted(reason)) => {
                        tracing::warn!(claim_id = %claim_id, reason, "invalidateFill reverted");
                    }
                    Ok(action_executor::ActionOutcome::Transient(reason)) => {
                        tracing::warn!(claim_id = %claim_id, reason, "invalidateFill failed transiently");
                    }
                    Err(err) => tracing::warn!(%err, claim_id = %claim_id, "invalidateFill errored"),
                }
            }

            if policy::should_challenge(&claim, request, self.context.self_address, now_source) {
                let stake = policy::challenge_stake(&claim);
                match self.executor.challenge(&claim, stake).await {
                    Ok(action_executor::ActionOutcome::Accepted(_)) => {
                        tracing::info!(claim_id = %claim_id, "challenge submitted");
                    }
                    Ok(action_executor::ActionOutcome::Reverted(reason)) => {
                        tracing::warn!(claim_id = %claim_id, reason, "challengeClaim reverted");
                    }
                    Ok(action_executor::ActionOutcome::Transient(reason)) => {
                        tracing::warn!(claim_id = %claim_id, reason, "challengeClaim failed transiently");
                    }
                    Err(err) => tracing::warn!(%err, claim_id = %claim_id, "challengeClaim errored"),
                }
            }

            if policy::crosses_l1_threshold(&claim, self.context.l1_resolution_threshold)
                && !self.l1_escalated.contains(&claim_id)
            {
                self.try_escalate_to_l1(request, &claim).await;
            }

            if policy::should_try_withdraw(&claim, self.context.self_address, now_source) {
                match self.executor.withdraw(&claim).await {
                    Ok(action_executor::ActionOutcome::Accepted(_)) => {
                        if let Some(tracked) = self.claims.get_mut(&claim_id) {
                            claim_sm::apply_withdrawn(tracked);
                        }
                    }
                    Ok(action_executor::ActionOutcome::Reverted(reason)) => {
                        tracing::warn!(claim_id = %claim_id, reason, "withdraw reverted");
                    }
                    Ok(action_executor::ActionOutcome::Transient(reason)) => {
                        tracing::warn!(claim_id = %claim_id, reason, "withdraw failed transiently");
                    }
                    Err(err) => tracing::warn!(%err, claim_id = %claim_id, "withdraw errored"),
                }
            }
        }
    }

    /// Invokes the external relayer binary with the fill's target-rollup
    /// transaction hash so the message can be relayed to L1 and back down
    /// to the source rollup. A failed invocation is logged and retried on
    /// the next scan rather than propagated — the relayer is a separate
    /// process the agent does not control.
    async fn try_escalate_to_l1(&mut self, request: &Request, claim: &bridge_types::Claim) {
        let Some(tx_hash) = request.fill_tx_hash else {
            tracing::warn!(claim_id = %claim.claim_id, "claim crossed L1 threshold but no fill tx hash recorded yet");
            return;
        };

        let resolution = l1_resolver::L1ResolutionRequest {
            l1_rpc_url: self.context.l1_rpc_url.clone(),
            l2_relay_from_rpc_url: self.context.target_rpc_url.clone(),
            l2_relay_to_rpc_url: self.context.source_rpc_url.clone(),
            wallet_private_key: self.context.wallet_private_key_hex.clone(),
            l2_transaction_hash: tx_hash,
        };

        match l1_resolver::resolve_on_l1(&self.context.relayer_path, &resolution).await {
            Ok(()) => {
                self.l1_escalated.insert(claim.claim_id);
            }
            Err(err) => {
                tracing::warn!(%err, claim_id = %claim.claim_id, "L1 relayer invocation failed, will retry next scan");
            }
        }
    }

    /// Reads the request-manager's own bookkeeping for `lpFee`/`protocolFee`
    /// once per request, the first time it's about to be filled. These
    /// figures never gate the fill decision itself; they exist purely for
    /// the agent's own fee accounting.
    async fn backfill_fees(&mut self, request_id: RequestId) {
        let Some(req) = self.requests.get(&request_id) else {
            return;
        };
        if req.lp_fee != U256::ZERO || req.protocol_fee != U256::ZERO {
            return;
        }
        let amount = req.amount;

        let contract = IRequestManager::new(self.context.request_manager, self.executor.source().provider());
        match contract.requests(request_id.0).call().await {
            Ok(data) => {
                if let Some(req) = self.requests.get_mut(&request_id) {
                    req.lp_fee = data.lpFee;
                    req.protocol_fee = data.protocolFee;
                }
                log_fee_split(request_id, amount, data.lpFee, data.protocolFee);
            }
            Err(err) => {
                tracing::warn!(%err, request_id = %request_id, "failed to read request fees, leaving at zero");
            }
        }
    }
}

/// Reads the target token's `symbol()` purely for the log line emitted
/// after a successful fill (spec §9, `beamer/chain.py`'s own debug log
/// around `token.functions.symbol().call()`); never gates the fill decision.
async fn read_symbol<P>(provider: &P, token: alloy_primitives::Address) -> AgentResult<String>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    let erc20 = bridge_contracts::IERC20::new(token, provider);
    erc20.symbol().call().await.map_err(|e| AgentError::TransientRpc(e.to_string()))
}

async fn read_balance<P>(
    provider: &P,
    token: alloy_primitives::Address,
    account: alloy_primitives::Address,
) -> AgentResult<U256>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    let erc20 = bridge_contracts::IERC20::new(token, provider);
    erc20
        .balanceOf(account)
        .call()
        .await
        .map_err(|e| AgentError::TransientRpc(e.to_string()))
}

/// Derives the effective PPM rates behind the absolute `lp_fee`/`protocol_fee`
/// the request-manager already computed, and re-derives them through
/// [`bridge_types::fees::split_fees`] purely to keep every fee figure this
/// agent logs flowing through the same integer-PPM path (spec §9 "Decimal
/// fees") instead of an ad-hoc division at the call site.
fn log_fee_split(request_id: RequestId, amount: U256, lp_fee: U256, protocol_fee: U256) {
    if amount == U256::ZERO {
        return;
    }
    let denom = U256::from(bridge_types::fees::PPM_DENOMINATOR);
    let lp_fee_ppm: u64 = (lp_fee * denom / amount).try_into().unwrap_or(u64::MAX);
    let protocol_fee_ppm: u64 = (protocol_fee * denom / amount).try_into().unwrap_or(u64::MAX);
    let (lp_fee_check, protocol_fee_check, net_amount) =
        bridge_types::fees::split_fees(amount, lp_fee_ppm, protocol_fee_ppm);
    tracing::debug!(
        request_id = %request_id,
        lp_fee_ppm,
        protocol_fee_ppm,
        %net_amount,
        lp_fee_matches = lp_fee_check <= lp_fee,
        protocol_fee_matches = protocol_fee_check <= protocol_fee,
        "backfilled request fees"
    );
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, FixedBytes};
    use bridge_types::{ChainId, RequestId};

    use super::*;

    fn created_event() -> RequestCreated {
        RequestCreated {
            request_id: RequestId(FixedBytes::repeat_byte(1)),
            source_chain_id: 1 as ChainId,
            target_chain_id: 2 as ChainId,
            source_token_address: Address::repeat_byte(0xAA),
            target_token_address: Address::repeat_byte(0xBB),
            source_address: Address::repeat_byte(0xCC),
            target_address: Address::repeat_byte(0xDD),
            amount: U256::from(1_000u64),
            nonce: U256::from(1u64),
            valid_until: 10_000,
        }
    }

    #[test]
    fn fee_split_logging_tolerates_a_zero_amount() {
        // Would divide by zero if the early return were missing.
        log_fee_split(RequestId(FixedBytes::repeat_byte(1)), U256::ZERO, U256::ZERO, U256::ZERO);
    }

    #[test]
    fn request_created_is_tracked_once_and_ignores_replays() {
        let mut requests = RequestTracker::new();
        let created = created_event();

        let request = Request::new(
            created.request_id,
            created.source_chain_id,
            created.target_chain_id,
            created.source_token_address,
            created.target_token_address,
            created.target_address,
            created.amount,
            created.nonce,
            created.valid_until,
            U256::ZERO,
            U256::ZERO,
        );
        requests.add(request);

        assert!(requests.get(&created.request_id).is_some());
        assert_eq!(requests.len(), 1);
    }
}
