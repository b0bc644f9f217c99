use bridge_types::events::{ClaimWithdrawn, RequestFilled, RequestResolved};
use bridge_types::{Request, RequestState};

use crate::outcome::ApplyOutcome;

/// The agent has submitted `fillRequest` for this id but the transaction is
/// not yet confirmed. Idempotent: calling this on a request that already
/// left `Pending` is a no-op, since a second fill attempt for the same id
/// never happens once the first is in flight.
pub fn fill_unconfirmed(request: &mut Request) -> ApplyOutcome {
    if request.state != RequestState::Pending {
        return ApplyOutcome::Dropped;
    }
    request.state = RequestState::FilledUnconfirmed;
    ApplyOutcome::Applied
}

/// A confirmed `RequestFilled` log has been observed. Valid from `Pending`
/// too, not only `FilledUnconfirmed` — replaying the full event log from
/// scratch must reach the same terminal state as incremental delivery, and
/// a freshly started processor never sees its own unconfirmed submissions.
pub fn apply_request_filled(request: &mut Request, event: &RequestFilled) -> ApplyOutcome {
    match request.state {
        RequestState::Pending | RequestState::FilledUnconfirmed => {
            request.filler = Some(event.filler);
            request.fill_id = Some(event.fill_id);
            request.fill_tx_hash = Some(event.fill_tx_hash);
            request.state = RequestState::Filled;
            ApplyOutcome::Applied
        }
        RequestState::Filled
            if request.filler == Some(event.filler) && request.fill_id == Some(event.fill_id) =>
        {
            ApplyOutcome::Dropped
        }
        _ => ApplyOutcome::Dropped,
    }
}

/// The agent has submitted `claimRequest` but the transaction is not yet
/// confirmed.
pub fn claim_unconfirmed(request: &mut Request) -> ApplyOutcome {
    if request.state != RequestState::Filled {
        return ApplyOutcome::Dropped;
    }
    request.state = RequestState::ClaimedUnconfirmed;
    ApplyOutcome::Applied
}

/// A confirmed `ClaimMade` log named this request. Any claim — honest or
/// not, ours or a stranger's — moves a filled request into `Claimed`; which
/// claim is winning is tracked separately by the claim state machine.
///
/// If the request hasn't reached `Filled` yet the claim references a fill
/// this processor hasn't observed (the two events live on different
/// rollups and can arrive out of order); requeue until the fill catches up.
pub fn apply_claim_made(request: &mut Request) -> ApplyOutcome {
    match request.state {
        RequestState::Pending | RequestState::FilledUnconfirmed => ApplyOutcome::Requeue,
        RequestState::Filled | RequestState::ClaimedUnconfirmed => {
            request.state = RequestState::Claimed;
            ApplyOutcome::Applied
        }
        RequestState::Claimed => ApplyOutcome::Dropped,
        _ => ApplyOutcome::Dropped,
    }
}

/// A confirmed `ClaimWithdrawn` log for the request's current winning claim.
/// Only transitions the request to `Withdrawn` when the withdrawal actually
/// paid the deposit out to the legitimate filler — a dishonest claimer
/// withdrawing their own stake back leaves the request `Claimed`, still
/// open to a further honest claim.
pub fn apply_claim_withdrawn(
    request: &mut Request,
    _event: &ClaimWithdrawn,
    deposit_paid_to_filler: bool,
) -> ApplyOutcome {
    if request.state != RequestState::Claimed {
        return ApplyOutcome::Dropped;
    }
    if !deposit_paid_to_filler {
        return ApplyOutcome::Dropped;
    }
    request.state = RequestState::Withdrawn;
    ApplyOutcome::Applied
}

/// `valid_until` has passed and the request was never filled; it can be
/// forgotten.
pub fn mark_ignored(request: &mut Request) -> ApplyOutcome {
    if request.state != RequestState::Pending {
        return ApplyOutcome::Dropped;
    }
    request.state = RequestState::Ignored;
    ApplyOutcome::Applied
}

/// Local policy (an unsupported token pair, insufficient liquidity, an
/// expired `valid_until`) decided this request will never be filled by this
/// agent. Unlike `mark_ignored` this is reachable at any point before a fill
/// is observed, not only from `Pending`.
pub fn mark_unfillable(request: &mut Request) -> ApplyOutcome {
    if request.state.is_terminal() {
        return ApplyOutcome::Dropped;
    }
    request.state = RequestState::Unfillable;
    ApplyOutcome::Applied
}

/// A messenger-relayed L1 resolution landed on the source rollup, naming
/// the authoritative filler/fill_id. Reachable from any non-terminal state,
/// overriding whatever the claim game concluded locally.
pub fn apply_resolution(request: &mut Request, event: &RequestResolved) -> ApplyOutcome {
    if request.state.is_terminal() {
        return ApplyOutcome::Dropped;
    }
    request.filler = Some(event.filler);
    request.fill_id = Some(event.fill_id);
    request.state = RequestState::L1Resolved;
    ApplyOutcome::Applied
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, FixedBytes, U256};
    use bridge_types::{ChainId, FillId, RequestId};

    use super::*;

    fn sample() -> Request {
        Request::new(
            RequestId(FixedBytes::repeat_byte(7)),
            1 as ChainId,
            2 as ChainId,
            Address::ZERO,
            Address::ZERO,
            Address::ZERO,
            U256::from(100u64),
            U256::from(1u64),
            1_000,
            U256::ZERO,
            U256::ZERO,
        )
    }

    fn fill_event(request: &Request, filler: Address) -> RequestFilled {
        RequestFilled {
            request_id: request.id,
            source_chain_id: request.source_chain_id,
            target_token_address: request.target_token_address,
            filler,
            fill_id: FillId(FixedBytes::repeat_byte(9)),
            amount: request.amount,
            fill_tx_hash: FixedBytes::repeat_byte(0xaa),
        }
    }

    #[test]
    fn fill_observed_directly_from_pending() {
        let mut request = sample();
        let filler = Address::repeat_byte(1);
        let event = fill_event(&request, filler);

        let outcome = apply_request_filled(&mut request, &event);

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(request.state, RequestState::Filled);
        assert_eq!(request.filler, Some(filler));
        assert_eq!(request.fill_tx_hash, Some(event.fill_tx_hash));
    }

    #[test]
    fn duplicate_fill_event_is_dropped_not_requeued() {
        let mut request = sample();
        let filler = Address::repeat_byte(1);
        let event = fill_event(&request, filler);
        apply_request_filled(&mut request, &event);

        let outcome = apply_request_filled(&mut request, &event);

        assert_eq!(outcome, ApplyOutcome::Dropped);
        assert_eq!(request.state, RequestState::Filled);
    }

    #[test]
    fn claim_made_before_fill_observed_requeues() {
        let mut request = sample();
        assert_eq!(apply_claim_made(&mut request), ApplyOutcome::Requeue);
        assert_eq!(request.state, RequestState::Pending);
    }

    #[test]
    fn claim_withdrawn_only_terminates_request_when_deposit_reaches_filler() {
        let mut request = sample();
        request.state = RequestState::Claimed;
        let event = ClaimWithdrawn {
            request_id: request.id,
            claim_id: bridge_types::ClaimId(1),
            claim_receiver: Address::repeat_byte(3),
        };

        let dishonest = apply_claim_withdrawn(&mut request, &event, false);
        assert_eq!(dishonest, ApplyOutcome::Dropped);
        assert_eq!(request.state, RequestState::Claimed);

        let honest = apply_claim_withdrawn(&mut request, &event, true);
        assert_eq!(honest, ApplyOutcome::Applied);
        assert_eq!(request.state, RequestState::Withdrawn);
    }

    #[test]
    fn resolution_overrides_any_non_terminal_state() {
        let mut request = sample();
        request.state = RequestState::Claimed;
        let event = RequestResolved {
            request_id: request.id,
            fill_id: FillId(FixedBytes::repeat_byte(4)),
            chain_id: request.target_chain_id,
            filler: Address::repeat_byte(5),
        };

        let outcome = apply_resolution(&mut request, &event);

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(request.state, RequestState::L1Resolved);
        assert_eq!(request.filler, Some(Address::repeat_byte(5)));
    }
}
