use alloy_primitives::U256;
use bridge_types::events::ClaimMade;
use bridge_types::{Claim, ClaimState, Request};

use crate::outcome::ApplyOutcome;

/// Builds the initial [`Claim`] from the first `ClaimMade` log seen for a
/// `claim_id`. The event already carries the post-bid totals, so at
/// creation time the claimer is trivially winning (nothing has challenged
/// yet).
pub fn new_from_event(event: &ClaimMade) -> Claim {
    let mut challenger_stakes = std::collections::HashMap::new();
    if let Some(challenger) = event.last_challenger {
        challenger_stakes.insert(challenger, event.challenger_stake_total);
    }
    Claim {
        claim_id: event.claim_id,
        request_id: event.request_id,
        claimer: event.claimer,
        claimer_stake: event.claimer_stake,
        last_challenger: event.last_challenger,
        challenger_stake_total: event.challenger_stake_total,
        challenger_stakes,
        fill_id: event.fill_id,
        termination: event.termination,
        challenge_back_off_timestamp: 0,
        state: winning_state(event.claimer_stake, event.challenger_stake_total),
    }
}

/// Ties favor the incumbent, but this stateless recompute has no notion of
/// who that is — it falls back to `Started` on equality. That's only ever
/// reachable from [`new_from_event`] with no challenger yet (stake `0` vs
/// `0`): `apply_claim_made` requires a strict outbid on the losing side
/// before accepting an event (see its `claimer_increased`/`challenger_increased`
/// guards), so a genuine mid-game tie can never reach this function.
fn winning_state(claimer_stake: U256, challenger_stake_total: U256) -> ClaimState {
    if claimer_stake > challenger_stake_total {
        ClaimState::ClaimerWinning
    } else if challenger_stake_total > claimer_stake {
        ClaimState::ChallengerWinning
    } else {
        ClaimState::Started
    }
}

/// Applies a subsequent `ClaimMade` log (an outbid) to an already-tracked
/// claim.
///
/// Enforces the invariants the contract itself guarantees, so a decode bug
/// or a replayed/out-of-order log is caught here instead of silently
/// corrupting the stake ledger: termination only ever grows, a claimer
/// never challenges themself, and only the side currently behind may place
/// the next bid.
pub fn apply_claim_made(claim: &mut Claim, event: &ClaimMade) -> ApplyOutcome {
    if claim.claim_id != event.claim_id {
        return ApplyOutcome::Dropped;
    }
    if claim.state.is_terminal() {
        return ApplyOutcome::Dropped;
    }
    if event.termination < claim.termination {
        tracing::warn!(claim_id = %claim.claim_id, "claim termination decreased, dropping event");
        return ApplyOutcome::Dropped;
    }
    if let Some(challenger) = event.last_challenger {
        if challenger == claim.claimer {
            tracing::warn!(claim_id = %claim.claim_id, "claimer challenged their own claim, dropping event");
            return ApplyOutcome::Dropped;
        }
    }

    let claimer_increased = event.claimer_stake > claim.claimer_stake;
    let challenger_increased = event.challenger_stake_total > claim.challenger_stake_total;

    if claimer_increased && challenger_increased {
        tracing::warn!(claim_id = %claim.claim_id, "both stake sides increased in one event, dropping");
        return ApplyOutcome::Dropped;
    }
    if !claimer_increased && !challenger_increased {
        return ApplyOutcome::Dropped;
    }
    if claimer_increased && claim.winning_is_claimer() {
        tracing::warn!(claim_id = %claim.claim_id, "claimer outbid their own lead, dropping event");
        return ApplyOutcome::Dropped;
    }
    if challenger_increased && claim.winning_is_challenger() {
        tracing::warn!(claim_id = %claim.claim_id, "challenger outbid their own lead, dropping event");
        return ApplyOutcome::Dropped;
    }

    if challenger_increased {
        if let Some(challenger) = event.last_challenger {
            let delta = event.challenger_stake_total - claim.challenger_stake_total;
            *claim.challenger_stakes.entry(challenger).or_insert(U256::ZERO) += delta;
        }
    }

    claim.claimer_stake = event.claimer_stake;
    claim.challenger_stake_total = event.challenger_stake_total;
    claim.last_challenger = event.last_challenger;
    claim.termination = event.termination;
    claim.state = winning_state(claim.claimer_stake, claim.challenger_stake_total);

    ApplyOutcome::Applied
}

/// A confirmed `ClaimWithdrawn` log named this claim.
pub fn apply_withdrawn(claim: &mut Claim) -> ApplyOutcome {
    if claim.state.is_terminal() {
        return ApplyOutcome::Dropped;
    }
    claim.state = ClaimState::Withdrawn;
    ApplyOutcome::Applied
}

/// An L1 resolution named a winning `(filler, fill_id)` that contradicts
/// this claim — the claim's fill was never legitimate.
pub fn apply_invalidated(claim: &mut Claim) -> ApplyOutcome {
    if claim.state.is_terminal() {
        return ApplyOutcome::Dropped;
    }
    claim.state = ClaimState::Invalidated;
    ApplyOutcome::Applied
}

/// Whether withdrawing this claim pays the bridged deposit to the actual
/// filler, as opposed to only returning a dishonest claimer's own stake.
/// Drives [`crate::request_sm::apply_claim_withdrawn`]'s decision of
/// whether the request itself reaches `Withdrawn`.
pub fn deposit_paid_to_filler(claim: &Claim, request: &Request) -> bool {
    claim.winning_is_claimer()
        && request.filler == Some(claim.claimer)
        && request.fill_id == Some(claim.fill_id)
}

/// Applies an authoritative L1 resolution to one claim on the now-resolved
/// request. The resolution's `(filler, fill_id)` — already written onto
/// `request` by [`crate::request_sm::apply_resolution`] — overrides
/// whatever the local challenge game concluded: a claim matching the
/// resolved filler/fill_id is (re)validated even out of `Invalidated`, and
/// any other claim on the same request is marked `Invalidated`. A claim
/// that already reached `Withdrawn` stays there; funds have moved and
/// nothing can undo that.
pub fn apply_resolution(claim: &mut Claim, request: &Request) -> ApplyOutcome {
    if claim.state == ClaimState::Withdrawn {
        return ApplyOutcome::Dropped;
    }

    let matches_resolution =
        request.filler == Some(claim.claimer) && request.fill_id == Some(claim.fill_id);

    if matches_resolution {
        if claim.state == ClaimState::Invalidated {
            claim.state = winning_state(claim.claimer_stake, claim.challenger_stake_total);
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::Dropped
        }
    } else if claim.state != ClaimState::Invalidated {
        claim.state = ClaimState::Invalidated;
        ApplyOutcome::Applied
    } else {
        ApplyOutcome::Dropped
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, FixedBytes};
    use bridge_types::{ChainId, ClaimId, FillId, RequestId, RequestState};

    use super::*;

    fn creation_event() -> ClaimMade {
        ClaimMade {
            request_id: RequestId(FixedBytes::repeat_byte(1)),
            claim_id: ClaimId(1),
            fill_id: FillId(FixedBytes::repeat_byte(2)),
            claimer: Address::repeat_byte(3),
            claimer_stake: U256::from(100u64),
            last_challenger: None,
            challenger_stake_total: U256::ZERO,
            termination: 1_000,
        }
    }

    #[test]
    fn creation_event_yields_claimer_winning() {
        let claim = new_from_event(&creation_event());
        assert_eq!(claim.state, ClaimState::ClaimerWinning);
        assert!(claim.is_unchallenged());
    }

    #[test]
    fn challenger_outbid_flips_winner() {
        let mut claim = new_from_event(&creation_event());
        let challenger = Address::repeat_byte(9);
        let outbid = ClaimMade {
            last_challenger: Some(challenger),
            challenger_stake_total: U256::from(150u64),
            termination: 1_100,
            ..creation_event()
        };

        let outcome = apply_claim_made(&mut claim, &outbid);

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(claim.state, ClaimState::ChallengerWinning);
        assert_eq!(claim.challenger_stakes.get(&challenger), Some(&U256::from(150u64)));
    }

    #[test]
    fn challenger_cannot_outbid_their_own_lead() {
        let mut claim = new_from_event(&creation_event());
        let challenger = Address::repeat_byte(9);
        apply_claim_made(
            &mut claim,
            &ClaimMade {
                last_challenger: Some(challenger),
                challenger_stake_total: U256::from(150u64),
                termination: 1_100,
                ..creation_event()
            },
        );

        let self_outbid = ClaimMade {
            last_challenger: Some(challenger),
            challenger_stake_total: U256::from(200u64),
            termination: 1_200,
            ..creation_event()
        };
        let outcome = apply_claim_made(&mut claim, &self_outbid);

        assert_eq!(outcome, ApplyOutcome::Dropped);
        assert_eq!(claim.challenger_stake_total, U256::from(150u64));
    }

    #[test]
    fn termination_never_decreases() {
        let mut claim = new_from_event(&creation_event());
        let regressed = ClaimMade {
            claimer_stake: U256::from(200u64),
            termination: 500,
            ..creation_event()
        };

        assert_eq!(apply_claim_made(&mut claim, &regressed), ApplyOutcome::Dropped);
        assert_eq!(claim.termination, 1_000);
    }

    #[test]
    fn withdrawal_pays_filler_only_when_claimer_matches_request_fill() {
        let claim = new_from_event(&creation_event());
        let mut request = Request::new(
            claim.request_id,
            1 as ChainId,
            2 as ChainId,
            Address::ZERO,
            Address::ZERO,
            Address::ZERO,
            U256::from(1u64),
            U256::from(1u64),
            1_000,
            U256::ZERO,
            U256::ZERO,
        );
        request.state = RequestState::Claimed;
        request.filler = Some(claim.claimer);
        request.fill_id = Some(claim.fill_id);

        assert!(deposit_paid_to_filler(&claim, &request));

        request.filler = Some(Address::repeat_byte(99));
        assert!(!deposit_paid_to_filler(&claim, &request));
    }

    fn resolved_request(claim: &Claim) -> Request {
        let mut request = Request::new(
            claim.request_id,
            1 as ChainId,
            2 as ChainId,
            Address::ZERO,
            Address::ZERO,
            Address::ZERO,
            U256::from(1u64),
            U256::from(1u64),
            1_000,
            U256::ZERO,
            U256::ZERO,
        );
        request.state = RequestState::L1Resolved;
        request
    }

    #[test]
    fn resolution_invalidates_claim_on_losing_filler() {
        let mut claim = new_from_event(&creation_event());
        let mut request = resolved_request(&claim);
        request.filler = Some(Address::repeat_byte(99));
        request.fill_id = Some(claim.fill_id);

        let outcome = apply_resolution(&mut claim, &request);

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(claim.state, ClaimState::Invalidated);
    }

    #[test]
    fn resolution_revalidates_matching_claim_previously_invalidated() {
        let mut claim = new_from_event(&creation_event());
        claim.state = ClaimState::Invalidated;
        let mut request = resolved_request(&claim);
        request.filler = Some(claim.claimer);
        request.fill_id = Some(claim.fill_id);

        let outcome = apply_resolution(&mut claim, &request);

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(claim.state, ClaimState::ClaimerWinning);
    }

    #[test]
    fn resolution_never_touches_a_withdrawn_claim() {
        let mut claim = new_from_event(&creation_event());
        claim.state = ClaimState::Withdrawn;
        let mut request = resolved_request(&claim);
        request.filler = Some(Address::repeat_byte(99));
        request.fill_id = Some(claim.fill_id);

        let outcome = apply_resolution(&mut claim, &request);

        assert_eq!(outcome, ApplyOutcome::Dropped);
        assert_eq!(claim.state, ClaimState::Withdrawn);
    }
}
