//! Pure decision functions backing the periodic scan's "what should I do
//! now?" questions (spec §4.7-§4.8). No I/O: every function here takes the
//! tracked entities, the caller's own address, and "now" (a chain-derived
//! [`bridge_types::BlockReference`] timestamp, never wall-clock), and
//! returns a yes/no/amount. Kept separate from `processor.rs` the same way
//! `state-machine` keeps transitions separate from tracker ownership — so
//! the challenge game's economics are unit-testable without a provider.

use alloy_primitives::{Address, U256};
use bridge_types::{Claim, Request};

/// First challenge of an unchallenged claim is oversized to cross the
/// L1-resolution stake threshold; every subsequent outbid is the minimum
/// legal raise.
const FIRST_CHALLENGE_SURPLUS: u128 = 1_000_000_000_000_000; // 10^15 wei

pub fn request_expired(request: &Request, now: u64) -> bool {
    now >= request.valid_until
}

/// `claim.claimer`/`claim.fill_id` disagreeing with what the request itself
/// recorded as its filler/fill_id.
pub fn dishonest_claim(claim: &Claim, request: &Request) -> bool {
    request.filler != Some(claim.claimer) || request.fill_id != Some(claim.fill_id)
}

/// Whether `self_address` was the honest filler of `request` but someone is
/// claiming under a different `fill_id` than the one the agent's own fill
/// produced — the condition under which the agent should invalidate the
/// bogus fill on the target rollup (§6 `invalidateFill`).
pub fn should_invalidate_fill(claim: &Claim, request: &Request, self_address: Address) -> bool {
    request.filler == Some(self_address) && Some(claim.fill_id) != request.fill_id
}

/// §4.8: `challenge iff now >= back_off_timestamp AND
/// ((dishonest_claim ∧ unchallenged ∧ ¬own_claim) OR our_turn)`.
pub fn should_challenge(claim: &Claim, request: &Request, self_address: Address, now: u64) -> bool {
    if now < claim.challenge_back_off_timestamp {
        return false;
    }

    let unchallenged = claim.is_unchallenged();
    let own_claim = claim.claimer == self_address;
    let dishonest = dishonest_claim(claim, request);

    let we_are_challenger = claim.last_challenger == Some(self_address);
    let our_turn = (we_are_challenger && claim.winning_is_claimer())
        || (own_claim && claim.winning_is_challenger());

    (dishonest && unchallenged && !own_claim) || our_turn
}

/// §4.8 stake sizing: `max(claimer, challenger) + 10^15` for the first
/// (unchallenged) bid, `max(claimer, challenger) + 1` for every subsequent
/// outbid — the minimum legal raise.
pub fn challenge_stake(claim: &Claim) -> U256 {
    let current_max = claim.claimer_stake.max(claim.challenger_stake_total);
    if claim.is_unchallenged() {
        current_max + U256::from(FIRST_CHALLENGE_SURPLUS)
    } else {
        current_max + U256::from(1u64)
    }
}

/// Whether `self_address` has funds at stake on this claim (either as the
/// claimer or as one of the challengers who contributed to the stack) and
/// the termination deadline has passed, so a `withdraw` transaction would
/// pay something out rather than revert. The spec's periodic-scan
/// description (§4.7) only names the claimer case explicitly; extended here
/// to cover a winning or losing challenger too, since §8 scenario 2/3/6
/// require the agent to withdraw its own challenger stake — see DESIGN.md.
pub fn should_try_withdraw(claim: &Claim, self_address: Address, now: u64) -> bool {
    if now < claim.termination {
        return false;
    }
    claim.claimer == self_address || claim.challenger_stakes.contains_key(&self_address)
}

/// Once the total committed stake on a claim crosses the configured
/// L1-resolution threshold, the agent escalates — see
/// [`crate::processor::EventProcessor`]'s periodic scan.
pub fn crosses_l1_threshold(claim: &Claim, threshold: U256) -> bool {
    claim.challenger_stake_total >= threshold
}

#[cfg(test)]
mod tests {
    use alloy_primitives::FixedBytes;
    use bridge_types::{ChainId, ClaimId, ClaimState, FillId, RequestId, RequestState};
    use std::collections::HashMap;

    use super::*;

    fn request(filler: Option<Address>, fill_id: Option<FillId>) -> Request {
        let mut r = Request::new(
            RequestId(FixedBytes::repeat_byte(1)),
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
        );
        r.state = RequestState::Claimed;
        r.filler = filler;
        r.fill_id = fill_id;
        r
    }

    fn claim(claimer: Address, claimer_stake: u64, challenger_stake: u64) -> Claim {
        Claim {
            claim_id: ClaimId(1),
            request_id: RequestId(FixedBytes::repeat_byte(1)),
            claimer,
            claimer_stake: U256::from(claimer_stake),
            last_challenger: None,
            challenger_stake_total: U256::from(challenger_stake),
            challenger_stakes: HashMap::new(),
            fill_id: FillId(FixedBytes::repeat_byte(9)),
            termination: 2_000,
            challenge_back_off_timestamp: 0,
            state: ClaimState::Started,
        }
    }

    #[test]
    fn challenges_dishonest_unchallenged_claim_by_a_stranger() {
        let honest_filler = Address::repeat_byte(1);
        let req = request(Some(honest_filler), Some(FillId(FixedBytes::repeat_byte(9))));
        let mut dishonest = claim(Address::repeat_byte(2), 50, 0);
        dishonest.fill_id = FillId(FixedBytes::repeat_byte(0xff));

        assert!(should_challenge(&dishonest, &req, Address::repeat_byte(3), 0));
        assert_eq!(challenge_stake(&dishonest), U256::from(50u64 + FIRST_CHALLENGE_SURPLUS));
    }

    #[test]
    fn never_challenges_own_claim() {
        let me = Address::repeat_byte(9);
        let req = request(None, None);
        let own = claim(me, 50, 0);

        assert!(!should_challenge(&own, &req, me, 0));
    }

    #[test]
    fn respects_back_off_timestamp() {
        let honest_filler = Address::repeat_byte(1);
        let req = request(Some(honest_filler), Some(FillId(FixedBytes::repeat_byte(9))));
        let mut dishonest = claim(Address::repeat_byte(2), 50, 0);
        dishonest.fill_id = FillId(FixedBytes::repeat_byte(0xff));
        dishonest.challenge_back_off_timestamp = 500;

        assert!(!should_challenge(&dishonest, &req, Address::repeat_byte(3), 100));
        assert!(should_challenge(&dishonest, &req, Address::repeat_byte(3), 500));
    }

    #[test]
    fn our_turn_when_claimer_behind_after_being_outbid() {
        let me = Address::repeat_byte(9);
        let req = request(Some(me), Some(FillId(FixedBytes::repeat_byte(9))));
        let mut c = claim(me, 50, 100);
        c.fill_id = FillId(FixedBytes::repeat_byte(9));

        assert!(should_challenge(&c, &req, me, 0));
        assert_eq!(challenge_stake(&c), U256::from(101u64));
    }

    #[test]
    fn withdraw_eligible_for_challenger_stake_even_when_losing() {
        let me = Address::repeat_byte(9);
        let mut c = claim(Address::repeat_byte(1), 100, 50);
        c.challenger_stakes.insert(me, U256::from(50u64));

        assert!(!should_try_withdraw(&c, me, 1_000));
        assert!(should_try_withdraw(&c, me, 2_000));
    }

    #[test]
    fn l1_threshold_crossed_once_challenger_stake_reaches_it() {
        let c = claim(Address::repeat_byte(1), 1, 1_000_000_000_000_000);
        assert!(crosses_l1_threshold(&c, U256::from(FIRST_CHALLENGE_SURPLUS)));
        assert!(!crosses_l1_threshold(&c, U256::from(FIRST_CHALLENGE_SURPLUS) + U256::from(1u64)));
    }
}
