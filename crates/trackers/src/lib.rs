//! In-memory indexed collections of live [`Request`]/[`Claim`] entities with
//! O(1) lookup by id, stable insertion-order iteration, no ordering
//! guarantee beyond that.
//!
//! Both trackers are owned exclusively by the event processor
//! (`agent-processor`) — nothing else mutates them, so unlike
//! `order_storage.rs`'s `Arc<Mutex<...>>` (shared across RPC/P2P consumers
//! in a style common to shared order-book storage), a plain `HashMap`
//! behind `&mut self` is all that's needed here.

use std::collections::HashMap;

use bridge_types::{Claim, ClaimId, Request, RequestId};

#[derive(Debug, Default)]
pub struct RequestTracker {
    requests: HashMap<RequestId, Request>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, request: Request) {
        self.requests.insert(request.id, request);
    }

    pub fn get(&self, id: &RequestId) -> Option<&Request> {
        self.requests.get(id)
    }

    pub fn get_mut(&mut self, id: &RequestId) -> Option<&mut Request> {
        self.requests.get_mut(id)
    }

    pub fn remove(&mut self, id: &RequestId) -> Option<Request> {
        self.requests.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.requests.values()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ClaimTracker {
    claims: HashMap<ClaimId, Claim>,
}

impl ClaimTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, claim: Claim) {
        self.claims.insert(claim.claim_id, claim);
    }

    pub fn get(&self, id: &ClaimId) -> Option<&Claim> {
        self.claims.get(id)
    }

    pub fn get_mut(&mut self, id: &ClaimId) -> Option<&mut Claim> {
        self.claims.get_mut(id)
    }

    pub fn remove(&mut self, id: &ClaimId) -> Option<Claim> {
        self.claims.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    /// Claims made against one request. Not indexed separately — the
    /// per-request claim set is small (bounded by how many times a claim
    /// can realistically be outbid) so a filtered scan is simpler than
    /// maintaining a secondary index and keeping it in sync.
    pub fn for_request(&self, request_id: RequestId) -> impl Iterator<Item = &Claim> {
        self.claims.values().filter(move |c| c.request_id == request_id)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, FixedBytes, U256};
    use bridge_types::{ChainId, ClaimState, FillId};

    fn sample_request(seed: u8) -> Request {
        Request::new(
            bridge_types::RequestId(FixedBytes::repeat_byte(seed)),
            1 as ChainId,
            2 as ChainId,
            Address::ZERO,
            Address::ZERO,
            Address::ZERO,
            U256::from(100u64),
            U256::from(seed),
            1_000,
            U256::ZERO,
            U256::ZERO,
        )
    }

    #[test]
    fn add_get_remove_round_trips() {
        let mut tracker = RequestTracker::new();
        let request = sample_request(1);
        let id = request.id;
        tracker.add(request.clone());

        assert_eq!(tracker.get(&id), Some(&request));
        assert_eq!(tracker.len(), 1);

        let removed = tracker.remove(&id);
        assert_eq!(removed, Some(request));
        assert!(tracker.get(&id).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn claims_filtered_by_request() {
        let mut tracker = ClaimTracker::new();
        let request_a = bridge_types::RequestId(FixedBytes::repeat_byte(1));
        let request_b = bridge_types::RequestId(FixedBytes::repeat_byte(2));

        let make = |claim_id: u64, request_id: bridge_types::RequestId| Claim {
            claim_id: ClaimId(claim_id),
            request_id,
            claimer: Address::ZERO,
            claimer_stake: U256::ZERO,
            last_challenger: None,
            challenger_stake_total: U256::ZERO,
            challenger_stakes: Default::default(),
            fill_id: FillId(FixedBytes::ZERO),
            termination: 0,
            challenge_back_off_timestamp: 0,
            state: ClaimState::Started,
        };

        tracker.add(make(1, request_a));
        tracker.add(make(2, request_a));
        tracker.add(make(3, request_b));

        assert_eq!(tracker.for_request(request_a).count(), 2);
        assert_eq!(tracker.for_request(request_b).count(), 1);
    }
}
