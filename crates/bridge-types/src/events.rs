use alloy_primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::ids::{ChainId, ClaimId, FillId, RequestId};

/// Confirmed on-chain events the agent reacts to. These are the
/// fully-decoded, domain-typed counterparts of whatever `bridge-contracts`'
/// `sol!` bindings hand back from a log — decoding from the raw
/// ABI-encoded log happens in `event-sync`, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RequestCreated(RequestCreated),
    RequestFilled(RequestFilled),
    ClaimMade(ClaimMade),
    ClaimWithdrawn(ClaimWithdrawn),
    RequestResolved(RequestResolved),
    FillInvalidated(FillInvalidated),
}

impl Event {
    pub fn request_id(&self) -> RequestId {
        match self {
            Event::RequestCreated(e) => e.request_id,
            Event::RequestFilled(e) => e.request_id,
            Event::ClaimMade(e) => e.request_id,
            Event::ClaimWithdrawn(e) => e.request_id,
            Event::RequestResolved(e) => e.request_id,
            Event::FillInvalidated(e) => e.request_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCreated {
    pub request_id: RequestId,
    pub source_chain_id: ChainId,
    pub target_chain_id: ChainId,
    pub source_token_address: Address,
    pub target_token_address: Address,
    pub source_address: Address,
    pub target_address: Address,
    pub amount: U256,
    pub nonce: U256,
    pub valid_until: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFilled {
    pub request_id: RequestId,
    pub source_chain_id: ChainId,
    pub target_token_address: Address,
    pub filler: Address,
    pub fill_id: FillId,
    pub amount: U256,
    /// The target-rollup transaction hash this fill was confirmed in. Kept
    /// around so the L1 resolver hook can hand the relayer binary a proof
    /// of the fill even when the filler is a stranger the agent never
    /// transacted as (the dishonest-claim / invalidate-then-resolve path).
    pub fill_tx_hash: TxHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMade {
    pub request_id: RequestId,
    pub claim_id: ClaimId,
    pub fill_id: FillId,
    pub claimer: Address,
    pub claimer_stake: U256,
    pub last_challenger: Option<Address>,
    pub challenger_stake_total: U256,
    pub termination: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimWithdrawn {
    pub request_id: RequestId,
    pub claim_id: ClaimId,
    pub claim_receiver: Address,
}

/// A messenger-relayed L1 resolution landing on the source rollup, naming
/// the authoritative filler/fill for a request regardless of what any claim
/// on it says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestResolved {
    pub request_id: RequestId,
    pub fill_id: FillId,
    pub chain_id: ChainId,
    pub filler: Address,
}

/// A fill the agent itself invalidated on the target rollup, observed back
/// so the agent never re-sends `invalidateFill` for the same fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillInvalidated {
    pub request_id: RequestId,
    pub fill_id: FillId,
    pub source_chain_id: ChainId,
}
