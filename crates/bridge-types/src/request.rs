use alloy_primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::ids::{ChainId, FillId, RequestId};

/// States a [`Request`] can be in. See the `state-machine` crate for the
/// table; the transitions themselves live in `state-machine`, this crate
/// only owns the tag and the data that goes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Pending,
    Ignored,
    FilledUnconfirmed,
    Filled,
    ClaimedUnconfirmed,
    Claimed,
    Withdrawn,
    L1Resolved,
    Unfillable,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Withdrawn | Self::L1Resolved | Self::Unfillable | Self::Ignored)
    }
}

/// A token-transfer intent created on the source rollup.
///
/// Identity is `request_id` (see [`RequestId::derive`]); everything else is
/// either immutable after creation (`valid_until`, chain ids, token
/// addresses, amount, nonce, fees) or mutated exactly by the transitions
/// (`filler`, `fill_id`, `state`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub source_chain_id: ChainId,
    pub target_chain_id: ChainId,
    pub source_token_address: Address,
    pub target_token_address: Address,
    pub target_address: Address,
    pub amount: U256,
    pub nonce: U256,
    /// Unix seconds; immutable once the request is created.
    pub valid_until: u64,
    pub lp_fee: U256,
    pub protocol_fee: U256,
    pub filler: Option<Address>,
    pub fill_id: Option<FillId>,
    /// Target-rollup tx hash of the observed `RequestFilled`, used by the
    /// L1 resolver hook to carry a fill proof through L1. `None` until a
    /// fill is observed.
    pub fill_tx_hash: Option<TxHash>,
    pub state: RequestState,
}

impl Request {
    pub fn new(
        id: RequestId,
        source_chain_id: ChainId,
        target_chain_id: ChainId,
        source_token_address: Address,
        target_token_address: Address,
        target_address: Address,
        amount: U256,
        nonce: U256,
        valid_until: u64,
        lp_fee: U256,
        protocol_fee: U256,
    ) -> Self {
        Self {
            id,
            source_chain_id,
            target_chain_id,
            source_token_address,
            target_token_address,
            target_address,
            amount,
            nonce,
            valid_until,
            lp_fee,
            protocol_fee,
            filler: None,
            fill_id: None,
            fill_tx_hash: None,
            state: RequestState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == RequestState::Pending
    }

    pub fn is_filled_by(&self, address: Address) -> bool {
        self.state == RequestState::Filled && self.filler == Some(address)
    }

    pub fn is_claimed(&self) -> bool {
        self.state == RequestState::Claimed
    }

    pub fn is_removable(&self) -> bool {
        matches!(self.state, RequestState::Unfillable | RequestState::Withdrawn)
    }
}
