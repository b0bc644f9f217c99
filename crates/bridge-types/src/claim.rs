use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::ids::{ClaimId, FillId, RequestId};

/// States a [`Claim`] can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimState {
    Started,
    ClaimerWinning,
    ChallengerWinning,
    Withdrawn,
    Invalidated,
}

impl ClaimState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Withdrawn | Self::Invalidated)
    }
}

/// One attempt to redeem a [`Request`](crate::request::Request), tracking
/// the full stake ledger of the challenge game, not just the current
/// leader's stake — a per-challenger stake map lets a claim withdrawal pay
/// out every contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: ClaimId,
    pub request_id: RequestId,
    pub claimer: Address,
    pub claimer_stake: U256,
    pub last_challenger: Option<Address>,
    pub challenger_stake_total: U256,
    pub challenger_stakes: HashMap<Address, U256>,
    pub fill_id: FillId,
    /// Absolute unix-second deadline; monotonically non-decreasing.
    pub termination: u64,
    /// Read-only input to the challenge policy; the agent never writes
    /// this field itself, only the contract does via `ClaimMade`.
    pub challenge_back_off_timestamp: u64,
    pub state: ClaimState,
}

impl Claim {
    pub fn winning_is_claimer(&self) -> bool {
        self.claimer_stake > self.challenger_stake_total
    }

    pub fn winning_is_challenger(&self) -> bool {
        self.challenger_stake_total > self.claimer_stake
    }

    pub fn is_unchallenged(&self) -> bool {
        self.challenger_stake_total == U256::ZERO
    }
}
