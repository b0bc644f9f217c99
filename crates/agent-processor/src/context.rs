//! Explicit context object replacing the module-level singletons (ABI,
//! contract addresses, account) the source keeps at import time — see
//! "Global/process state → context object" in spec §9. Passed into the
//! processor and executor so tests can parameterize every address and
//! threshold instead of relying on hidden module state.

use std::path::PathBuf;

use alloy_primitives::{Address, U256};
use url::Url;

/// First-challenge surplus needed to cross the L1-resolution stake
/// threshold (spec §4.8); kept configurable since the authoritative value
/// lives in the on-chain contract and may differ per deployment.
pub const DEFAULT_L1_RESOLUTION_THRESHOLD_WEI: u128 = 1_000_000_000_000_000;

#[derive(Debug, Clone)]
pub struct Context {
    pub self_address: Address,
    pub request_manager: Address,
    pub fill_manager: Address,
    /// Stake the agent itself submits on `claimRequest`. Read once from the
    /// contract's `claimStake()` at startup — see `bin/agent`'s wiring.
    pub claim_stake: U256,
    pub l1_resolution_threshold: U256,
    pub relayer_path: PathBuf,
    pub l1_rpc_url: Url,
    pub source_rpc_url: Url,
    pub target_rpc_url: Url,
    pub wallet_private_key_hex: String,
}

impl Context {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        self_address: Address,
        request_manager: Address,
        fill_manager: Address,
        claim_stake: U256,
        relayer_path: PathBuf,
        l1_rpc_url: Url,
        source_rpc_url: Url,
        target_rpc_url: Url,
        wallet_private_key_hex: String,
    ) -> Self {
        Self {
            self_address,
            request_manager,
            fill_manager,
            claim_stake,
            l1_resolution_threshold: U256::from(DEFAULT_L1_RESOLUTION_THRESHOLD_WEI),
            relayer_path,
            l1_rpc_url,
            source_rpc_url,
            target_rpc_url,
            wallet_private_key_hex,
        }
    }
}
