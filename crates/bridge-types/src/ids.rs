use alloy_primitives::{keccak256, Address, FixedBytes, U256};
use serde::{Deserialize, Serialize};

/// Chain id of a rollup or L1 chain, as returned by `eth_chainId`.
pub type ChainId = u64;

/// `RequestId`, derived deterministically from the fields that make a
/// transfer request unique. Mirrors the derivation performed by the
/// request-manager contract so the agent never has to ask the chain for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub FixedBytes<32>);

impl RequestId {
    #[allow(clippy::too_many_arguments)]
    pub fn derive(
        source_chain_id: ChainId,
        target_chain_id: ChainId,
        target_token_address: Address,
        target_address: Address,
        amount: U256,
        nonce: U256,
    ) -> Self {
        let mut buf = Vec::with_capacity(8 + 8 + 20 + 20 + 32 + 32);
        buf.extend_from_slice(&source_chain_id.to_be_bytes());
        buf.extend_from_slice(&target_chain_id.to_be_bytes());
        buf.extend_from_slice(target_token_address.as_slice());
        buf.extend_from_slice(target_address.as_slice());
        buf.extend_from_slice(&amount.to_be_bytes::<32>());
        buf.extend_from_slice(&nonce.to_be_bytes::<32>());
        Self(keccak256(buf))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque 32-byte value returned by `fillRequest`, echoed back by a valid
/// claim. Two fill ids are equal iff the underlying bytes are equal; beyond
/// that the agent treats this as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FillId(pub FixedBytes<32>);

/// Identity of one claim attempt against a request. Unlike `RequestId` this
/// is assigned on-chain as a monotonically increasing integer, never derived
/// client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimId(pub u64);

impl std::fmt::Display for ClaimId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
