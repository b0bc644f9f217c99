//! Token equivalence classes: which `(chain_id, token_address)` pairs the
//! agent considers interchangeable across rollups, and how much ERC-20
//! allowance it is willing to grant the fill-manager for each.

use std::collections::{HashMap, HashSet};

use alloy_primitives::Address;
use bridge_types::{AgentError, AgentResult, ChainId};
use serde::{Deserialize, Serialize};

/// One entry of a configured equivalence class: a token on a given chain,
/// plus an optional allowance cap. `allowance: None` means never approve
/// this token at all (the agent must already hold sufficient allowance, or
/// never fills with it); `Some("-1")` means approve the maximum `uint256`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenMappingEntry {
    pub chain_id: ChainId,
    pub token_address: Address,
    pub allowance: Option<String>,
}

/// Configuration input: one list per equivalence class, matching the shape
/// operators already hand-write for the token mapping file.
pub type TokenMappingConfig = Vec<Vec<TokenMappingEntry>>;

type Token = (ChainId, Address);

#[derive(Debug, Clone)]
struct TokenData {
    equivalence_class: HashSet<Token>,
    allowance: Option<alloy_primitives::U256>,
}

/// Base-chain id to the set of its connected rollup chain ids. An
/// equivalence class must not straddle two different base chains — bridging
/// between two L2s that don't share a settlement layer isn't something this
/// protocol supports.
fn supported_connected_l2s() -> HashMap<ChainId, HashSet<ChainId>> {
    let mut map = HashMap::new();
    map.insert(1u64, HashSet::from([10u64, 42161, 288, 1088]));
    map.insert(5u64, HashSet::from([421613u64, 420, 2888]));
    map
}

#[derive(Debug, Default)]
pub struct TokenChecker {
    tokens: HashMap<Token, TokenData>,
}

impl TokenChecker {
    pub fn new(config: TokenMappingConfig) -> AgentResult<Self> {
        let connected = supported_connected_l2s();
        let mut tokens = HashMap::new();

        for mapping in config {
            let equivalence_class: HashSet<Token> =
                mapping.iter().map(|entry| (entry.chain_id, entry.token_address)).collect();
            let chain_ids: HashSet<ChainId> = equivalence_class.iter().map(|(c, _)| *c).collect();

            for group in connected.values() {
                let intersection: HashSet<ChainId> =
                    group.intersection(&chain_ids).copied().collect();
                if !intersection.is_empty() && intersection != chain_ids {
                    return Err(AgentError::Fatal(format!(
                        "token equivalence class spans chains from more than one base layer: {chain_ids:?}"
                    )));
                }
            }

            for entry in &mapping {
                let allowance = parse_allowance(entry.allowance.as_deref())?;
                tokens.insert(
                    (entry.chain_id, entry.token_address),
                    TokenData { equivalence_class: equivalence_class.clone(), allowance },
                );
            }
        }

        Ok(Self { tokens })
    }

    pub fn is_valid_pair(
        &self,
        source_chain_id: ChainId,
        source_token_address: Address,
        target_chain_id: ChainId,
        target_token_address: Address,
    ) -> bool {
        let source = (source_chain_id, source_token_address);
        let target = (target_chain_id, target_token_address);
        self.tokens.get(&source).is_some_and(|data| data.equivalence_class.contains(&target))
    }

    pub fn allowance(
        &self,
        chain_id: ChainId,
        token_address: Address,
    ) -> Option<alloy_primitives::U256> {
        self.tokens.get(&(chain_id, token_address)).and_then(|data| data.allowance)
    }
}

fn parse_allowance(raw: Option<&str>) -> AgentResult<Option<alloy_primitives::U256>> {
    match raw {
        None => Ok(None),
        Some("-1") => Ok(Some(alloy_primitives::U256::MAX)),
        Some(other) => other
            .parse::<alloy_primitives::U256>()
            .map(Some)
            .map_err(|e| AgentError::Fatal(format!("invalid token allowance {other:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;

    fn entry(chain_id: ChainId, byte: u8, allowance: Option<&str>) -> TokenMappingEntry {
        TokenMappingEntry {
            chain_id,
            token_address: Address::repeat_byte(byte),
            allowance: allowance.map(str::to_owned),
        }
    }

    #[test]
    fn equivalence_class_allows_cross_chain_pairs() {
        let checker =
            TokenChecker::new(vec![vec![entry(10, 1, None), entry(42161, 1, Some("-1"))]])
                .unwrap();

        assert!(checker.is_valid_pair(
            10,
            Address::repeat_byte(1),
            42161,
            Address::repeat_byte(1)
        ));
        assert!(!checker.is_valid_pair(
            10,
            Address::repeat_byte(1),
            1088,
            Address::repeat_byte(1)
        ));
    }

    #[test]
    fn allowance_max_for_negative_one() {
        let checker =
            TokenChecker::new(vec![vec![entry(10, 1, Some("-1")), entry(42161, 1, None)]])
                .unwrap();

        assert_eq!(checker.allowance(10, Address::repeat_byte(1)), Some(U256::MAX));
        assert_eq!(checker.allowance(42161, Address::repeat_byte(1)), None);
        assert_eq!(checker.allowance(1, Address::repeat_byte(1)), None);
    }

    #[test]
    fn rejects_equivalence_class_spanning_two_base_layers() {
        // chain 10 is connected to mainnet (1), chain 420 is connected to goerli (5)
        let result = TokenChecker::new(vec![vec![entry(10, 1, None), entry(420, 1, None)]]);
        assert!(result.is_err());
    }
}
