//! TOML-deserializable configuration, loaded the way the teacher loads its
//! own state config: a plain `serde`-derived struct, read once at startup
//! and never mutated, every threshold explicit rather than a hidden
//! module-level constant.

use std::path::Path;

use alloy_primitives::{Address, U256};
use serde::Deserialize;
use token_checker::TokenMappingConfig;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub source_rpc_url: Url,
    pub target_rpc_url: Url,
    pub l1_rpc_url: Url,
    pub request_manager_address: Address,
    pub fill_manager_address: Address,
    pub request_manager_deployment_block: u64,
    pub fill_manager_deployment_block: u64,
    /// Maximum block range the source/target RPC endpoints will accept for
    /// one `eth_getLogs` call.
    #[serde(default = "default_max_log_range")]
    pub max_log_range: u64,
    pub keystore_path: String,
    pub keystore_password_env_var: String,
    pub relayer_dir: String,
    /// Overrides the contract's `claimStake()` read at startup; `None`
    /// means always use the on-chain value.
    #[serde(default)]
    pub claim_stake_override: Option<String>,
    #[serde(default)]
    pub l1_resolution_threshold_wei: Option<String>,
    pub token_mappings: TokenMappingConfig,
}

fn default_max_log_range() -> u64 {
    5_000
}

impl AgentConfig {
    pub fn from_toml_str(raw: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(raw)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> eyre::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("could not read config file {}: {e}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    pub fn claim_stake_override(&self) -> eyre::Result<Option<U256>> {
        self.claim_stake_override
            .as_deref()
            .map(|raw| raw.parse::<U256>().map_err(|e| eyre::eyre!("invalid claim_stake_override: {e}")))
            .transpose()
    }

    pub fn l1_resolution_threshold(&self) -> eyre::Result<Option<U256>> {
        self.l1_resolution_threshold_wei
            .as_deref()
            .map(|raw| {
                raw.parse::<U256>().map_err(|e| eyre::eyre!("invalid l1_resolution_threshold_wei: {e}"))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        source_rpc_url = "http://localhost:8545"
        target_rpc_url = "http://localhost:8546"
        l1_rpc_url = "http://localhost:8544"
        request_manager_address = "0x0000000000000000000000000000000000000001"
        fill_manager_address = "0x0000000000000000000000000000000000000002"
        request_manager_deployment_block = 100
        fill_manager_deployment_block = 200
        keystore_path = "/tmp/keystore.json"
        keystore_password_env_var = "AGENT_KEYSTORE_PASSWORD"
        relayer_dir = "/opt/relayer"
        token_mappings = []
    "#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = AgentConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.max_log_range, 5_000);
        assert!(config.claim_stake_override().unwrap().is_none());
        assert!(config.l1_resolution_threshold().unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_override() {
        let mut config = AgentConfig::from_toml_str(SAMPLE).unwrap();
        config.claim_stake_override = Some("not-a-number".to_string());
        assert!(config.claim_stake_override().is_err());
    }
}
