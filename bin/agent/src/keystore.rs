//! Loads the agent's signing key from an encrypted Geth V3 / `eth-keystore`
//! JSON file — the Rust counterpart of
//! `beamer.agent.util.account_from_keyfile`. Decryption itself is delegated
//! to `alloy_signer_local`; this module only owns path/passphrase plumbing
//! and turning a missing/garbled file into a typed [`AgentError::Fatal`].

use std::path::Path;

use alloy_signer_local::PrivateKeySigner;
use bridge_types::{AgentError, AgentResult};

pub fn load_signer(keystore_path: &Path, password: &str) -> AgentResult<PrivateKeySigner> {
    PrivateKeySigner::decrypt_keystore(keystore_path, password).map_err(|e| {
        AgentError::Fatal(format!("could not decrypt keystore {}: {e}", keystore_path.display()))
    })
}

/// Reads the passphrase from the environment variable named in config,
/// rather than accepting it on the command line where it would show up in
/// shell history and `ps`.
pub fn password_from_env(var_name: &str) -> AgentResult<String> {
    std::env::var(var_name)
        .map_err(|_| AgentError::Fatal(format!("environment variable {var_name} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_var_is_fatal() {
        let result = password_from_env("AGENT_KEYSTORE_PASSWORD_DOES_NOT_EXIST");
        assert!(matches!(result, Err(AgentError::Fatal(_))));
    }

    #[test]
    fn decrypting_a_missing_keystore_file_is_fatal() {
        let result = load_signer(Path::new("/nonexistent/keystore.json"), "irrelevant");
        assert!(matches!(result, Err(AgentError::Fatal(_))));
    }
}
