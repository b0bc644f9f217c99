//! Invokes the external L1-resolution relayer binary: the one piece of the
//! agent that leaves the process boundary to carry a fill/invalidation proof
//! from the target rollup through L1 back to the source rollup, which then
//! emits a `RequestResolved` event the agent picks back up as a normal
//! confirmed event.
//!
//! Grounded on `beamer.agent.l1_resolution.run_relayer_for_tx` (platform-name
//! lookup, existence check, `subprocess.run(..., check=True)`) and the
//! `Command::new(...).expect(...)` shape used to invoke external tool chains
//! elsewhere in this stack's build scripts. The relayer is a packaged
//! native binary out of scope for this crate (see spec §1); this crate only
//! owns locating it and shelling out with the right arguments.

use std::path::{Path, PathBuf};

use alloy_primitives::TxHash;
use bridge_types::{AgentError, AgentResult};
use url::Url;

/// Platform-qualified relayer executable names, mirroring
/// `beamer.agent.l1_resolution._RELAYER_NAMES`.
fn relayer_file_name() -> AgentResult<&'static str> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => Ok("relayer-node18-linux-x64"),
        ("linux", "aarch64") => Ok("relayer-node18-linux-arm64"),
        ("macos", "x86_64") => Ok("relayer-node18-macos-x64"),
        ("macos", "aarch64") => Ok("relayer-node18-macos-arm64"),
        (os, arch) => {
            Err(AgentError::Fatal(format!("unsupported platform for L1 relayer: {os}/{arch}")))
        }
    }
}

/// Resolves the relayer binary, failing fatally (per §4.11: "failure to
/// locate the binary terminates the process") if it isn't reachable.
pub fn locate_relayer(relayer_dir: &Path) -> AgentResult<PathBuf> {
    let path = relayer_dir.join(relayer_file_name()?);
    if !path.exists() {
        return Err(AgentError::Fatal(format!(
            "L1 relayer binary not found at {}",
            path.display()
        )));
    }
    Ok(path)
}

/// The five parameters §6 names for the relayer CLI.
pub struct L1ResolutionRequest {
    pub l1_rpc_url: Url,
    pub l2_relay_from_rpc_url: Url,
    pub l2_relay_to_rpc_url: Url,
    pub wallet_private_key: String,
    pub l2_transaction_hash: TxHash,
}

/// Spawns the relayer binary for one fill/invalidation proof and awaits its
/// exit. A non-zero exit is reported as [`AgentError::ContractRevert`] —
/// logged by the caller, never retried by this crate, left to the periodic
/// scan to retrigger if the claim's state still warrants escalation.
pub async fn resolve_on_l1(
    relayer_path: &Path,
    request: &L1ResolutionRequest,
) -> AgentResult<()> {
    let output = tokio::process::Command::new(relayer_path)
        .arg("--l1-rpc-url")
        .arg(request.l1_rpc_url.as_str())
        .arg("--l2-relay-from-rpc-url")
        .arg(request.l2_relay_from_rpc_url.as_str())
        .arg("--l2-relay-to-rpc-url")
        .arg(request.l2_relay_to_rpc_url.as_str())
        .arg("--wallet-private-key")
        .arg(&request.wallet_private_key)
        .arg("--l2-transaction-hash")
        .arg(request.l2_transaction_hash.to_string())
        .output()
        .await
        .map_err(|e| AgentError::TransientRpc(format!("failed to spawn relayer: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AgentError::ContractRevert(format!(
            "relayer exited with {}: {stderr}",
            output.status
        )));
    }

    tracing::info!(
        tx_hash = %request.l2_transaction_hash,
        "L1 resolution relayed successfully"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_relayer_is_fatal_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_relayer(dir.path()).unwrap_err();
        assert!(matches!(err, AgentError::Fatal(_)));
    }

    #[test]
    fn locate_relayer_succeeds_when_binary_present() {
        let dir = tempfile::tempdir().unwrap();
        let name = relayer_file_name().unwrap();
        std::fs::write(dir.path().join(name), b"#!/bin/sh\nexit 0\n").unwrap();
        let found = locate_relayer(dir.path()).unwrap();
        assert_eq!(found, dir.path().join(name));
    }

    #[tokio::test]
    async fn resolve_on_l1_reports_nonzero_exit_as_contract_revert() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-relayer");
        std::fs::write(&script, "#!/bin/sh\necho boom 1>&2\nexit 1\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let request = L1ResolutionRequest {
            l1_rpc_url: Url::parse("http://localhost:8545").unwrap(),
            l2_relay_from_rpc_url: Url::parse("http://localhost:8546").unwrap(),
            l2_relay_to_rpc_url: Url::parse("http://localhost:8547").unwrap(),
            wallet_private_key: "0xabc".to_string(),
            l2_transaction_hash: TxHash::repeat_byte(1),
        };

        let result = resolve_on_l1(&script, &request).await;
        assert!(matches!(result, Err(AgentError::ContractRevert(_))));
    }
}
