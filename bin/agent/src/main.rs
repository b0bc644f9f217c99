mod config;
mod keystore;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use agent_processor::{Context, EventProcessor, EventQueue, ProcessorHandle};
use alloy_primitives::U256;
use chain_client::connect;
use clap::Parser;
use config::AgentConfig;
use event_sync::{EventFetcher, EventMonitor, FillManagerSource, RequestManagerSource};
use token_checker::TokenChecker;

#[derive(Parser)]
#[clap(about = "Beamer bridge liquidity-provider agent")]
struct Cli {
    /// path to the agent's TOML configuration file
    #[clap(short, long, default_value = "agent.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli_args = Cli::parse();
    let config = AgentConfig::load(&cli_args.config)?;

    let password = keystore::password_from_env(&config.keystore_password_env_var)?;
    let signer = keystore::load_signer(std::path::Path::new(&config.keystore_path), &password)?;
    let self_address = alloy_signer::Signer::address(&signer);

    let wallet_private_key_hex = format!("0x{}", hex::encode(signer.to_bytes()));

    let source_client = connect(config.source_rpc_url.clone(), signer.clone()).await?;
    let target_client = connect(config.target_rpc_url.clone(), signer.clone()).await?;

    let token_checker = TokenChecker::new(config.token_mappings.clone())?;

    let on_chain_claim_stake = read_claim_stake(&source_client, config.request_manager_address).await?;
    let claim_stake = config.claim_stake_override()?.unwrap_or(on_chain_claim_stake);

    let relayer_path = l1_resolver::locate_relayer(std::path::Path::new(&config.relayer_dir))?;

    let mut context = Context::new(
        self_address,
        config.request_manager_address,
        config.fill_manager_address,
        claim_stake,
        relayer_path,
        config.l1_rpc_url.clone(),
        config.source_rpc_url.clone(),
        config.target_rpc_url.clone(),
        wallet_private_key_hex,
    );
    if let Some(threshold) = config.l1_resolution_threshold()? {
        context.l1_resolution_threshold = threshold;
    }

    let executor = action_executor::ActionExecutor::new(
        source_client.clone(),
        target_client.clone(),
        config.request_manager_address,
        config.fill_manager_address,
    );

    let queue = Arc::new(EventQueue::new());

    let request_source = RequestManagerSource::new(
        source_client.clone(),
        config.request_manager_address,
        config.max_log_range,
    );
    let request_fetcher = EventFetcher::new(request_source, config.request_manager_deployment_block);

    let fill_source = FillManagerSource::new(
        target_client.clone(),
        config.fill_manager_address,
        source_client.chain_id(),
        config.max_log_range,
    );
    let fill_fetcher = EventFetcher::new(fill_source, config.fill_manager_deployment_block);

    let request_queue = queue.clone();
    let fill_queue = queue.clone();

    let mut request_monitor = EventMonitor::start(
        "request-manager-monitor",
        request_fetcher,
        move |events| request_queue.push_batch(events),
        {
            let queue = queue.clone();
            move || queue.mark_sync_done()
        },
    );
    let mut fill_monitor = EventMonitor::start(
        "fill-manager-monitor",
        fill_fetcher,
        move |events| fill_queue.push_batch(events),
        {
            let queue = queue.clone();
            move || queue.mark_sync_done()
        },
    );

    let processor = EventProcessor::new(context, executor, token_checker, queue.clone()).await?;
    let mut processor_handle = ProcessorHandle::spawn(processor);

    tracing::info!("beamer agent running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    processor_handle.stop();
    request_monitor.stop();
    fill_monitor.stop();

    Ok(())
}

/// One-shot `claimStake()` read at startup, the only place this binary talks
/// to the request-manager directly rather than through `ActionExecutor`.
async fn read_claim_stake<P>(
    client: &chain_client::ChainClient<P>,
    request_manager: alloy_primitives::Address,
) -> eyre::Result<U256>
where
    P: alloy_provider::Provider + Clone + Send + Sync + 'static,
{
    let contract = bridge_contracts::IRequestManager::new(request_manager, client.provider());
    let stake = contract.claimStake().call().await?;
    Ok(stake)
}
