use alloy_primitives::Address;
use alloy_provider::Provider;
use async_trait::async_trait;
use bridge_contracts::{IFillManager, IRequestManager};
use bridge_types::{
    events::{ClaimMade, ClaimWithdrawn, FillInvalidated, RequestCreated, RequestFilled, RequestResolved},
    ChainId, ClaimId, Event, FillId, RequestId,
};
use chain_client::ChainClient;

/// Produces a time-ordered slice of confirmed [`Event`]s for one contract in
/// `[from_block, to_block]`. One impl per contract, since `RequestManager`
/// and `FillManager` expose different event ABIs;
/// [`crate::fetcher::EventFetcher`] is the generic windowing/cursor logic
/// shared by both.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Maximum number of blocks the chain's RPC will return logs for in one
    /// call; the fetcher windows its scan to respect this.
    fn max_range(&self) -> u64;

    async fn latest_block(&self) -> bridge_types::AgentResult<u64>;

    async fn fetch_window(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> bridge_types::AgentResult<Vec<Event>>;
}

fn to_agent_err<E: std::fmt::Display>(e: E) -> bridge_types::AgentError {
    bridge_types::AgentError::TransientRpc(e.to_string())
}

/// Event source for the request-manager contract on the source rollup:
/// `RequestCreated`, `ClaimMade`, `ClaimWithdrawn`.
pub struct RequestManagerSource<P> {
    client: ChainClient<P>,
    address: Address,
    max_range: u64,
}

impl<P> RequestManagerSource<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    pub fn new(client: ChainClient<P>, address: Address, max_range: u64) -> Self {
        Self { client, address, max_range }
    }
}

#[async_trait]
impl<P> EventSource for RequestManagerSource<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    fn max_range(&self) -> u64 {
        self.max_range
    }

    async fn latest_block(&self) -> bridge_types::AgentResult<u64> {
        self.client.block_number().await
    }

    async fn fetch_window(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> bridge_types::AgentResult<Vec<Event>> {
        let contract = IRequestManager::new(self.address, self.client.provider());
        let chain_id = self.client.chain_id();

        let created = contract
            .RequestCreated_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(to_agent_err)?;
        let claimed = contract
            .ClaimMade_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(to_agent_err)?;
        let withdrawn = contract
            .ClaimWithdrawn_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(to_agent_err)?;
        let resolved = contract
            .RequestResolved_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(to_agent_err)?;

        let mut ordered: Vec<(u64, u64, Event)> = Vec::new();

        for (event, log) in created {
            ordered.push((
                log.block_number.unwrap_or_default(),
                log.log_index.unwrap_or_default(),
                Event::RequestCreated(RequestCreated {
                    request_id: RequestId(event.requestId),
                    source_chain_id: chain_id,
                    target_chain_id: event.targetChainId.try_into().unwrap_or(ChainId::MAX),
                    source_token_address: event.sourceTokenAddress,
                    target_token_address: event.targetTokenAddress,
                    source_address: event.sourceAddress,
                    target_address: event.targetAddress,
                    amount: event.amount,
                    nonce: event.nonce,
                    valid_until: event.validUntil.try_into().unwrap_or(u64::MAX),
                }),
            ));
        }

        for (event, log) in claimed {
            ordered.push((
                log.block_number.unwrap_or_default(),
                log.log_index.unwrap_or_default(),
                Event::ClaimMade(ClaimMade {
                    request_id: RequestId(event.requestId),
                    claim_id: ClaimId(event.claimId.try_into().unwrap_or_default()),
                    fill_id: FillId(event.fillId),
                    claimer: event.claimer,
                    claimer_stake: event.claimerStake,
                    last_challenger: (event.lastChallenger != Address::ZERO)
                        .then_some(event.lastChallenger),
                    challenger_stake_total: event.challengerStakeTotal,
                    termination: event.termination.try_into().unwrap_or(u64::MAX),
                }),
            ));
        }

        for (event, log) in withdrawn {
            ordered.push((
                log.block_number.unwrap_or_default(),
                log.log_index.unwrap_or_default(),
                Event::ClaimWithdrawn(ClaimWithdrawn {
                    request_id: RequestId(event.requestId),
                    claim_id: ClaimId(event.claimId.try_into().unwrap_or_default()),
                    claim_receiver: event.claimReceiver,
                }),
            ));
        }

        for (event, log) in resolved {
            ordered.push((
                log.block_number.unwrap_or_default(),
                log.log_index.unwrap_or_default(),
                Event::RequestResolved(RequestResolved {
                    request_id: RequestId(event.requestId),
                    fill_id: FillId(event.fillId),
                    chain_id: event.chainId.try_into().unwrap_or(ChainId::MAX),
                    filler: event.filler,
                }),
            ));
        }

        ordered.sort_by_key(|(block, index, _)| (*block, *index));
        Ok(ordered.into_iter().map(|(_, _, event)| event).collect())
    }
}

/// Event source for the fill-manager contract on the target rollup:
/// `RequestFilled`.
pub struct FillManagerSource<P> {
    client: ChainClient<P>,
    address: Address,
    source_chain_id: ChainId,
    max_range: u64,
}

impl<P> FillManagerSource<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    pub fn new(
        client: ChainClient<P>,
        address: Address,
        source_chain_id: ChainId,
        max_range: u64,
    ) -> Self {
        Self { client, address, source_chain_id, max_range }
    }
}

#[async_trait]
impl<P> EventSource for FillManagerSource<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    fn max_range(&self) -> u64 {
        self.max_range
    }

    async fn latest_block(&self) -> bridge_types::AgentResult<u64> {
        self.client.block_number().await
    }

    async fn fetch_window(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> bridge_types::AgentResult<Vec<Event>> {
        let contract = IFillManager::new(self.address, self.client.provider());

        let filled = contract
            .RequestFilled_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(to_agent_err)?;
        let invalidated = contract
            .FillInvalidated_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(to_agent_err)?;

        let mut ordered: Vec<(u64, u64, Event)> = filled
            .into_iter()
            .map(|(event, log)| {
                (
                    log.block_number.unwrap_or_default(),
                    log.log_index.unwrap_or_default(),
                    Event::RequestFilled(RequestFilled {
                        request_id: RequestId(event.requestId),
                        source_chain_id: self.source_chain_id,
                        target_token_address: event.targetTokenAddress,
                        filler: event.filler,
                        fill_id: FillId(event.fillId),
                        amount: event.amount,
                        fill_tx_hash: log.transaction_hash.unwrap_or_default(),
                    }),
                )
            })
            .collect();

        for (event, log) in invalidated {
            ordered.push((
                log.block_number.unwrap_or_default(),
                log.log_index.unwrap_or_default(),
                Event::FillInvalidated(FillInvalidated {
                    request_id: RequestId(event.requestId),
                    fill_id: FillId(event.fillId),
                    source_chain_id: event.sourceChainId.try_into().unwrap_or(ChainId::MAX),
                }),
            ));
        }

        ordered.sort_by_key(|(block, index, _)| (*block, *index));
        Ok(ordered.into_iter().map(|(_, _, event)| event).collect())
    }
}
