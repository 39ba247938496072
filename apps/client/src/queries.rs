//! Cached read-only poll queries.
//!
//! Every query degrades to a safe default (`0`, `None`, `false`, empty)
//! instead of failing: when the network has no contract configured, when the
//! query is disabled by its arguments, or when the remote call errors. A
//! failing fetch inside a batch therefore never aborts the batch.

use std::sync::Arc;

use crate::api::{ReadOnlyCall, ReadOnlyCaller};
use crate::cache::{CachedValue, QueryCache, QueryKey};
use crate::clarity::ClarityValue;
use crate::config::{Network, Networks};
use crate::contract::{ContractFunction, PollContract};
use crate::error::CallError;
use crate::normalize::{
    coerce_bool, coerce_u64, normalize_option, normalize_poll, normalize_vote, unwrap_envelope,
    RawValue,
};
use crate::session::SessionManager;
use crate::types::{Poll, PollOption, VoteRecord};

pub struct PollQueries<C> {
    caller: C,
    networks: Networks,
    cache: Arc<QueryCache>,
}

impl<C: ReadOnlyCaller> PollQueries<C> {
    pub fn new(caller: C, networks: Networks, cache: Arc<QueryCache>) -> Self {
        Self {
            caller,
            networks,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn caller(&self) -> &C {
        &self.caller
    }

    fn contract(&self, network: Network) -> Option<PollContract> {
        let contract = PollContract::resolve(&self.networks, network);
        contract.is_configured().then_some(contract)
    }

    async fn read(
        &self,
        network: Network,
        contract: PollContract,
        function: ContractFunction,
        arguments: Vec<ClarityValue>,
    ) -> Result<RawValue, CallError> {
        let call = ReadOnlyCall::new(network, contract, function, arguments);
        let value = self.caller.call_read_only(&call).await?;
        Ok(value.to_raw())
    }

    // ========================================
    // Uncached fetches
    // ========================================

    pub async fn fetch_poll_count(&self, network: Network) -> u64 {
        let Some(contract) = self.contract(network) else {
            return 0;
        };
        match self
            .read(network, contract, ContractFunction::GetPollCount, vec![])
            .await
        {
            Ok(raw) => coerce_u64(&raw, "poll-count"),
            Err(e) => {
                tracing::error!(%network, "error fetching poll count: {}", e);
                0
            }
        }
    }

    pub async fn fetch_poll(&self, network: Network, poll_id: u64) -> Option<Poll> {
        let contract = self.contract(network)?;
        match self
            .read(
                network,
                contract,
                ContractFunction::GetPoll,
                vec![ClarityValue::uint(poll_id)],
            )
            .await
        {
            Ok(raw) if coerce_bool(&raw) => Some(normalize_poll(poll_id, &raw)),
            Ok(_) => None,
            Err(e) => {
                tracing::error!(%network, poll_id, "error fetching poll: {}", e);
                None
            }
        }
    }

    pub async fn fetch_poll_option(
        &self,
        network: Network,
        poll_id: u64,
        option_index: u64,
    ) -> Option<PollOption> {
        let contract = self.contract(network)?;
        match self
            .read(
                network,
                contract,
                ContractFunction::GetPollOption,
                vec![ClarityValue::uint(poll_id), ClarityValue::uint(option_index)],
            )
            .await
        {
            Ok(raw) if coerce_bool(&raw) => Some(normalize_option(option_index, &raw)),
            Ok(_) => None,
            Err(e) => {
                tracing::error!(
                    %network,
                    poll_id,
                    option_index,
                    "error fetching poll option: {}",
                    e
                );
                None
            }
        }
    }

    pub async fn fetch_has_voted(&self, network: Network, poll_id: u64, voter: &str) -> bool {
        let Some(contract) = self.contract(network) else {
            return false;
        };
        let voter_arg = match ClarityValue::principal(voter) {
            Ok(arg) => arg,
            Err(e) => {
                tracing::error!(poll_id, voter, "invalid voter principal: {}", e);
                return false;
            }
        };
        match self
            .read(
                network,
                contract,
                ContractFunction::HasVoted,
                vec![ClarityValue::uint(poll_id), voter_arg],
            )
            .await
        {
            Ok(raw) => matches!(unwrap_envelope(&raw), RawValue::Bool(true)),
            Err(e) => {
                tracing::error!(%network, poll_id, "error checking vote status: {}", e);
                false
            }
        }
    }

    pub async fn fetch_vote(
        &self,
        network: Network,
        poll_id: u64,
        voter: &str,
    ) -> Option<VoteRecord> {
        let contract = self.contract(network)?;
        let voter_arg = match ClarityValue::principal(voter) {
            Ok(arg) => arg,
            Err(e) => {
                tracing::error!(poll_id, voter, "invalid voter principal: {}", e);
                return None;
            }
        };
        match self
            .read(
                network,
                contract,
                ContractFunction::GetVote,
                vec![ClarityValue::uint(poll_id), voter_arg],
            )
            .await
        {
            Ok(raw) if coerce_bool(&raw) => Some(normalize_vote(&raw)),
            Ok(_) => None,
            Err(e) => {
                tracing::error!(%network, poll_id, "error fetching vote: {}", e);
                None
            }
        }
    }

    // ========================================
    // Cached queries
    // ========================================

    pub async fn poll_count(&self, network: Network) -> u64 {
        if self.contract(network).is_none() {
            return 0;
        }
        let key = QueryKey::PollCount(network);
        if let Some(CachedValue::Count(count)) = self.cache.get(&key).await {
            return count;
        }
        let count = self.fetch_poll_count(network).await;
        self.cache.insert(key, CachedValue::Count(count)).await;
        count
    }

    pub async fn poll(&self, network: Network, poll_id: u64) -> Option<Poll> {
        if poll_id == 0 {
            return None;
        }
        self.contract(network)?;
        let key = QueryKey::Poll(network, poll_id);
        if let Some(CachedValue::Poll(poll)) = self.cache.get(&key).await {
            return poll;
        }
        let poll = self.fetch_poll(network, poll_id).await;
        self.cache.insert(key, CachedValue::Poll(poll.clone())).await;
        poll
    }

    /// Options `0..option_count` in order; missing options are skipped, so
    /// callers must use each option's `option_index` rather than its position.
    pub async fn poll_options(
        &self,
        network: Network,
        poll_id: u64,
        option_count: u64,
    ) -> Vec<PollOption> {
        if poll_id == 0 || option_count == 0 || self.contract(network).is_none() {
            return Vec::new();
        }
        let key = QueryKey::PollOptions(network, poll_id, option_count);
        if let Some(CachedValue::Options(options)) = self.cache.get(&key).await {
            return options;
        }
        let mut options = Vec::new();
        for index in 0..option_count {
            if let Some(option) = self.fetch_poll_option(network, poll_id, index).await {
                options.push(option);
            }
        }
        self.cache
            .insert(key, CachedValue::Options(options.clone()))
            .await;
        options
    }

    /// Poll count, then one sequential fetch per id in `1..=count`. Ids that
    /// come back empty are omitted.
    pub async fn all_polls(&self, network: Network) -> Vec<Poll> {
        let count = self.poll_count(network).await;
        if count == 0 {
            return Vec::new();
        }
        let key = QueryKey::AllPolls(network, count);
        if let Some(CachedValue::Polls(polls)) = self.cache.get(&key).await {
            return polls;
        }
        let mut polls = Vec::new();
        for poll_id in 1..=count {
            match self.fetch_poll(network, poll_id).await {
                Some(poll) => polls.push(poll),
                None => tracing::debug!(%network, poll_id, "poll missing from batch, skipping"),
            }
        }
        tracing::info!(%network, count, fetched = polls.len(), "fetched all polls");
        self.cache.insert(key, CachedValue::Polls(polls.clone())).await;
        polls
    }

    pub async fn has_voted(&self, network: Network, poll_id: u64, voter: &str) -> bool {
        if poll_id == 0 || voter.is_empty() || self.contract(network).is_none() {
            return false;
        }
        let key = QueryKey::HasVoted(network, poll_id, voter.to_string());
        if let Some(CachedValue::Flag(voted)) = self.cache.get(&key).await {
            return voted;
        }
        let voted = self.fetch_has_voted(network, poll_id, voter).await;
        self.cache.insert(key, CachedValue::Flag(voted)).await;
        voted
    }

    pub async fn vote_of(&self, network: Network, poll_id: u64, voter: &str) -> Option<VoteRecord> {
        if poll_id == 0 || voter.is_empty() {
            return None;
        }
        self.contract(network)?;
        let key = QueryKey::Vote(network, poll_id, voter.to_string());
        if let Some(CachedValue::Vote(vote)) = self.cache.get(&key).await {
            return vote;
        }
        let vote = self.fetch_vote(network, poll_id, voter).await;
        self.cache.insert(key, CachedValue::Vote(vote.clone())).await;
        vote
    }

    /// `has_voted` for the session's connected address on its active network.
    pub async fn session_has_voted(&self, session: &SessionManager, poll_id: u64) -> bool {
        match session.address() {
            Some(address) => self.has_voted(session.network(), poll_id, address).await,
            None => false,
        }
    }
}
