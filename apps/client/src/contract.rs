use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{Network, Networks};

pub const POLL_CONTRACT_NAME: &str = "poll";

/// Address and name of the deployed poll contract on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollContract {
    pub address: String,
    pub name: String,
}

impl PollContract {
    pub fn resolve(networks: &Networks, network: Network) -> Self {
        let contract = Self {
            address: networks.get(network).contract_address.clone(),
            name: POLL_CONTRACT_NAME.to_string(),
        };
        tracing::debug!(%network, address = %contract.address, "resolved poll contract");
        contract
    }

    pub fn is_configured(&self) -> bool {
        !self.address.trim().is_empty()
    }

    /// `<address>.<name>`, the contract principal.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.address, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractFunction {
    CreatePoll,
    Vote,
    ClosePoll,
    GetPoll,
    GetPollOption,
    GetCurrentTime,
    HasVoted,
    GetVote,
    GetPollCount,
    IsPollExpired,
    IsPollActive,
    GetPollStatus,
}

impl ContractFunction {
    pub const ALL: [ContractFunction; 12] = [
        ContractFunction::CreatePoll,
        ContractFunction::Vote,
        ContractFunction::ClosePoll,
        ContractFunction::GetPoll,
        ContractFunction::GetPollOption,
        ContractFunction::GetCurrentTime,
        ContractFunction::HasVoted,
        ContractFunction::GetVote,
        ContractFunction::GetPollCount,
        ContractFunction::IsPollExpired,
        ContractFunction::IsPollActive,
        ContractFunction::GetPollStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractFunction::CreatePoll => "create-poll",
            ContractFunction::Vote => "vote",
            ContractFunction::ClosePoll => "close-poll",
            ContractFunction::GetPoll => "get-poll",
            ContractFunction::GetPollOption => "get-poll-option",
            ContractFunction::GetCurrentTime => "get-current-time",
            ContractFunction::HasVoted => "has-voted",
            ContractFunction::GetVote => "get-vote",
            ContractFunction::GetPollCount => "get-poll-count",
            ContractFunction::IsPollExpired => "is-poll-expired",
            ContractFunction::IsPollActive => "is-poll-active",
            ContractFunction::GetPollStatus => "get-poll-status",
        }
    }

    pub fn is_read_only(&self) -> bool {
        !matches!(
            self,
            ContractFunction::CreatePoll | ContractFunction::Vote | ContractFunction::ClosePoll
        )
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for ContractFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
