use serde::{Deserialize, Serialize};

/// One on-chain poll, flattened from the contract's `get-poll` tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub poll_id: u64,
    pub creator: String,
    pub title: String,
    pub option_count: u64,
    /// Unix seconds after which voting closes.
    pub deadline: u64,
    /// Set only by the creator's explicit `close-poll`; independent of `deadline`.
    pub is_closed: bool,
    pub total_votes: u64,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    /// Position on chain; the `option-index` a vote is cast with.
    pub option_index: u64,
    pub text: String,
    pub vote_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub option_index: u64,
    pub voted_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub is_connected: bool,
    pub address: Option<String>,
}

impl WalletState {
    pub fn disconnected() -> Self {
        Self::default()
    }
}
