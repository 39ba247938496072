use std::sync::Arc;

pub mod actions;
pub mod api;
pub mod cache;
pub mod clarity;
pub mod config;
pub mod contract;
pub mod error;
pub mod normalize;
pub mod queries;
pub mod results;
pub mod session;
pub mod status;
pub mod storage;
pub mod types;

pub use actions::{ContractCallRequest, ContractSigner, PollActions, TxState};
pub use api::{HiroClient, ReadOnlyCall, ReadOnlyCaller};
pub use cache::{CacheTtls, QueryCache, QueryKey};
pub use config::{ClientConfig, Network, NetworkConfig, Networks};
pub use contract::{ContractFunction, PollContract, POLL_CONTRACT_NAME};
pub use normalize::{normalize_option, normalize_poll, RawValue};
pub use queries::PollQueries;
pub use session::{SessionManager, WalletProfile};
pub use status::{format_time_left, PollStatus};
pub use types::{Poll, PollOption, VoteRecord, WalletState};

/// Poll summary as shown in listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PollSummary {
    #[serde(flatten)]
    pub poll: Poll,
    pub status: PollStatus,
    pub time_left: String,
}

impl PollSummary {
    pub fn new(poll: Poll, now: u64) -> Self {
        let status = PollStatus::derive(&poll, now);
        let time_left = format_time_left(poll.deadline, now);
        Self {
            poll,
            status,
            time_left,
        }
    }
}

/// Queries and actions wired to one shared cache.
pub fn build_client<C, S>(
    caller: C,
    signer: S,
    networks: Networks,
    ttls: CacheTtls,
) -> (PollQueries<C>, PollActions<S>)
where
    C: ReadOnlyCaller,
    S: ContractSigner,
{
    let cache = Arc::new(QueryCache::new(ttls));
    (
        PollQueries::new(caller, networks.clone(), Arc::clone(&cache)),
        PollActions::new(signer, networks, cache),
    )
}

/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
