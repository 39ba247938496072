use async_trait::async_trait;
use clarityvote_client::actions::{
    PostConditionMode, CONTRACT_NOT_CONFIGURED, TRANSACTION_FAILED, WALLET_NOT_CONNECTED,
};
use clarityvote_client::cache::CachedValue;
use clarityvote_client::clarity::ClarityValue;
use clarityvote_client::error::SignerError;
use clarityvote_client::session::StxAddresses;
use clarityvote_client::storage::MemoryStore;
use clarityvote_client::{
    ContractCallRequest, ContractFunction, ContractSigner, Network, NetworkConfig, Networks,
    PollActions, QueryCache, QueryKey, SessionManager, TxState, WalletProfile,
};
use std::sync::{Arc, Mutex};

const CONTRACT: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
const VOTER: &str = "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";

#[derive(Clone)]
enum Outcome {
    Broadcast(&'static str),
    Cancel,
    Fail(&'static str),
}

struct ScriptedSigner {
    outcome: Outcome,
    requests: Mutex<Vec<ContractCallRequest>>,
}

impl ScriptedSigner {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> ContractCallRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("signer was called")
    }
}

#[async_trait]
impl ContractSigner for ScriptedSigner {
    async fn sign_and_broadcast(&self, request: ContractCallRequest) -> Result<String, SignerError> {
        self.requests.lock().unwrap().push(request);
        match self.outcome.clone() {
            Outcome::Broadcast(tx_id) => Ok(tx_id.to_string()),
            Outcome::Cancel => Err(SignerError::Cancelled),
            Outcome::Fail(message) => Err(SignerError::Failed(message.to_string())),
        }
    }
}

fn networks(testnet_contract: &str) -> Networks {
    Networks {
        testnet: NetworkConfig::testnet(testnet_contract),
        mainnet: NetworkConfig::mainnet(""),
    }
}

fn connected_session() -> SessionManager {
    let mut session = SessionManager::load(Box::new(MemoryStore::new()), Network::Testnet);
    session.connect(WalletProfile {
        stx_address: StxAddresses {
            testnet: VOTER.to_string(),
            mainnet: String::new(),
        },
    });
    session
}

fn disconnected_session() -> SessionManager {
    SessionManager::load(Box::new(MemoryStore::new()), Network::Testnet)
}

fn actions(outcome: Outcome, contract: &str) -> (PollActions<ScriptedSigner>, Arc<QueryCache>) {
    let cache = Arc::new(QueryCache::default());
    let actions = PollActions::new(
        ScriptedSigner::new(outcome),
        networks(contract),
        Arc::clone(&cache),
    );
    (actions, cache)
}

// ========================================
// Guard tests
// ========================================

#[tokio::test]
async fn test_no_wallet_errors_without_signer_call() {
    let (mut actions, _) = actions(Outcome::Broadcast("0x01"), CONTRACT);
    let session = disconnected_session();

    let state = actions.vote(&session, 1, 0).await.clone();
    assert_eq!(
        state,
        TxState::Error {
            message: WALLET_NOT_CONNECTED.to_string()
        }
    );
    assert_eq!(actions.signer().call_count(), 0, "signer must not be invoked");

    actions
        .create_poll(&session, "Lunch?", &["A".to_string(), "B".to_string()], 3_600)
        .await;
    actions.close_poll(&session, 1).await;
    assert_eq!(actions.signer().call_count(), 0);
}

#[tokio::test]
async fn test_unconfigured_contract_errors_without_signer_call() {
    let (mut actions, _) = actions(Outcome::Broadcast("0x01"), "");
    let session = connected_session();

    let state = actions.close_poll(&session, 1).await;
    assert_eq!(state.error(), Some(CONTRACT_NOT_CONFIGURED));
    assert_eq!(actions.signer().call_count(), 0);
}

#[tokio::test]
async fn test_mainnet_without_contract_is_unconfigured() {
    let (mut actions, _) = actions(Outcome::Broadcast("0x01"), CONTRACT);
    let mut session = connected_session();
    session.switch_network(Network::Mainnet);

    let state = actions.vote(&session, 1, 0).await;
    assert_eq!(state.error(), Some(CONTRACT_NOT_CONFIGURED));
}

// ========================================
// Signing outcome tests
// ========================================

#[tokio::test]
async fn test_vote_success_carries_tx_id_and_request() {
    let (mut actions, _) = actions(Outcome::Broadcast("0xfeed"), CONTRACT);
    let session = connected_session();

    let state = actions.vote(&session, 4, 2).await;
    assert_eq!(state.tx_id(), Some("0xfeed"));

    let request = actions.signer().last_request();
    assert_eq!(request.network, Network::Testnet);
    assert_eq!(request.contract_address, CONTRACT);
    assert_eq!(request.contract_name, "poll");
    assert_eq!(request.function, ContractFunction::Vote);
    assert_eq!(
        request.function_args,
        vec![ClarityValue::uint(4u64), ClarityValue::uint(2u64)]
    );
    assert_eq!(request.post_condition_mode, PostConditionMode::Deny);
    assert_eq!(
        actions.explorer_url(Network::Testnet).as_deref(),
        Some("https://explorer.stacks.co/txid/0xfeed?chain=testnet")
    );
}

#[tokio::test]
async fn test_create_poll_encodes_arguments() {
    let (mut actions, _) = actions(Outcome::Broadcast("0xabc"), CONTRACT);
    let session = connected_session();

    actions
        .create_poll(
            &session,
            "Best lunch?",
            &["Tacos".to_string(), "Pizza".to_string()],
            86_400,
        )
        .await;

    let request = actions.signer().last_request();
    assert_eq!(request.function, ContractFunction::CreatePoll);
    assert_eq!(
        request.function_args,
        vec![
            ClarityValue::StringAscii("Best lunch?".into()),
            ClarityValue::List(vec![
                ClarityValue::StringAscii("Tacos".into()),
                ClarityValue::StringAscii("Pizza".into()),
            ]),
            ClarityValue::uint(86_400u64),
        ]
    );
}

#[tokio::test]
async fn test_non_ascii_title_errors_before_signing() {
    let (mut actions, _) = actions(Outcome::Broadcast("0xabc"), CONTRACT);
    let session = connected_session();

    let state = actions
        .create_poll(&session, "Caf\u{e9}?", &["Yes".to_string()], 60)
        .await;
    assert!(state.error().is_some());
    assert_eq!(actions.signer().call_count(), 0);
}

#[tokio::test]
async fn test_cancel_resets_to_idle() {
    let (mut actions, _) = actions(Outcome::Cancel, CONTRACT);
    let session = connected_session();

    let state = actions.vote(&session, 1, 0).await;
    assert_eq!(*state, TxState::Idle, "cancellation is not an error");
    assert_eq!(actions.signer().call_count(), 1);
}

#[tokio::test]
async fn test_failure_carries_message() {
    let (mut actions, _) = actions(Outcome::Fail("ConflictingNonceInMempool"), CONTRACT);
    let session = connected_session();

    let state = actions.close_poll(&session, 1).await;
    assert_eq!(state.error(), Some("ConflictingNonceInMempool"));
}

#[tokio::test]
async fn test_failure_without_message_uses_fallback() {
    let (mut actions, _) = actions(Outcome::Fail(""), CONTRACT);
    let session = connected_session();

    let state = actions.close_poll(&session, 1).await;
    assert_eq!(state.error(), Some(TRANSACTION_FAILED));
}

#[tokio::test]
async fn test_terminal_state_held_until_reset() {
    let (mut actions, _) = actions(Outcome::Fail("rejected"), CONTRACT);
    let session = connected_session();

    actions.vote(&session, 1, 0).await;
    assert!(actions.state().error().is_some());
    assert!(actions.state().error().is_some(), "state does not decay on its own");

    actions.reset();
    assert!(actions.state().is_idle());
    assert_eq!(actions.explorer_url(Network::Testnet), None);
}

// ========================================
// Cache invalidation tests
// ========================================

async fn seed(cache: &QueryCache, keys: &[QueryKey]) {
    for key in keys {
        cache.insert(key.clone(), CachedValue::Flag(true)).await;
    }
}

#[tokio::test]
async fn test_vote_invalidates_only_that_poll() {
    let (mut actions, cache) = actions(Outcome::Broadcast("0x01"), CONTRACT);
    let session = connected_session();
    let net = Network::Testnet;
    let p = [
        QueryKey::Poll(net, 1),
        QueryKey::PollOptions(net, 1, 3),
        QueryKey::HasVoted(net, 1, VOTER.to_string()),
    ];
    let q = [
        QueryKey::Poll(net, 2),
        QueryKey::PollOptions(net, 2, 2),
        QueryKey::HasVoted(net, 2, VOTER.to_string()),
    ];
    seed(&cache, &p).await;
    seed(&cache, &q).await;
    seed(&cache, &[QueryKey::PollCount(net)]).await;

    actions.vote(&session, 1, 0).await;

    for key in &p {
        assert!(!cache.contains(key).await, "{:?} should be invalidated", key);
        assert_eq!(cache.invalidation_count(key).await, 1, "{:?} invalidated once", key);
    }
    for key in &q {
        assert!(cache.contains(key).await, "{:?} should be untouched", key);
        assert_eq!(cache.invalidation_count(key).await, 0);
    }
    assert!(cache.contains(&QueryKey::PollCount(net)).await);
}

#[tokio::test]
async fn test_close_poll_invalidates_only_that_poll() {
    let (mut actions, cache) = actions(Outcome::Broadcast("0x03"), CONTRACT);
    let session = connected_session();
    let net = Network::Testnet;
    let closed = [
        QueryKey::Poll(net, 5),
        QueryKey::PollOptions(net, 5, 2),
        QueryKey::HasVoted(net, 5, VOTER.to_string()),
        QueryKey::Vote(net, 5, VOTER.to_string()),
    ];
    let other = [
        QueryKey::Poll(net, 6),
        QueryKey::PollOptions(net, 6, 2),
        QueryKey::AllPolls(net, 6),
    ];
    seed(&cache, &closed).await;
    seed(&cache, &other).await;

    let state = actions.close_poll(&session, 5).await;
    assert_eq!(state.tx_id(), Some("0x03"));
    assert_eq!(actions.signer().last_request().function, ContractFunction::ClosePoll);

    for key in &closed {
        assert!(!cache.contains(key).await, "{:?} should be invalidated", key);
        assert_eq!(cache.invalidation_count(key).await, 1, "{:?} invalidated once", key);
    }
    for key in &other {
        assert!(cache.contains(key).await, "{:?} should be untouched", key);
    }
}

#[tokio::test]
async fn test_failed_vote_leaves_cache_alone() {
    let (mut actions, cache) = actions(Outcome::Fail("nope"), CONTRACT);
    let session = connected_session();
    let key = QueryKey::Poll(Network::Testnet, 1);
    seed(&cache, &[key.clone()]).await;

    actions.vote(&session, 1, 0).await;
    assert!(cache.contains(&key).await);
}

#[tokio::test]
async fn test_create_poll_invalidates_aggregates() {
    let (mut actions, cache) = actions(Outcome::Broadcast("0x02"), CONTRACT);
    let session = connected_session();
    let net = Network::Testnet;
    seed(
        &cache,
        &[
            QueryKey::PollCount(net),
            QueryKey::AllPolls(net, 4),
            QueryKey::Poll(net, 1),
        ],
    )
    .await;

    actions
        .create_poll(&session, "New", &["A".to_string(), "B".to_string()], 600)
        .await;

    assert!(!cache.contains(&QueryKey::PollCount(net)).await);
    assert!(!cache.contains(&QueryKey::AllPolls(net, 4)).await);
    assert!(cache.contains(&QueryKey::Poll(net, 1)).await);
}
