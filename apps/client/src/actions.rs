//! State-changing poll actions and their transaction state machine.
//!
//! `Idle -> Pending -> Success | Error`, with `Success` / `Error` held until
//! the caller resets. A wallet-side cancellation returns straight to `Idle`.
//! Nothing is retried here; a failed action is re-initiated by the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::QueryCache;
use crate::clarity::ClarityValue;
use crate::config::{Network, Networks};
use crate::contract::{ContractFunction, PollContract};
use crate::error::{ClarityError, SignerError};
use crate::session::SessionManager;

pub const WALLET_NOT_CONNECTED: &str = "Wallet not connected";
pub const CONTRACT_NOT_CONFIGURED: &str = "Contract address not configured for this network";
pub const TRANSACTION_FAILED: &str = "Transaction failed";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TxState {
    #[default]
    Idle,
    Pending,
    Success {
        tx_id: String,
    },
    Error {
        message: String,
    },
}

impl TxState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TxState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TxState::Pending)
    }

    pub fn tx_id(&self) -> Option<&str> {
        match self {
            TxState::Success { tx_id } => Some(tx_id),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TxState::Error { message } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostConditionMode {
    Allow,
    Deny,
}

/// Everything the wallet needs to build, sign and broadcast a contract call.
/// Calls from this client carry no post-conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallRequest {
    pub network: Network,
    pub contract_address: String,
    pub contract_name: String,
    pub function: ContractFunction,
    pub function_args: Vec<ClarityValue>,
    pub post_condition_mode: PostConditionMode,
}

/// The external wallet's signing and broadcast flow.
#[async_trait]
pub trait ContractSigner: Send + Sync {
    /// Resolves to the broadcast transaction id.
    async fn sign_and_broadcast(&self, request: ContractCallRequest) -> Result<String, SignerError>;
}

pub struct PollActions<S> {
    signer: S,
    networks: Networks,
    cache: Arc<QueryCache>,
    state: TxState,
}

impl<S: ContractSigner> PollActions<S> {
    pub fn new(signer: S, networks: Networks, cache: Arc<QueryCache>) -> Self {
        Self {
            signer,
            networks,
            cache,
            state: TxState::Idle,
        }
    }

    pub fn state(&self) -> &TxState {
        &self.state
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn reset(&mut self) {
        self.state = TxState::Idle;
    }

    /// Explorer link for the last successful transaction.
    pub fn explorer_url(&self, network: Network) -> Option<String> {
        self.state
            .tx_id()
            .map(|tx_id| self.networks.explorer_tx_url(tx_id, network))
    }

    pub async fn create_poll(
        &mut self,
        session: &SessionManager,
        title: &str,
        options: &[String],
        duration_seconds: u64,
    ) -> &TxState {
        tracing::info!(title, options = options.len(), duration_seconds, "create-poll requested");
        let submitted = self
            .submit(session, ContractFunction::CreatePoll, || {
                let options = options
                    .iter()
                    .map(|o| ClarityValue::string_ascii(o.as_str()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(vec![
                    ClarityValue::string_ascii(title)?,
                    ClarityValue::List(options),
                    ClarityValue::uint(duration_seconds),
                ])
            })
            .await;
        if submitted {
            self.cache.invalidate_all().await;
        }
        &self.state
    }

    pub async fn vote(
        &mut self,
        session: &SessionManager,
        poll_id: u64,
        option_index: u64,
    ) -> &TxState {
        tracing::info!(poll_id, option_index, "vote requested");
        let submitted = self
            .submit(session, ContractFunction::Vote, || {
                Ok(vec![
                    ClarityValue::uint(poll_id),
                    ClarityValue::uint(option_index),
                ])
            })
            .await;
        if submitted {
            self.cache.invalidate_poll(session.network(), poll_id).await;
        }
        &self.state
    }

    pub async fn close_poll(&mut self, session: &SessionManager, poll_id: u64) -> &TxState {
        tracing::info!(poll_id, "close-poll requested");
        let submitted = self
            .submit(session, ContractFunction::ClosePoll, || {
                Ok(vec![ClarityValue::uint(poll_id)])
            })
            .await;
        if submitted {
            self.cache.invalidate_poll(session.network(), poll_id).await;
        }
        &self.state
    }

    fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("transaction failed: {}", message);
        self.state = TxState::Error { message };
    }

    /// Runs the guarded signing flow; `true` once a transaction id came back.
    async fn submit<F>(
        &mut self,
        session: &SessionManager,
        function: ContractFunction,
        build_args: F,
    ) -> bool
    where
        F: FnOnce() -> Result<Vec<ClarityValue>, ClarityError>,
    {
        if !session.is_connected() {
            self.fail(WALLET_NOT_CONNECTED);
            return false;
        }
        let network = session.network();
        let contract = PollContract::resolve(&self.networks, network);
        if !contract.is_configured() {
            self.fail(CONTRACT_NOT_CONFIGURED);
            return false;
        }

        self.state = TxState::Pending;

        let function_args = match build_args() {
            Ok(args) => args,
            Err(e) => {
                self.fail(e.to_string());
                return false;
            }
        };
        let request = ContractCallRequest {
            network,
            contract_address: contract.address,
            contract_name: contract.name,
            function,
            function_args,
            post_condition_mode: PostConditionMode::Deny,
        };

        match self.signer.sign_and_broadcast(request).await {
            Ok(tx_id) => {
                tracing::info!(%function, %tx_id, "transaction broadcast");
                self.state = TxState::Success { tx_id };
                true
            }
            Err(SignerError::Cancelled) => {
                tracing::info!(%function, "user cancelled transaction");
                self.state = TxState::Idle;
                false
            }
            Err(SignerError::Failed(message)) => {
                if message.trim().is_empty() {
                    self.fail(TRANSACTION_FAILED);
                } else {
                    self.fail(message);
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_state_accessors() {
        assert!(TxState::default().is_idle());
        assert!(TxState::Pending.is_pending());
        let success = TxState::Success {
            tx_id: "0xabc".into(),
        };
        assert_eq!(success.tx_id(), Some("0xabc"));
        assert_eq!(success.error(), None);
        let error = TxState::Error {
            message: "boom".into(),
        };
        assert_eq!(error.error(), Some("boom"));
    }

    #[test]
    fn test_tx_state_serializes_with_status_tag() {
        let json = serde_json::to_value(TxState::Success {
            tx_id: "0xabc".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "status": "success", "tx_id": "0xabc" }));
        assert_eq!(
            serde_json::to_value(TxState::Idle).unwrap(),
            serde_json::json!({ "status": "idle" })
        );
    }
}
