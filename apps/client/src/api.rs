//! Read-only contract calls against a Stacks node's HTTP API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clarity::ClarityValue;
use crate::config::{Network, Networks};
use crate::contract::{ContractFunction, PollContract};
use crate::error::CallError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlyCall {
    pub network: Network,
    pub contract: PollContract,
    pub function: ContractFunction,
    pub arguments: Vec<ClarityValue>,
    /// Principal the node evaluates `tx-sender` as.
    pub sender: String,
}

impl ReadOnlyCall {
    pub fn new(
        network: Network,
        contract: PollContract,
        function: ContractFunction,
        arguments: Vec<ClarityValue>,
    ) -> Self {
        let sender = contract.address.clone();
        Self {
            network,
            contract,
            function,
            arguments,
            sender,
        }
    }
}

#[async_trait]
pub trait ReadOnlyCaller: Send + Sync {
    async fn call_read_only(&self, call: &ReadOnlyCall) -> Result<ClarityValue, CallError>;
}

#[derive(Debug, Serialize)]
struct CallReadRequest<'a> {
    sender: &'a str,
    arguments: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CallReadResponse {
    okay: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    cause: Option<String>,
}

/// `POST /v2/contracts/call-read/{address}/{name}/{function}` over reqwest.
#[derive(Debug, Clone)]
pub struct HiroClient {
    http: reqwest::Client,
    networks: Networks,
}

impl HiroClient {
    pub fn new(networks: Networks) -> Self {
        Self {
            http: reqwest::Client::new(),
            networks,
        }
    }

    pub fn with_client(http: reqwest::Client, networks: Networks) -> Self {
        Self { http, networks }
    }

    pub fn call_url(&self, call: &ReadOnlyCall) -> String {
        format!(
            "{}/v2/contracts/call-read/{}/{}/{}",
            self.networks.get(call.network).api_url.trim_end_matches('/'),
            call.contract.address,
            call.contract.name,
            call.function.as_str()
        )
    }
}

fn encode_arguments(arguments: &[ClarityValue]) -> Result<Vec<String>, CallError> {
    arguments
        .iter()
        .map(|arg| arg.to_hex().map_err(CallError::from))
        .collect()
}

fn decode_response(response: CallReadResponse) -> Result<ClarityValue, CallError> {
    if !response.okay {
        return Err(CallError::Rejected(
            response.cause.unwrap_or_else(|| "unknown cause".to_string()),
        ));
    }
    let result = response
        .result
        .ok_or_else(|| CallError::Other("okay response without result".to_string()))?;
    Ok(ClarityValue::from_hex(&result)?)
}

#[async_trait]
impl ReadOnlyCaller for HiroClient {
    async fn call_read_only(&self, call: &ReadOnlyCall) -> Result<ClarityValue, CallError> {
        let url = self.call_url(call);
        let body = CallReadRequest {
            sender: &call.sender,
            arguments: encode_arguments(&call.arguments)?,
        };
        tracing::debug!(%url, function = %call.function, "read-only call");

        let response: CallReadResponse = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        decode_response(response)
    }
}
