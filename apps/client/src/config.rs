use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

pub const TESTNET_API_URL: &str = "https://api.testnet.hiro.so";
pub const MAINNET_API_URL: &str = "https://api.hiro.so";
pub const TESTNET_EXPLORER_URL: &str = "https://explorer.stacks.co/?chain=testnet";
pub const MAINNET_EXPLORER_URL: &str = "https://explorer.stacks.co";

const TESTNET_CHAIN_PARAM: &str = "?chain=testnet";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Testnet, Network::Mainnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    /// c32 version byte for single-sig (p2pkh) addresses on this network.
    pub fn address_version(&self) -> u8 {
        match self {
            Network::Testnet => 26,
            Network::Mainnet => 22,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Connection parameters for one deployment of the poll contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub api_url: String,
    pub explorer_url: String,
    /// Empty when no contract is deployed/configured for the network.
    pub contract_address: String,
}

impl NetworkConfig {
    pub fn testnet(contract_address: impl Into<String>) -> Self {
        Self {
            api_url: TESTNET_API_URL.to_string(),
            explorer_url: TESTNET_EXPLORER_URL.to_string(),
            contract_address: contract_address.into(),
        }
    }

    pub fn mainnet(contract_address: impl Into<String>) -> Self {
        Self {
            api_url: MAINNET_API_URL.to_string(),
            explorer_url: MAINNET_EXPLORER_URL.to_string(),
            contract_address: contract_address.into(),
        }
    }
}

/// Static lookup from [`Network`] to its [`NetworkConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Networks {
    pub testnet: NetworkConfig,
    pub mainnet: NetworkConfig,
}

impl Default for Networks {
    fn default() -> Self {
        Self {
            testnet: NetworkConfig::testnet(""),
            mainnet: NetworkConfig::mainnet(""),
        }
    }
}

impl Networks {
    pub fn get(&self, network: Network) -> &NetworkConfig {
        match network {
            Network::Testnet => &self.testnet,
            Network::Mainnet => &self.mainnet,
        }
    }

    pub fn get_mut(&mut self, network: Network) -> &mut NetworkConfig {
        match network {
            Network::Testnet => &mut self.testnet,
            Network::Mainnet => &mut self.mainnet,
        }
    }

    pub fn explorer_tx_url(&self, tx_id: &str, network: Network) -> String {
        let base = self
            .get(network)
            .explorer_url
            .replace(TESTNET_CHAIN_PARAM, "");
        let chain_param = match network {
            Network::Testnet => TESTNET_CHAIN_PARAM,
            Network::Mainnet => "",
        };
        format!("{}/txid/{}{}", base, tx_id, chain_param)
    }
}

/// Process configuration, assembled from the environment and CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub default_network: Network,
    pub networks: Networks,
    pub home_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_network: Network::Testnet,
            networks: Networks::default(),
            home_dir: PathBuf::from(".clarityvote"),
        }
    }
}

impl ClientConfig {
    pub const ENV_DEFAULT_NETWORK: &'static str = "CLARITYVOTE_DEFAULT_NETWORK";
    pub const ENV_CONTRACT_TESTNET: &'static str = "CLARITYVOTE_CONTRACT_TESTNET";
    pub const ENV_CONTRACT_MAINNET: &'static str = "CLARITYVOTE_CONTRACT_MAINNET";
    pub const ENV_API_TESTNET: &'static str = "CLARITYVOTE_API_TESTNET";
    pub const ENV_API_MAINNET: &'static str = "CLARITYVOTE_API_MAINNET";
    pub const ENV_HOME: &'static str = "CLARITYVOTE_HOME";

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unknown or empty values
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = non_empty(Self::ENV_DEFAULT_NETWORK) {
            match raw.parse() {
                Ok(network) => config.default_network = network,
                Err(e) => tracing::warn!("ignoring {}: {}", Self::ENV_DEFAULT_NETWORK, e),
            }
        }
        if let Some(address) = non_empty(Self::ENV_CONTRACT_TESTNET) {
            config.networks.testnet.contract_address = address.trim().to_string();
        }
        if let Some(address) = non_empty(Self::ENV_CONTRACT_MAINNET) {
            config.networks.mainnet.contract_address = address.trim().to_string();
        }
        if let Some(url) = non_empty(Self::ENV_API_TESTNET) {
            config.networks.testnet.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = non_empty(Self::ENV_API_MAINNET) {
            config.networks.mainnet.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(home) = non_empty(Self::ENV_HOME) {
            config.home_dir = PathBuf::from(home);
        }
        config
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.home_dir.join("preferences.json")
    }
}
