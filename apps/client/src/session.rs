//! Wallet session and active network, owned by one explicitly constructed
//! [`SessionManager`] that is handed to queries and actions by reference.

use serde::{Deserialize, Serialize};

use crate::config::Network;
use crate::storage::PreferenceStore;
use crate::types::WalletState;

pub const NETWORK_KEY: &str = "clarityvote-network";
pub const SESSION_KEY: &str = "clarityvote-session";

/// Stored sessions with any other version are discarded on load.
pub const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StxAddresses {
    pub testnet: String,
    pub mainnet: String,
}

impl StxAddresses {
    pub fn for_network(&self, network: Network) -> Option<String> {
        let address = match network {
            Network::Testnet => &self.testnet,
            Network::Mainnet => &self.mainnet,
        };
        (!address.is_empty()).then(|| address.clone())
    }
}

/// What the wallet hands back after the user approves a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletProfile {
    pub stx_address: StxAddresses,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredSession {
    version: u32,
    profile: WalletProfile,
}

pub struct SessionManager {
    store: Box<dyn PreferenceStore>,
    network: Network,
    profile: Option<WalletProfile>,
    wallet: WalletState,
}

impl SessionManager {
    /// Reads the network preference and restores any signed-in session.
    pub fn load(store: Box<dyn PreferenceStore>, default_network: Network) -> Self {
        let network = match store.get(NETWORK_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(stored = %raw, "ignoring invalid network preference");
                default_network
            }),
            Ok(None) => default_network,
            Err(e) => {
                tracing::warn!("could not read network preference: {}", e);
                default_network
            }
        };

        let mut manager = Self {
            store,
            network,
            profile: None,
            wallet: WalletState::disconnected(),
        };
        manager.restore();
        manager
    }

    fn restore(&mut self) {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("could not read stored session: {}", e);
                return;
            }
        };

        let stale_reason = match serde_json::from_str::<StoredSession>(&raw) {
            Ok(session) if session.version == SESSION_VERSION => {
                self.apply_profile(session.profile);
                tracing::info!(network = %self.network, "restored wallet session");
                return;
            }
            Ok(session) => format!(
                "version {} does not match {}",
                session.version, SESSION_VERSION
            ),
            Err(e) => e.to_string(),
        };

        tracing::warn!("clearing stale session data: {}", stale_reason);
        self.clear();
    }

    fn apply_profile(&mut self, profile: WalletProfile) {
        self.wallet = WalletState {
            is_connected: true,
            address: profile.stx_address.for_network(self.network),
        };
        self.profile = Some(profile);
    }

    fn clear(&mut self) {
        if let Err(e) = self.store.remove(SESSION_KEY) {
            tracing::warn!("could not remove stored session: {}", e);
        }
        self.profile = None;
        self.wallet = WalletState::disconnected();
    }

    pub fn connect(&mut self, profile: WalletProfile) {
        let stored = StoredSession {
            version: SESSION_VERSION,
            profile: profile.clone(),
        };
        match serde_json::to_string(&stored) {
            Ok(json) => {
                if let Err(e) = self.store.set(SESSION_KEY, &json) {
                    tracing::warn!("could not persist wallet session: {}", e);
                }
            }
            Err(e) => tracing::warn!("could not serialize wallet session: {}", e),
        }
        self.apply_profile(profile);
        tracing::info!(address = ?self.wallet.address, "wallet connected");
    }

    pub fn disconnect(&mut self) {
        self.clear();
        tracing::info!("wallet disconnected");
    }

    pub fn switch_network(&mut self, network: Network) {
        self.network = network;
        if let Some(profile) = &self.profile {
            self.wallet.address = profile.stx_address.for_network(network);
        }
        if let Err(e) = self.store.set(NETWORK_KEY, network.as_str()) {
            tracing::warn!("could not persist network preference: {}", e);
        }
        tracing::info!(%network, "switched network");
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn wallet(&self) -> &WalletState {
        &self.wallet
    }

    pub fn is_connected(&self) -> bool {
        self.wallet.is_connected
    }

    pub fn address(&self) -> Option<&str> {
        self.wallet.address.as_deref()
    }
}
