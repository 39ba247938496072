use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clarityvote_client::{
    clarity::ClarityValue,
    current_timestamp, init_logging,
    results::{shorten_address, tally, winners},
    session::StxAddresses,
    storage::{FileStore, MemoryStore, PreferenceStore},
    CacheTtls, ClientConfig, HiroClient, Network, PollQueries, PollStatus, PollSummary,
    QueryCache, SessionManager, WalletProfile,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network for this invocation (does not change the saved preference)
    #[arg(short, long)]
    network: Option<Network>,

    /// Poll contract deployer address on testnet
    #[arg(long, env = ClientConfig::ENV_CONTRACT_TESTNET)]
    testnet_contract: Option<String>,

    /// Poll contract deployer address on mainnet
    #[arg(long, env = ClientConfig::ENV_CONTRACT_MAINNET)]
    mainnet_contract: Option<String>,

    /// Directory holding saved preferences
    #[arg(long, env = ClientConfig::ENV_HOME)]
    home: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every poll with its status
    Polls,

    /// Show the results of one poll
    Show { poll_id: u64 },

    /// Check whether an address has voted on a poll
    HasVoted {
        poll_id: u64,

        /// Defaults to the connected wallet's address
        #[arg(long)]
        voter: Option<String>,
    },

    /// Show or switch the saved network
    Network { network: Option<Network> },

    /// Save a wallet session
    Connect {
        #[arg(long)]
        testnet_address: String,

        #[arg(long)]
        mainnet_address: String,
    },

    /// Forget the saved wallet session
    Disconnect,

    /// Show wallet and network
    Status,

    /// Print the explorer link for a transaction
    Explorer { tx_id: String },

    /// Poll the contract and log status changes
    Watch {
        /// Polling interval in seconds
        #[arg(short, long, default_value = "30")]
        interval: u64,
    },
}

fn load_config(args: &Args) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(address) = &args.testnet_contract {
        config.networks.testnet.contract_address = address.trim().to_string();
    }
    if let Some(address) = &args.mainnet_contract {
        config.networks.mainnet.contract_address = address.trim().to_string();
    }
    if let Some(home) = &args.home {
        config.home_dir = home.clone();
    }
    config
}

fn open_store(config: &ClientConfig) -> Box<dyn PreferenceStore> {
    match FileStore::open(config.preferences_path()) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("preferences unavailable, using in-memory store: {}", e);
            Box::new(MemoryStore::new())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn watch(queries: &PollQueries<HiroClient>, network: Network, interval: u64) {
    let mut last_seen: HashMap<u64, PollStatus> = HashMap::new();

    loop {
        queries.cache().invalidate_all().await;
        let now = current_timestamp();
        let polls = queries.all_polls(network).await;
        for poll in polls {
            let status = PollStatus::derive(&poll, now);
            match last_seen.insert(poll.poll_id, status) {
                None => info!(poll_id = poll.poll_id, %status, title = %poll.title, "tracking poll"),
                Some(previous) if previous != status => {
                    info!(poll_id = poll.poll_id, from = %previous, to = %status, "poll status changed")
                }
                Some(_) => {}
            }
        }

        tokio::select! {
            _ = sleep(Duration::from_secs(interval)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watcher");
                return;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    });

    let config = load_config(&args);
    let mut session = SessionManager::load(open_store(&config), config.default_network);
    let network = args.network.unwrap_or_else(|| session.network());
    let queries = PollQueries::new(
        HiroClient::new(config.networks.clone()),
        config.networks.clone(),
        Arc::new(QueryCache::new(CacheTtls::default())),
    );

    if !config.networks.get(network).contract_address.is_empty() {
        info!(%network, contract = %config.networks.get(network).contract_address, "using poll contract");
    } else {
        warn!(%network, "no poll contract configured; reads will return defaults");
    }

    match args.command {
        Command::Polls => {
            let now = current_timestamp();
            let summaries: Vec<PollSummary> = queries
                .all_polls(network)
                .await
                .into_iter()
                .map(|poll| PollSummary::new(poll, now))
                .collect();
            print_json(&summaries)?;
        }
        Command::Show { poll_id } => {
            let Some(poll) = queries.poll(network, poll_id).await else {
                bail!("poll {} not found on {}", poll_id, network);
            };
            let options = queries
                .poll_options(network, poll_id, poll.option_count)
                .await;
            let tallies = tally(&poll, &options);
            let top: Vec<&str> = winners(&tallies).iter().map(|t| t.label.as_str()).collect();
            let has_voted = if session.is_connected() && network == session.network() {
                Some(queries.session_has_voted(&session, poll_id).await)
            } else {
                None
            };
            let creator = shorten_address(&poll.creator);
            print_json(&serde_json::json!({
                "poll": PollSummary::new(poll, current_timestamp()),
                "creatorShort": creator,
                "results": tallies,
                "winners": top,
                "hasVoted": has_voted,
            }))?;
        }
        Command::HasVoted { poll_id, voter } => {
            let voter = match voter.or_else(|| session.address().map(str::to_string)) {
                Some(voter) => voter,
                None => bail!("no --voter given and no wallet connected"),
            };
            let voted = queries.has_voted(network, poll_id, &voter).await;
            print_json(&serde_json::json!({ "pollId": poll_id, "voter": voter, "hasVoted": voted }))?;
        }
        Command::Network { network: None } => {
            println!("{}", session.network());
        }
        Command::Network {
            network: Some(target),
        } => {
            session.switch_network(target);
            println!("{}", session.network());
        }
        Command::Connect {
            testnet_address,
            mainnet_address,
        } => {
            ClarityValue::principal(&testnet_address)
                .with_context(|| format!("invalid testnet address '{}'", testnet_address))?;
            ClarityValue::principal(&mainnet_address)
                .with_context(|| format!("invalid mainnet address '{}'", mainnet_address))?;
            session.connect(WalletProfile {
                stx_address: StxAddresses {
                    testnet: testnet_address,
                    mainnet: mainnet_address,
                },
            });
            print_json(session.wallet())?;
        }
        Command::Disconnect => {
            session.disconnect();
            print_json(session.wallet())?;
        }
        Command::Status => {
            print_json(&serde_json::json!({
                "network": session.network(),
                "wallet": session.wallet(),
                "contract": config.networks.get(session.network()).contract_address,
            }))?;
        }
        Command::Explorer { tx_id } => {
            println!("{}", config.networks.explorer_tx_url(&tx_id, network));
        }
        Command::Watch { interval } => {
            info!("Starting poll watcher on {} every {}s", network, interval);
            if interval == 0 {
                error!("interval must be at least one second");
                bail!("invalid interval");
            }
            watch(&queries, network, interval).await;
        }
    }

    Ok(())
}
