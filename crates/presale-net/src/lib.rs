//! # presale-net: block explorer clients for the presale wallet.
//!
//! The wallet core is offline. This crate supplies the collaborators the
//! command line needs around it: unspent output lookup, broadcast, raw
//! transaction fetch and the purchase notification, each behind an async
//! trait with primary/fallback chaining.
//!
//! # Modules
//!
//! - [`traits`]: `UtxoProvider`, `Broadcaster`, `TxFetcher`, `Notifier`
//! - [`blockchain_info`]: blockchain.info client
//! - [`esplora`]: Esplora REST client
//! - [`failover`]: try providers in order
//! - [`notify`]: sale notification endpoint
//! - [`config`]: endpoints and timeouts from the environment

pub mod blockchain_info;
pub mod config;
pub mod error;
pub mod esplora;
pub mod failover;
mod http;
pub mod notify;
pub mod traits;

pub use blockchain_info::BlockchainInfo;
pub use config::NetConfig;
pub use error::NetError;
pub use esplora::Esplora;
pub use failover::{broadcast_with_fallback, fetch_with_fallback, unspent_with_fallback};
pub use notify::SaleNotifier;
pub use traits::{Broadcaster, Notifier, TxFetcher, UtxoProvider};
