//! Collaborator interfaces the wallet core depends on.
//!
//! The wallet crates never call these themselves; the CLI wires concrete
//! providers in and passes plain data (UTXO lists, signed transactions) to
//! the core. Tests substitute in-memory mocks.

use async_trait::async_trait;

use presale_core::address::FundingAddress;
use presale_core::types::{Transaction, Txid, Utxo};
use presale_wallet::WalletRecord;

use crate::error::NetError;

/// Lists the unspent outputs of an address.
#[async_trait]
pub trait UtxoProvider: Send + Sync {
    /// Provider name for logs and error reports.
    fn name(&self) -> &'static str;

    async fn unspent(&self, address: &FundingAddress) -> Result<Vec<Utxo>, NetError>;
}

/// Relays a signed transaction to the funding chain.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    fn name(&self) -> &'static str;

    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, NetError>;
}

/// Fetches the raw bytes of a confirmed or mempool transaction.
#[async_trait]
pub trait TxFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_transaction(&self, txid: &Txid) -> Result<Vec<u8>, NetError>;
}

/// Tells the sale about a broadcast purchase.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_purchase(&self, tx: &Transaction, record: &WalletRecord) -> Result<(), NetError>;
}
