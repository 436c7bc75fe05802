//! High-level purchase flow: unlock, build, sign.
//!
//! [`finalize`] is the only place that sees the password, the seed and the
//! unspent outputs together. It never touches the network; fetching UTXOs
//! and broadcasting the result belong to the caller.

use presale_core::address::EthAddress;
use presale_core::ecdsa::EcdsaBackend;
use presale_core::types::{Transaction, Txid, Utxo};

use crate::builder::TransactionBuilder;
use crate::error::WalletError;
use crate::record::WalletRecord;
use crate::signer::TransactionSigner;

/// A signed purchase and its accounting.
#[derive(Debug, Clone)]
pub struct FinalizedPurchase {
    pub tx: Transaction,
    pub txid: Txid,
    /// Destination address marked in the dust output.
    pub destination: EthAddress,
    /// Total spent from the funding address.
    pub balance: u64,
    /// Amount returned to the funding address, if any.
    pub change: Option<u64>,
    /// Miner fee.
    pub fee: u64,
}

/// Unlock `record`, spend all `utxos` into a purchase and sign it.
///
/// `destination` overrides the record's own destination address. The
/// integrity check always runs against the record's address first.
pub fn finalize(
    record: &WalletRecord,
    utxos: &[Utxo],
    password: &[u8],
    destination: Option<EthAddress>,
    backend: &dyn EcdsaBackend,
) -> Result<FinalizedPurchase, WalletError> {
    let unlocked = record.unlock_with(password, backend)?;
    let keys = unlocked.keys();

    let destination = match destination {
        Some(custom) if custom != keys.destination_address => {
            tracing::warn!(
                custom = %custom,
                wallet = %keys.destination_address,
                "purchase credits a destination address not controlled by this wallet"
            );
            custom
        }
        _ => keys.destination_address,
    };

    let unsigned = TransactionBuilder::new().build(utxos, &destination, &keys.funding_address)?;
    let balance = unsigned.balance;
    let fee = unsigned.fee;
    let change = unsigned.tx.outputs.get(2).map(|o| o.value);
    if let Some(change) = change {
        tracing::warn!(change, "balance above purchase maximum, returning change to funding address");
    }

    let tx = TransactionSigner::with_backend(backend).sign(unsigned, &keys.funding)?;
    let txid = tx.txid();
    tracing::info!(%txid, balance, fee, inputs = tx.inputs.len(), "purchase transaction signed");

    Ok(FinalizedPurchase {
        tx,
        txid,
        destination,
        balance,
        change,
        fee,
    })
}
