//! Shared fixtures for the end-to-end and property tests.

use presale_core::crypto::verify_transaction_input;
use presale_core::ecdsa::preferred_backend;
use presale_core::error::CryptoError;
use presale_core::script::Script;
use presale_core::types::{Transaction, Txid, Utxo};
use presale_wallet::Seed;

/// Seed bytes 0x00..0x1f.
pub fn counting_seed() -> Seed {
    Seed::from_bytes((0u8..32).collect()).expect("32-byte seed")
}

/// Distinct unspent outputs whose values sum to the inputs.
pub fn utxos(values: &[u64]) -> Vec<Utxo> {
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| Utxo::new(Txid([i as u8 + 1; 32]), i as u32, value))
        .collect()
}

/// Verify every input of `tx` as a spend of `spent_script`.
pub fn verify_all(tx: &Transaction, spent_script: &Script) -> Result<(), CryptoError> {
    (0..tx.inputs.len()).try_for_each(|i| verify_transaction_input(tx, i, spent_script, preferred_backend()))
}
