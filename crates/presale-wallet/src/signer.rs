//! Signing of purchase transactions.
//!
//! All inputs spend the same funding address, so one key signs every input.
//! Signing is all-or-nothing: the first failure discards the work and no
//! partially signed transaction escapes.

use presale_core::crypto::{KeyPair, sign_transaction_input, verify_transaction_input};
use presale_core::ecdsa::{EcdsaBackend, preferred_backend};
use presale_core::types::Transaction;

use crate::builder::UnsignedTransaction;
use crate::error::WalletError;

/// Signs every input of an [`UnsignedTransaction`] with the funding key.
#[derive(Debug, Clone, Copy)]
pub struct TransactionSigner<'a> {
    backend: &'a dyn EcdsaBackend,
}

impl TransactionSigner<'static> {
    /// Signer using [`preferred_backend`].
    pub fn new() -> Self {
        Self {
            backend: preferred_backend(),
        }
    }
}

impl Default for TransactionSigner<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TransactionSigner<'a> {
    pub fn with_backend(backend: &'a dyn EcdsaBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &'a dyn EcdsaBackend {
        self.backend
    }

    /// Sign inputs in index order and check each signature.
    pub fn sign(&self, unsigned: UnsignedTransaction, keypair: &KeyPair) -> Result<Transaction, WalletError> {
        let owner = unsigned.spent_script.p2pkh_hash();
        if owner != Some(keypair.public_key().pubkey_hash()) {
            return Err(WalletError::Signing {
                index: 0,
                reason: "signing key does not own the spent outputs".into(),
            });
        }

        let mut tx = unsigned.tx;
        for index in 0..tx.inputs.len() {
            sign_transaction_input(&mut tx, index, &unsigned.spent_script, keypair, self.backend)
                .and_then(|()| verify_transaction_input(&tx, index, &unsigned.spent_script, self.backend))
                .map_err(|e| WalletError::Signing {
                    index,
                    reason: e.to_string(),
                })?;
        }

        tracing::debug!(
            inputs = tx.inputs.len(),
            backend = self.backend.name(),
            "signed purchase transaction"
        );
        Ok(tx)
    }
}
