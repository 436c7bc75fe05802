//! # presale-wallet: presale wallet records and purchase transactions.
//!
//! Encrypts a random seed under a password, derives the funding and
//! destination keys from it, and turns the funding address's unspent outputs
//! into a signed purchase transaction.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum and its `ErrorKind`
//! - [`encryption`]: password keys, legacy AES-CBC and sealed AES-GCM seed encryption
//! - [`keys`]: Seed and the two derived key pairs
//! - [`record`]: JSON wallet record, persistence and unlocking
//! - [`builder`]: purchase output policy and transaction builder
//! - [`signer`]: all-or-nothing input signing
//! - [`wallet`]: unlock, build and sign in one call
//! - [`purchases`]: recognising past purchases of a destination address

pub mod builder;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod purchases;
pub mod record;
pub mod signer;
pub mod wallet;

pub use builder::{PlannedOutput, TransactionBuilder, UnsignedTransaction, plan_outputs};
pub use encryption::{EncryptedSeed, PasswordKey};
pub use error::{ErrorKind, WalletError};
pub use keys::{DerivedKeys, Seed, derive_keys, derive_keys_with};
pub use purchases::{Purchase, candidate_txids, detect_purchase};
pub use record::{RecordFormat, UnlockedWallet, WalletRecord};
pub use signer::TransactionSigner;
pub use wallet::{FinalizedPurchase, finalize};
