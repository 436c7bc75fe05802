//! Wallet error types.

use presale_core::error::{AddressError, CryptoError, TransactionError};
use thiserror::Error;

/// Broad category of a [`WalletError`], for callers that only need to decide
/// how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The decrypted seed does not match the record (usually a wrong password).
    Integrity,
    /// The funding balance cannot pay for a purchase.
    Funds,
    /// Key or signature failure.
    Signature,
    /// Reading or writing the wallet record failed.
    Persistence,
    /// A caller-supplied value was rejected.
    Input,
}

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The decrypted seed does not reproduce the stored destination address.
    #[error("integrity check failed: wrong password or corrupted wallet")]
    IntegrityCheckFailed,

    /// The funding address holds nothing.
    #[error("no funds available")]
    NoFunds,

    /// Funding balance below the minimum purchase.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Available balance in satoshis.
        have: u64,
        /// Required amount in satoshis.
        need: u64,
    },

    /// Key derivation or ECDSA failure from presale-core.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Signing one input failed; nothing was signed.
    #[error("signing input {index}: {reason}")]
    Signing { index: usize, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Wallet file is corrupted or has invalid format.
    #[error("corrupted file: {0}")]
    CorruptedFile(String),

    /// Refused to overwrite an existing wallet file.
    #[error("wallet file already exists: {0}")]
    AlreadyExists(String),

    /// Wallet record version not understood by this build.
    #[error("unsupported wallet version: {0}")]
    UnsupportedVersion(u32),

    /// Serialization error.
    #[error("serialization: {0}")]
    Serialization(String),

    /// Seed shorter than the minimum length.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid address string.
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    /// Encryption failure.
    #[error("encryption: {0}")]
    Encryption(String),

    /// Transaction encoding error from presale-core.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::IntegrityCheckFailed => ErrorKind::Integrity,
            WalletError::NoFunds | WalletError::InsufficientFunds { .. } => ErrorKind::Funds,
            WalletError::Crypto(_) | WalletError::Signing { .. } => ErrorKind::Signature,
            WalletError::IoError(_)
            | WalletError::CorruptedFile(_)
            | WalletError::AlreadyExists(_)
            | WalletError::UnsupportedVersion(_)
            | WalletError::Serialization(_) => ErrorKind::Persistence,
            WalletError::InvalidSeed(_)
            | WalletError::InvalidAmount(_)
            | WalletError::InvalidAddress(_)
            | WalletError::Encryption(_)
            | WalletError::Transaction(_) => ErrorKind::Input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_insufficient_funds() {
        let e = WalletError::InsufficientFunds {
            have: 500_000,
            need: 1_000_000,
        };
        assert_eq!(e.to_string(), "insufficient funds: have 500000, need 1000000");
    }

    #[test]
    fn display_signing() {
        let e = WalletError::Signing {
            index: 2,
            reason: "invalid secret key".into(),
        };
        assert_eq!(e.to_string(), "signing input 2: invalid secret key");
    }

    #[test]
    fn from_crypto_error() {
        let wallet: WalletError = CryptoError::InvalidSecretKey.into();
        assert_eq!(wallet, WalletError::Crypto(CryptoError::InvalidSecretKey));
        assert_eq!(wallet.kind(), ErrorKind::Signature);
    }

    #[test]
    fn from_address_error() {
        let wallet: WalletError = AddressError::InvalidChecksum.into();
        assert_eq!(wallet.to_string(), "invalid checksum");
        assert_eq!(wallet.kind(), ErrorKind::Input);
    }

    #[test]
    fn kinds() {
        assert_eq!(WalletError::IntegrityCheckFailed.kind(), ErrorKind::Integrity);
        assert_eq!(WalletError::NoFunds.kind(), ErrorKind::Funds);
        assert_eq!(
            WalletError::InsufficientFunds { have: 1, need: 2 }.kind(),
            ErrorKind::Funds
        );
        assert_eq!(WalletError::AlreadyExists("w.json".into()).kind(), ErrorKind::Persistence);
        assert_eq!(WalletError::UnsupportedVersion(9).kind(), ErrorKind::Persistence);
        assert_eq!(WalletError::InvalidSeed("short".into()).kind(), ErrorKind::Input);
    }
}
