//! Error types for the presale core primitives.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid secret key")] InvalidSecretKey,
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error("pubkey hash does not match spent output")] PubkeyHashMismatch,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
    #[error("malformed unlocking script on input {0}")] MalformedScriptSig(usize),
    #[error("spent script is not pay-to-pubkey-hash")] UnsupportedSpentScript,
    #[error("{backend} backend: {reason}")] Backend { backend: &'static str, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid length: expected {expected}, got {got}")] InvalidLength { expected: usize, got: usize },
    #[error("invalid version byte: {0:#04x}")] InvalidVersion(u8),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")] UnexpectedEof { needed: usize, remaining: usize },
    #[error("{0} trailing bytes after transaction")] TrailingBytes(usize),
    #[error("length prefix too large: {0}")] OversizedLength(u64),
    #[error("invalid txid: {0}")] InvalidTxid(String),
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("value overflow")] ValueOverflow,
}
