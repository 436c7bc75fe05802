//! Hashing, secp256k1 keys and transaction input signing.
//!
//! # Hashes
//!
//! - Keccak-256 (the pre-standard SHA-3 variant) for seed stretching and
//!   destination addresses
//! - double SHA-256 for txids, Base58Check checksums and signing digests
//! - RIPEMD160(SHA256) for funding pubkey hashes
//!
//! # Signing scheme
//!
//! Inputs are signed with the legacy `SIGHASH_ALL` digest: every scriptSig
//! is blanked, the input being signed carries the scriptPubKey it spends,
//! the serialization is followed by the 4-byte sighash type and the whole
//! buffer is double-SHA256 hashed. The resulting scriptSig is
//! `<DER signature || 0x01> <65-byte uncompressed public key>`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::fmt;
use zeroize::Zeroizing;

use crate::constants::{SIGHASH_ALL, WIF_VERSION};
use crate::ecdsa::{EcdsaBackend, preferred_backend};
use crate::error::CryptoError;
use crate::script::Script;
use crate::types::Transaction;

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD160(SHA256(data)).
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd::Ripemd160::digest(sha256(data)).into()
}

/// Wallet import format of a secret key: Base58Check over `0x80 || secret`.
///
/// No compression flag is appended; the key maps to the uncompressed public
/// key that funding addresses are derived from.
pub fn encode_wif(secret: &[u8; 32]) -> Zeroizing<String> {
    Zeroizing::new(bs58::encode(secret).with_check_version(WIF_VERSION).into_string())
}

/// secp256k1 key pair with an uncompressed public key.
///
/// The secret scalar is zeroized on drop. Construction validates the scalar
/// through an [`EcdsaBackend`], so a `KeyPair` always holds a usable key.
#[derive(Clone)]
pub struct KeyPair {
    secret: Zeroizing<[u8; 32]>,
    public: PublicKey,
}

impl KeyPair {
    /// Key pair for a 32-byte big-endian scalar, using [`preferred_backend`].
    pub fn from_secret_bytes(secret: [u8; 32]) -> Result<Self, CryptoError> {
        Self::with_backend(secret, preferred_backend())
    }

    /// Key pair for a 32-byte scalar using a specific backend.
    ///
    /// Fails with [`CryptoError::InvalidSecretKey`] when the scalar is zero or
    /// not below the curve order.
    pub fn with_backend(secret: [u8; 32], backend: &dyn EcdsaBackend) -> Result<Self, CryptoError> {
        let secret = Zeroizing::new(secret);
        let public = PublicKey(backend.public_key(&secret)?);
        Ok(Self { secret, public })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Raw secret scalar. Handle with care.
    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }

    /// Wallet import format of the secret (uncompressed).
    pub fn to_wif(&self) -> Zeroizing<String> {
        encode_wif(&self.secret)
    }

    /// DER signature over a 32-byte digest.
    pub fn sign_digest(&self, digest: &[u8; 32], backend: &dyn EcdsaBackend) -> Result<Vec<u8>, CryptoError> {
        backend.sign_digest(&self.secret, digest)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public)
            .finish_non_exhaustive()
    }
}

/// Uncompressed SEC1 secp256k1 public key (`0x04 || X || Y`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 65]);

impl PublicKey {
    /// Parse and validate an uncompressed point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 65] = bytes.try_into().map_err(|_| CryptoError::InvalidPublicKey)?;
        if arr[0] != 0x04 {
            return Err(CryptoError::InvalidPublicKey);
        }
        k256::PublicKey::from_sec1_bytes(&arr).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// RIPEMD160(SHA256) of the uncompressed encoding.
    pub fn pubkey_hash(&self) -> [u8; 20] {
        hash160(&self.0)
    }

    /// Verify a DER signature over a digest.
    pub fn verify_digest(
        &self,
        digest: &[u8; 32],
        der_signature: &[u8],
        backend: &dyn EcdsaBackend,
    ) -> Result<(), CryptoError> {
        backend.verify_digest(&self.0, digest, der_signature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Legacy `SIGHASH_ALL` digest for one input.
///
/// `spent_script` is the scriptPubKey of the output the input spends.
pub fn signing_hash(
    tx: &Transaction,
    input_index: usize,
    spent_script: &Script,
) -> Result<[u8; 32], CryptoError> {
    if input_index >= tx.inputs.len() {
        return Err(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.inputs.len(),
        });
    }

    let mut copy = tx.clone();
    for (i, input) in copy.inputs.iter_mut().enumerate() {
        input.script_sig = if i == input_index {
            spent_script.clone()
        } else {
            Script::new()
        };
    }

    let mut data = copy.encode();
    data.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
    Ok(sha256d(&data))
}

/// Sign one input in place, replacing its scriptSig.
pub fn sign_transaction_input(
    tx: &mut Transaction,
    input_index: usize,
    spent_script: &Script,
    keypair: &KeyPair,
    backend: &dyn EcdsaBackend,
) -> Result<(), CryptoError> {
    let digest = signing_hash(tx, input_index, spent_script)?;
    let mut signature = keypair.sign_digest(&digest, backend)?;
    signature.push(SIGHASH_ALL as u8);
    tx.inputs[input_index].script_sig = Script::unlocking(&signature, keypair.public_key().as_bytes());
    Ok(())
}

/// Verify a signed input against the P2PKH script it spends.
///
/// Checks that:
/// 1. The scriptSig is exactly `<signature || 0x01> <public key>`
/// 2. The public key hashes to the pubkey hash in `spent_script`
/// 3. The signature verifies against the recomputed digest
pub fn verify_transaction_input(
    tx: &Transaction,
    input_index: usize,
    spent_script: &Script,
    backend: &dyn EcdsaBackend,
) -> Result<(), CryptoError> {
    let input = tx.inputs.get(input_index).ok_or(CryptoError::InputIndexOutOfBounds {
        index: input_index,
        len: tx.inputs.len(),
    })?;
    let expected_hash = spent_script
        .p2pkh_hash()
        .ok_or(CryptoError::UnsupportedSpentScript)?;

    let items = input
        .script_sig
        .push_items()
        .ok_or(CryptoError::MalformedScriptSig(input_index))?;
    let [sig_item, pk_item] = items.as_slice() else {
        return Err(CryptoError::MalformedScriptSig(input_index));
    };

    let (sighash_type, der) = sig_item
        .split_last()
        .ok_or(CryptoError::InvalidSignature)?;
    if u32::from(*sighash_type) != SIGHASH_ALL {
        return Err(CryptoError::InvalidSignature);
    }

    let public_key = PublicKey::from_bytes(pk_item)?;
    if public_key.pubkey_hash() != expected_hash {
        return Err(CryptoError::PubkeyHashMismatch);
    }

    let digest = signing_hash(tx, input_index, spent_script)?;
    public_key.verify_digest(&digest, der, backend)
}
