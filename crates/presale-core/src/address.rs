//! Addresses on the two chains the wallet spans.
//!
//! - [`FundingAddress`]: Base58Check over a version byte and a 20-byte hash,
//!   either pay-to-pubkey-hash (version `0x00`, addresses start with `1`) or
//!   pay-to-script-hash (version `0x05`, addresses start with `3`).
//! - [`EthAddress`]: the last 20 bytes of the Keccak-256 hash of an
//!   uncompressed public key, written as hex.
//!
//! Both carry a `[u8; 20]`, so a destination address can always be embedded
//! in a funding-chain output (see [`FundingAddress::from_eth_address`]).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{COLLECTOR_SCRIPT_HASH, PUBKEY_HASH_VERSION, SCRIPT_HASH_VERSION};
use crate::crypto::{PublicKey, keccak256};
use crate::error::AddressError;
use crate::script::Script;

/// What the 20-byte hash of a [`FundingAddress`] commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    PubkeyHash,
    ScriptHash,
}

impl AddressKind {
    /// Base58Check version byte.
    pub fn version(&self) -> u8 {
        match self {
            AddressKind::PubkeyHash => PUBKEY_HASH_VERSION,
            AddressKind::ScriptHash => SCRIPT_HASH_VERSION,
        }
    }

    pub fn from_version(version: u8) -> Result<Self, AddressError> {
        match version {
            PUBKEY_HASH_VERSION => Ok(AddressKind::PubkeyHash),
            SCRIPT_HASH_VERSION => Ok(AddressKind::ScriptHash),
            v => Err(AddressError::InvalidVersion(v)),
        }
    }
}

/// A funding-chain address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FundingAddress {
    kind: AddressKind,
    hash: [u8; 20],
}

impl FundingAddress {
    pub fn from_pubkey_hash(hash: [u8; 20]) -> Self {
        Self {
            kind: AddressKind::PubkeyHash,
            hash,
        }
    }

    pub fn from_script_hash(hash: [u8; 20]) -> Self {
        Self {
            kind: AddressKind::ScriptHash,
            hash,
        }
    }

    /// Pay-to-pubkey-hash address of an uncompressed public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self::from_pubkey_hash(public_key.pubkey_hash())
    }

    /// The destination address reinterpreted as a pay-to-pubkey-hash
    /// address. Nobody holds a key for it; funds sent there are a marker.
    pub fn from_eth_address(eth: &EthAddress) -> Self {
        Self::from_pubkey_hash(*eth.as_bytes())
    }

    /// The sale's collector address.
    pub fn collector() -> Self {
        Self::from_script_hash(COLLECTOR_SCRIPT_HASH)
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }

    /// Locking script paying to this address.
    pub fn script_pubkey(&self) -> Script {
        match self.kind {
            AddressKind::PubkeyHash => Script::p2pkh(&self.hash),
            AddressKind::ScriptHash => Script::p2sh(&self.hash),
        }
    }

    /// The address a standard locking script pays to, if any.
    pub fn from_script(script: &Script) -> Option<Self> {
        script
            .p2pkh_hash()
            .map(Self::from_pubkey_hash)
            .or_else(|| script.p2sh_hash().map(Self::from_script_hash))
    }

    pub fn encode(&self) -> String {
        bs58::encode(self.hash)
            .with_check_version(self.kind.version())
            .into_string()
    }

    pub fn decode(s: &str) -> Result<Self, AddressError> {
        let bytes = match bs58::decode(s.trim()).with_check(None).into_vec() {
            Ok(bytes) => bytes,
            Err(bs58::decode::Error::InvalidChecksum { .. }) => {
                return Err(AddressError::InvalidChecksum);
            }
            Err(e) => return Err(AddressError::InvalidBase58(e.to_string())),
        };
        // Version byte followed by the hash.
        if bytes.len() != 21 {
            return Err(AddressError::InvalidLength {
                expected: 21,
                got: bytes.len(),
            });
        }
        let kind = AddressKind::from_version(bytes[0])?;
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&bytes[1..]);
        Ok(Self { kind, hash })
    }
}

impl fmt::Display for FundingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for FundingAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for FundingAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for FundingAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// A destination-chain address.
///
/// Parsed from hex with or without a `0x` prefix; displayed as lowercase hex
/// without one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Last 20 bytes of Keccak-256 over the point coordinates.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = keccak256(&public_key.as_bytes()[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|v: Vec<u8>| AddressError::InvalidLength {
            expected: 20,
            got: v.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self.to_hex())
    }
}

impl FromStr for EthAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for EthAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
