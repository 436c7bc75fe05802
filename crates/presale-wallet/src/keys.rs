//! Seed management and deterministic key derivation.
//!
//! One seed yields exactly two keys:
//!
//! ```text
//! destination secret = keccak256(seed)
//! funding secret     = keccak256(seed || 0x01)
//! ```
//!
//! The destination key controls the address credited on the destination
//! chain. The funding key controls the Base58Check address the buyer pays
//! into.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use presale_core::address::{EthAddress, FundingAddress};
use presale_core::constants::{FUNDING_DOMAIN_BYTE, GENERATED_SEED_LEN, MIN_SEED_LEN};
use presale_core::crypto::{KeyPair, keccak256};
use presale_core::ecdsa::{EcdsaBackend, preferred_backend};

use crate::error::WalletError;

/// Secret seed that every wallet key is derived from.
///
/// Secret material is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: Vec<u8>,
}

impl Seed {
    /// 32 bytes from the OS cryptographic RNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = vec![0u8; GENERATED_SEED_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wrap caller-provided seed bytes, at least [`MIN_SEED_LEN`] long.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, WalletError> {
        if bytes.len() < MIN_SEED_LEN {
            let len = bytes.len();
            drop(zeroize::Zeroizing::new(bytes));
            return Err(WalletError::InvalidSeed(format!(
                "seed must be at least {MIN_SEED_LEN} bytes, got {len}"
            )));
        }
        Ok(Self { bytes })
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// The two key pairs of a wallet and their addresses.
#[derive(Clone, Debug)]
pub struct DerivedKeys {
    pub funding: KeyPair,
    pub destination: KeyPair,
    pub funding_address: FundingAddress,
    pub destination_address: EthAddress,
}

/// Derive both key pairs using the preferred ECDSA backend.
pub fn derive_keys(seed: &Seed) -> Result<DerivedKeys, WalletError> {
    derive_keys_with(seed, preferred_backend())
}

/// Derive both key pairs using a specific ECDSA backend.
pub fn derive_keys_with(seed: &Seed, backend: &dyn EcdsaBackend) -> Result<DerivedKeys, WalletError> {
    let destination = KeyPair::with_backend(keccak256(seed.as_bytes()), backend)?;

    let mut funding_input = zeroize::Zeroizing::new(Vec::with_capacity(seed.len() + 1));
    funding_input.extend_from_slice(seed.as_bytes());
    funding_input.push(FUNDING_DOMAIN_BYTE);
    let funding = KeyPair::with_backend(keccak256(&funding_input), backend)?;

    let funding_address = FundingAddress::from_public_key(funding.public_key());
    let destination_address = EthAddress::from_public_key(destination.public_key());
    tracing::debug!(%funding_address, %destination_address, backend = backend.name(), "derived wallet keys");

    Ok(DerivedKeys {
        funding,
        destination,
        funding_address,
        destination_address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use presale_core::ecdsa::RustCryptoBackend;

    fn kat_seed() -> Seed {
        Seed::from_bytes((0u8..32).collect()).unwrap()
    }

    #[test]
    fn derive_known_answers() {
        let keys = derive_keys(&kat_seed()).unwrap();
        assert_eq!(
            hex::encode(keys.destination.secret_bytes()),
            "8ae1aa597fa146ebd3aa2ceddf360668dea5e526567e92b0321816a4e895bd2d"
        );
        assert_eq!(
            hex::encode(keys.funding.secret_bytes()),
            "3026136dac26c20b856f029be338da88252b68c04c181c606abf9320d03786cd"
        );
        assert_eq!(
            keys.destination_address.to_string(),
            "958a93829bb26d0ee83615b6044b96598eb2f061"
        );
        assert_eq!(
            keys.funding_address.to_string(),
            "1Nei4xyfoXeowzXramqEC8EroK37eH3sHL"
        );
    }

    #[test]
    fn derive_is_deterministic() {
        let seed = Seed::from_bytes(b"sixteen byte sd!".to_vec()).unwrap();
        let a = derive_keys(&seed).unwrap();
        let b = derive_keys(&seed.clone()).unwrap();
        assert_eq!(a.funding_address, b.funding_address);
        assert_eq!(a.destination_address, b.destination_address);
        assert_eq!(a.funding.secret_bytes(), b.funding.secret_bytes());
    }

    #[test]
    fn backends_derive_same_addresses() {
        let a = derive_keys(&kat_seed()).unwrap();
        let b = derive_keys_with(&kat_seed(), &RustCryptoBackend).unwrap();
        assert_eq!(a.funding_address, b.funding_address);
        assert_eq!(a.destination_address, b.destination_address);
    }

    #[test]
    fn funding_and_destination_keys_differ() {
        let keys = derive_keys(&kat_seed()).unwrap();
        assert_ne!(keys.funding.secret_bytes(), keys.destination.secret_bytes());
        assert_ne!(keys.funding_address.hash(), keys.destination_address.as_bytes());
    }

    #[test]
    fn seed_minimum_length() {
        assert!(Seed::from_bytes(vec![1u8; MIN_SEED_LEN]).is_ok());
        let err = Seed::from_bytes(vec![1u8; MIN_SEED_LEN - 1]).unwrap_err();
        assert!(matches!(err, WalletError::InvalidSeed(_)));
        assert!(matches!(Seed::from_bytes(Vec::new()), Err(WalletError::InvalidSeed(_))));
    }

    #[test]
    fn generated_seeds_are_unique() {
        let a = Seed::generate();
        let b = Seed::generate();
        assert_eq!(a.len(), GENERATED_SEED_LEN);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn seed_debug_redacted() {
        let seed = kat_seed();
        let debug = format!("{seed:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("000102"));
    }
}
