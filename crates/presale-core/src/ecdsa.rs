//! secp256k1 ECDSA signing backends.
//!
//! Signing goes through the [`EcdsaBackend`] capability so the wallet can
//! use the audited libsecp256k1 C library when it is compiled in and fall
//! back to the pure-Rust `k256` implementation otherwise. Both backends
//! produce RFC 6979 deterministic, low-S, DER-encoded signatures and accept
//! each other's output.
//!
//! The backend is chosen once, by [`preferred_backend`].

use std::fmt;
use std::sync::OnceLock;

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};

use crate::error::CryptoError;

/// Sign and verify 32-byte digests with secp256k1 keys.
pub trait EcdsaBackend: Send + Sync + fmt::Debug {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Uncompressed SEC1 public key (65 bytes, `0x04` prefix) for a secret
    /// scalar.
    fn public_key(&self, secret: &[u8; 32]) -> Result<[u8; 65], CryptoError>;

    /// DER-encoded low-S signature over a prehashed digest.
    fn sign_digest(&self, secret: &[u8; 32], digest: &[u8; 32]) -> Result<Vec<u8>, CryptoError>;

    /// Verify a DER-encoded signature over a prehashed digest.
    fn verify_digest(
        &self,
        public_key: &[u8; 65],
        digest: &[u8; 32],
        der_signature: &[u8],
    ) -> Result<(), CryptoError>;
}

/// The backend selected for this build: libsecp256k1 when the
/// `libsecp256k1` feature is enabled, otherwise [`RustCryptoBackend`].
pub fn preferred_backend() -> &'static dyn EcdsaBackend {
    static BACKEND: OnceLock<Box<dyn EcdsaBackend>> = OnceLock::new();
    BACKEND
        .get_or_init(|| {
            #[cfg(feature = "libsecp256k1")]
            {
                Box::new(Libsecp256k1Backend::new())
            }
            #[cfg(not(feature = "libsecp256k1"))]
            {
                Box::new(RustCryptoBackend)
            }
        })
        .as_ref()
}

// --- libsecp256k1 ---

/// Backend over the libsecp256k1 C library.
#[cfg(feature = "libsecp256k1")]
pub struct Libsecp256k1Backend {
    ctx: secp256k1::Secp256k1<secp256k1::All>,
}

#[cfg(feature = "libsecp256k1")]
impl Libsecp256k1Backend {
    pub fn new() -> Self {
        Self {
            ctx: secp256k1::Secp256k1::new(),
        }
    }
}

#[cfg(feature = "libsecp256k1")]
impl Default for Libsecp256k1Backend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "libsecp256k1")]
impl fmt::Debug for Libsecp256k1Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Libsecp256k1Backend")
    }
}

#[cfg(feature = "libsecp256k1")]
impl EcdsaBackend for Libsecp256k1Backend {
    fn name(&self) -> &'static str {
        "libsecp256k1"
    }

    fn public_key(&self, secret: &[u8; 32]) -> Result<[u8; 65], CryptoError> {
        let sk = secp256k1::SecretKey::from_slice(secret).map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(secp256k1::PublicKey::from_secret_key(&self.ctx, &sk).serialize_uncompressed())
    }

    fn sign_digest(&self, secret: &[u8; 32], digest: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
        let sk = secp256k1::SecretKey::from_slice(secret).map_err(|_| CryptoError::InvalidSecretKey)?;
        let msg = secp256k1::Message::from_digest(*digest);
        let sig = self.ctx.sign_ecdsa(&msg, &sk);
        Ok(sig.serialize_der().to_vec())
    }

    fn verify_digest(
        &self,
        public_key: &[u8; 65],
        digest: &[u8; 32],
        der_signature: &[u8],
    ) -> Result<(), CryptoError> {
        let pk = secp256k1::PublicKey::from_slice(public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig = secp256k1::ecdsa::Signature::from_der(der_signature)
            .map_err(|_| CryptoError::InvalidSignature)?;
        let msg = secp256k1::Message::from_digest(*digest);
        self.ctx
            .verify_ecdsa(&msg, &sig, &pk)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

// --- k256 ---

/// Pure-Rust backend over the `k256` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoBackend;

impl RustCryptoBackend {
    fn signing_key(secret: &[u8; 32]) -> Result<k256::ecdsa::SigningKey, CryptoError> {
        k256::ecdsa::SigningKey::from_slice(secret).map_err(|_| CryptoError::InvalidSecretKey)
    }
}

impl EcdsaBackend for RustCryptoBackend {
    fn name(&self) -> &'static str {
        "k256"
    }

    fn public_key(&self, secret: &[u8; 32]) -> Result<[u8; 65], CryptoError> {
        let sk = Self::signing_key(secret)?;
        let point = sk.verifying_key().to_encoded_point(false);
        point
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    fn sign_digest(&self, secret: &[u8; 32], digest: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
        let sk = Self::signing_key(secret)?;
        let sig: k256::ecdsa::Signature =
            sk.sign_prehash(digest).map_err(|e| CryptoError::Backend {
                backend: "k256",
                reason: e.to_string(),
            })?;
        let sig = sig.normalize_s().unwrap_or(sig);
        Ok(sig.to_der().as_bytes().to_vec())
    }

    fn verify_digest(
        &self,
        public_key: &[u8; 65],
        digest: &[u8; 32],
        der_signature: &[u8],
    ) -> Result<(), CryptoError> {
        let vk = k256::ecdsa::VerifyingKey::from_sec1_bytes(public_key)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig = k256::ecdsa::Signature::from_der(der_signature)
            .map_err(|_| CryptoError::InvalidSignature)?;
        vk.verify_prehash(digest, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}
