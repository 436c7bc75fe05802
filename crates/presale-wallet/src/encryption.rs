//! Seed encryption under a password.
//!
//! # Legacy format (record version 1)
//!
//! The password key is PBKDF2-HMAC-SHA256 with the password doubling as its
//! own salt, 2000 iterations, 16 bytes of output. The seed is encrypted with
//! AES-128-CBC and PKCS#7 padding:
//!
//! ```text
//! iv (16 bytes) || ciphertext (n * 16 bytes)
//! ```
//!
//! The cipher is unauthenticated. A wrong key decrypts to garbage rather
//! than failing, and callers detect it through the destination address check
//! in [`WalletRecord::unlock`](crate::record::WalletRecord::unlock).
//!
//! # Sealed format (record version 2)
//!
//! Argon2id over the password and a random 16-byte salt yields a 256-bit
//! key for AES-256-GCM:
//!
//! ```text
//! nonce (12 bytes) || ciphertext + auth_tag
//! ```

use aes::Aes128;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use presale_core::constants::{PASSWORD_KDF_ITERATIONS, PASSWORD_KEY_LEN};

use crate::error::WalletError;

/// AES block and IV length in bytes.
pub const IV_LEN: usize = 16;

/// Salt length for sealed records.
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Legacy 128-bit password key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PasswordKey {
    bytes: [u8; PASSWORD_KEY_LEN],
}

impl PasswordKey {
    /// PBKDF2-HMAC-SHA256(password, salt = password, 2000 iterations).
    pub fn derive(password: &[u8]) -> Self {
        let mut bytes = [0u8; PASSWORD_KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password, password, PASSWORD_KDF_ITERATIONS, &mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; PASSWORD_KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; PASSWORD_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for PasswordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// 256-bit key for sealed records.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SealingKey {
    bytes: [u8; 32],
}

impl SealingKey {
    /// Argon2id (default parameters) over the password and salt.
    pub fn derive(password: &[u8], salt: &[u8; SALT_LEN]) -> Result<Self, WalletError> {
        let mut bytes = [0u8; 32];
        argon2::Argon2::default()
            .hash_password_into(password, salt, &mut bytes)
            .map_err(|e| WalletError::Encryption(e.to_string()))?;
        Ok(Self { bytes })
    }
}

impl fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealingKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Random salt for a sealed record.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Encrypted seed bytes, hex-encoded in the wallet record.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedSeed(Vec<u8>);

impl EncryptedSeed {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        hex::decode(s.trim())
            .map(Self)
            .map_err(|e| WalletError::CorruptedFile(format!("encseed is not hex: {e}")))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for EncryptedSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedSeed({} bytes)", self.0.len())
    }
}

impl fmt::Display for EncryptedSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for EncryptedSeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EncryptedSeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// --- Legacy AES-128-CBC ---

/// Encrypt a seed under a fresh random IV.
pub fn encrypt(key: &PasswordKey, seed: &[u8]) -> EncryptedSeed {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    encrypt_with_iv(key, seed, &iv)
}

/// Encrypt a seed under a caller-chosen IV.
pub fn encrypt_with_iv(key: &PasswordKey, seed: &[u8], iv: &[u8; IV_LEN]) -> EncryptedSeed {
    let ciphertext = cbc::Encryptor::<Aes128>::new(key.as_bytes().into(), iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(seed);
    let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&ciphertext);
    EncryptedSeed(out)
}

/// Decrypt a legacy encrypted seed.
///
/// Only structural problems fail: fewer than two blocks or a ciphertext that
/// is not block-aligned. An invalid final padding leaves the buffer as
/// decrypted.
pub fn decrypt(key: &PasswordKey, encrypted: &EncryptedSeed) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    let data = encrypted.as_bytes();
    if data.len() < 2 * IV_LEN {
        return Err(WalletError::CorruptedFile(format!(
            "encrypted seed too short: {} < {}",
            data.len(),
            2 * IV_LEN
        )));
    }
    if data.len() % IV_LEN != 0 {
        return Err(WalletError::CorruptedFile(format!(
            "encrypted seed not block aligned: {} bytes",
            data.len()
        )));
    }

    let (iv, ciphertext) = data.split_at(IV_LEN);
    let iv: &[u8; IV_LEN] = iv
        .try_into()
        .map_err(|_| WalletError::CorruptedFile("bad iv".into()))?;
    let plaintext = cbc::Decryptor::<Aes128>::new(key.as_bytes().into(), iv.into())
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|e| WalletError::CorruptedFile(e.to_string()))?;
    let mut plaintext = Zeroizing::new(plaintext);
    let len = unpadded_len(&plaintext);
    plaintext.truncate(len);
    Ok(plaintext)
}

/// Length without PKCS#7 padding, or the full length if the padding is
/// invalid.
fn unpadded_len(buf: &[u8]) -> usize {
    let Some(&pad) = buf.last() else {
        return 0;
    };
    let n = pad as usize;
    if n == 0 || n > IV_LEN || n > buf.len() {
        return buf.len();
    }
    if buf[buf.len() - n..].iter().all(|&b| b == pad) {
        buf.len() - n
    } else {
        buf.len()
    }
}

// --- Sealed AES-256-GCM ---

/// Encrypt and authenticate a seed under a fresh random nonce.
pub fn seal(key: &SealingKey, seed: &[u8]) -> Result<EncryptedSeed, WalletError> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(&key.bytes)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), seed)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(EncryptedSeed(out))
}

/// Decrypt a sealed seed. A failed authentication tag is reported as
/// [`WalletError::IntegrityCheckFailed`].
pub fn open(key: &SealingKey, encrypted: &EncryptedSeed) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    let data = encrypted.as_bytes();
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(WalletError::CorruptedFile(format!(
            "sealed seed too short: {} < {}",
            data.len(),
            NONCE_LEN + TAG_LEN
        )));
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(&key.bytes)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| WalletError::IntegrityCheckFailed)
}
