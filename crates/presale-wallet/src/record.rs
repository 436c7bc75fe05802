//! The persisted wallet record.
//!
//! A wallet file is a single JSON object:
//!
//! ```json
//! {"encseed": "<hex>", "ethaddr": "<40 hex>", "btcaddr": "<base58>", "email": "..."}
//! ```
//!
//! Sealed records add `"version": 2` and a hex `"salt"`. Records without a
//! version (or with version 1) use the legacy cipher. A record is never
//! modified after creation; recovering the keys needs only the record and
//! the password.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use zeroize::Zeroizing;

use presale_core::address::{EthAddress, FundingAddress};
use presale_core::ecdsa::{EcdsaBackend, preferred_backend};

use crate::encryption::{self, EncryptedSeed, PasswordKey, SALT_LEN, SealingKey};
use crate::error::WalletError;
use crate::keys::{DerivedKeys, Seed, derive_keys_with};

/// Legacy record version.
pub const LEGACY_VERSION: u32 = 1;

/// Sealed record version.
pub const SEALED_VERSION: u32 = 2;

/// How the seed in a record is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// PBKDF2 + AES-128-CBC, readable by every presale tool.
    #[default]
    Legacy,
    /// Argon2id + AES-256-GCM.
    Sealed,
}

/// Encrypted seed plus the public data derived from it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WalletRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "salt_hex")]
    pub salt: Option<[u8; SALT_LEN]>,
    pub encseed: EncryptedSeed,
    pub ethaddr: EthAddress,
    pub btcaddr: FundingAddress,
    pub email: String,
}

impl WalletRecord {
    /// Encrypt a seed into a new record.
    pub fn create(seed: &Seed, password: &[u8], email: &str, format: RecordFormat) -> Result<Self, WalletError> {
        let keys = derive_keys_with(seed, preferred_backend())?;
        let (version, salt, encseed) = match format {
            RecordFormat::Legacy => {
                let key = PasswordKey::derive(password);
                (None, None, encryption::encrypt(&key, seed.as_bytes()))
            }
            RecordFormat::Sealed => {
                let salt = encryption::generate_salt();
                let key = SealingKey::derive(password, &salt)?;
                let encseed = encryption::seal(&key, seed.as_bytes())?;
                (Some(SEALED_VERSION), Some(salt), encseed)
            }
        };
        tracing::debug!(?format, ethaddr = %keys.destination_address, "created wallet record");
        Ok(Self {
            version,
            salt,
            encseed,
            ethaddr: keys.destination_address,
            btcaddr: keys.funding_address,
            email: email.to_string(),
        })
    }

    pub fn format(&self) -> Result<RecordFormat, WalletError> {
        match self.version.unwrap_or(LEGACY_VERSION) {
            LEGACY_VERSION => Ok(RecordFormat::Legacy),
            SEALED_VERSION => Ok(RecordFormat::Sealed),
            v => Err(WalletError::UnsupportedVersion(v)),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        let record: Self = serde_json::from_str(json)
            .map_err(|e| WalletError::CorruptedFile(format!("invalid wallet record: {e}")))?;
        if record.format()? == RecordFormat::Sealed && record.salt.is_none() {
            return Err(WalletError::CorruptedFile("sealed record without salt".into()));
        }
        Ok(record)
    }

    pub fn to_json(&self) -> Result<String, WalletError> {
        serde_json::to_string(self).map_err(|e| WalletError::Serialization(e.to_string()))
    }

    /// Read and parse a record. No decryption happens here.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = std::fs::read_to_string(path).map_err(|e| WalletError::IoError(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Write the record, refusing to replace an existing file unless
    /// `overwrite` is set.
    pub fn save(&self, path: &Path, overwrite: bool) -> Result<(), WalletError> {
        let json = self.to_json()?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .create_new(!overwrite)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => WalletError::AlreadyExists(path.display().to_string()),
                _ => WalletError::IoError(e.to_string()),
            })?;
        file.write_all(json.as_bytes())
            .map_err(|e| WalletError::IoError(e.to_string()))
    }

    /// Decrypt the seed and re-derive the keys.
    ///
    /// The destination address must match `ethaddr`, otherwise the password
    /// is wrong or the record is damaged and
    /// [`WalletError::IntegrityCheckFailed`] is returned. The funding
    /// address must match `btcaddr` as well.
    pub fn unlock(&self, password: &[u8]) -> Result<UnlockedWallet, WalletError> {
        self.unlock_with(password, preferred_backend())
    }

    pub fn unlock_with(&self, password: &[u8], backend: &dyn EcdsaBackend) -> Result<UnlockedWallet, WalletError> {
        let plaintext = match self.format()? {
            RecordFormat::Legacy => encryption::decrypt(&PasswordKey::derive(password), &self.encseed)?,
            RecordFormat::Sealed => {
                let salt = self
                    .salt
                    .ok_or_else(|| WalletError::CorruptedFile("sealed record without salt".into()))?;
                encryption::open(&SealingKey::derive(password, &salt)?, &self.encseed)?
            }
        };

        let seed = Seed::from_bytes(plaintext.to_vec()).map_err(|_| WalletError::IntegrityCheckFailed)?;
        let keys = derive_keys_with(&seed, backend).map_err(|_| WalletError::IntegrityCheckFailed)?;
        if keys.destination_address != self.ethaddr || keys.funding_address != self.btcaddr {
            return Err(WalletError::IntegrityCheckFailed);
        }
        Ok(UnlockedWallet { seed, keys })
    }
}

/// A record whose seed has been decrypted and checked.
#[derive(Debug, Clone)]
pub struct UnlockedWallet {
    seed: Seed,
    keys: DerivedKeys,
}

impl UnlockedWallet {
    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn keys(&self) -> &DerivedKeys {
        &self.keys
    }

    pub fn funding_address(&self) -> &FundingAddress {
        &self.keys.funding_address
    }

    pub fn destination_address(&self) -> &EthAddress {
        &self.keys.destination_address
    }

    /// Funding key in wallet import format.
    pub fn funding_wif(&self) -> Zeroizing<String> {
        self.keys.funding.to_wif()
    }

    /// Destination key as 64 hex characters.
    pub fn destination_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.keys.destination.secret_bytes()))
    }
}

mod salt_hex {
    use super::SALT_LEN;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(salt: &Option<[u8; SALT_LEN]>, serializer: S) -> Result<S::Ok, S::Error> {
        match salt {
            Some(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<[u8; SALT_LEN]>, D::Error> {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let salt: [u8; SALT_LEN] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom(format!("salt must be {SALT_LEN} bytes")))?;
        Ok(Some(salt))
    }
}
