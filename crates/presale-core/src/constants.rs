//! Sale and protocol constants. All monetary values in satoshis
//! (1 BTC = 10^8 satoshis).

pub const COIN: u64 = 100_000_000;

// --- Purchase policy ---

/// Smallest funding balance accepted for a purchase.
pub const MIN_PURCHASE: u64 = 1_000_000;

/// Largest amount forwarded to the collector in one purchase. Anything above
/// this is returned to the wallet's own funding address as change.
pub const MAX_PURCHASE: u64 = 150_000_000_000;

/// Value of the output that carries the destination address.
pub const DUST_VALUE: u64 = 10_000;

/// Subtracted from the collector output when there is no change output.
///
/// Covers the dust output and the miner fee.
pub const COLLECTOR_DEDUCTION: u64 = 30_000;

/// Subtracted from the collector output when a change output is added.
pub const COLLECTOR_DEDUCTION_WITH_CHANGE: u64 = 40_000;

/// Well-known pay-to-script-hash address receiving purchase funds.
pub const COLLECTOR_ADDRESS: &str = "36PrZ1KHYMpqSyAQXSG8VwbUiq2EogxLo2";

/// Script hash encoded in [`COLLECTOR_ADDRESS`].
pub const COLLECTOR_SCRIPT_HASH: [u8; 20] = [
    0x33, 0x99, 0xbc, 0x19, 0xf2, 0xb2, 0x04, 0x73, 0xd4, 0x17, 0xe3, 0x14, 0x72, 0xc9, 0x29,
    0x47, 0xb5, 0x9f, 0x95, 0xf8,
];

/// Output index of the dust output within a purchase transaction.
pub const DUST_OUTPUT_INDEX: u32 = 1;

/// Lower bound of the advertised ETH per BTC rate (for display estimates).
pub const ETH_PER_BTC_MIN: u64 = 1337;

/// Upper bound of the advertised ETH per BTC rate (for display estimates).
pub const ETH_PER_BTC_MAX: u64 = 2000;

// --- Key material ---

/// Minimum seed length in bytes.
pub const MIN_SEED_LEN: usize = 16;

/// Length of a freshly generated seed.
pub const GENERATED_SEED_LEN: usize = 32;

/// PBKDF2 iteration count for the legacy password key.
pub const PASSWORD_KDF_ITERATIONS: u32 = 2000;

/// Length of the legacy password-derived AES key.
pub const PASSWORD_KEY_LEN: usize = 16;

/// Byte appended to the seed before hashing to obtain the funding secret.
pub const FUNDING_DOMAIN_BYTE: u8 = 0x01;

// --- Funding chain encoding ---

/// Base58Check version byte of pay-to-pubkey-hash addresses.
pub const PUBKEY_HASH_VERSION: u8 = 0x00;

/// Base58Check version byte of pay-to-script-hash addresses.
pub const SCRIPT_HASH_VERSION: u8 = 0x05;

/// Base58Check version byte of wallet import format private keys.
pub const WIF_VERSION: u8 = 0x80;

/// Transaction format version emitted by the builder.
pub const TX_VERSION: u32 = 1;

/// Input sequence number disabling lock time.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// Signature hash type committing to all inputs and outputs.
pub const SIGHASH_ALL: u32 = 1;

/// Upper bound on any length prefix accepted when decoding a transaction.
pub const MAX_DECODE_LENGTH: u64 = 4_000_000;
