//! # presale-core
//! Foundation types for the presale wallet: hashing, secp256k1 keys and
//! signing backends, funding/destination addresses, scripts and the
//! funding-chain transaction format.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod ecdsa;
pub mod error;
pub mod script;
pub mod types;
