//! Integration tests for the presale wallet.
//!
//! End-to-end flows from wallet creation to a verified signed purchase, and
//! property tests over the cipher, key derivation and output policy.

pub mod helpers;
