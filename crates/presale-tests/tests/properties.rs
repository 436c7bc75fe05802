//! Property-based tests for the presale wallet.
//!
//! Invariants checked under randomized inputs:
//! - The legacy seed cipher inverts for every key, IV and seed
//! - Key derivation is a pure function of the seed
//! - A record opened with another password fails the integrity check
//! - Built purchases conserve value: outputs plus fee equal the balance
//! - Funding addresses decode back to the hash that produced them

use presale_core::address::FundingAddress;
use presale_core::constants::*;
use presale_core::crypto::hash160;
use presale_core::types::total_value;
use presale_tests::helpers::utxos;
use presale_wallet::encryption::{decrypt, encrypt_with_iv};
use presale_wallet::{
    ErrorKind, PasswordKey, RecordFormat, Seed, TransactionBuilder, WalletError, WalletRecord, derive_keys,
    plan_outputs,
};
use proptest::prelude::*;

fn seed_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), MIN_SEED_LEN..=64)
}

// ---------------------------------------------------------------------------
// Cipher
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn legacy_cipher_round_trip(key in any::<[u8; 16]>(), iv in any::<[u8; 16]>(), seed in seed_bytes()) {
        let key = PasswordKey::from_bytes(key);
        let encrypted = encrypt_with_iv(&key, &seed, &iv);
        prop_assert_eq!(encrypted.len() % 16, 0);
        prop_assert_eq!(&encrypted.as_bytes()[..16], &iv[..]);
        let decrypted = decrypt(&key, &encrypted).unwrap();
        prop_assert_eq!(decrypted.as_slice(), seed.as_slice());
    }

    #[test]
    fn truncated_ciphertext_is_corrupted(key in any::<[u8; 16]>(), cut in 1usize..16) {
        let key = PasswordKey::from_bytes(key);
        let encrypted = encrypt_with_iv(&key, &[7u8; 32], &[0u8; 16]);
        let short = presale_wallet::EncryptedSeed::from_bytes(encrypted.as_bytes()[..encrypted.len() - cut].to_vec());
        prop_assert!(matches!(decrypt(&key, &short), Err(WalletError::CorruptedFile(_))));
    }
}

// ---------------------------------------------------------------------------
// Derivation and records
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn derivation_is_deterministic(bytes in seed_bytes()) {
        let seed = Seed::from_bytes(bytes.clone()).unwrap();
        let again = Seed::from_bytes(bytes).unwrap();
        let a = derive_keys(&seed).unwrap();
        let b = derive_keys(&again).unwrap();

        prop_assert_eq!(a.destination_address, b.destination_address);
        prop_assert_eq!(a.funding_address, b.funding_address);
        prop_assert_eq!(a.funding.secret_bytes(), b.funding.secret_bytes());
        prop_assert_ne!(a.funding.secret_bytes(), a.destination.secret_bytes());
        prop_assert_eq!(a.destination_address.as_bytes().len(), 20);
    }

    #[test]
    fn funding_address_decodes_to_its_hash(bytes in seed_bytes()) {
        let keys = derive_keys(&Seed::from_bytes(bytes).unwrap()).unwrap();
        let expected = hash160(keys.funding.public_key().as_bytes());

        let encoded = keys.funding_address.to_string();
        prop_assert!(encoded.starts_with('1'));
        let decoded = FundingAddress::decode(&encoded).unwrap();
        prop_assert_eq!(decoded.hash(), &expected);
        prop_assert_eq!(decoded, keys.funding_address);
    }

    #[test]
    fn other_password_fails_integrity(
        bytes in seed_bytes(),
        right in "[a-z]{1,12}",
        wrong in "[a-z]{1,12}",
    ) {
        prop_assume!(right != wrong);
        let record = WalletRecord::create(&Seed::from_bytes(bytes.clone()).unwrap(), right.as_bytes(), "", RecordFormat::Legacy).unwrap();

        let err = record.unlock(wrong.as_bytes()).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Integrity);
        let unlocked = record.unlock(right.as_bytes()).unwrap();
        prop_assert_eq!(unlocked.seed().as_bytes(), bytes.as_slice());
    }
}

// ---------------------------------------------------------------------------
// Output policy
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn purchase_conserves_value(values in prop::collection::vec(1u64..=100_000_000_000, 1..6)) {
        let balance: u64 = values.iter().sum();
        prop_assume!(balance >= MIN_PURCHASE);

        let keys = derive_keys(&Seed::from_bytes(vec![42; 32]).unwrap()).unwrap();
        let funding = utxos(&values);
        prop_assert_eq!(total_value(&funding), Some(balance));

        let unsigned = TransactionBuilder::new()
            .build(&funding, &keys.destination_address, &keys.funding_address)
            .unwrap();
        let outputs = unsigned.tx.total_output_value().unwrap();

        prop_assert_eq!(unsigned.balance, balance);
        prop_assert_eq!(outputs + unsigned.fee, balance);
        prop_assert_eq!(unsigned.tx.inputs.len(), values.len());
        prop_assert_eq!(unsigned.tx.outputs[1].value, DUST_VALUE);
        if balance > MAX_PURCHASE {
            prop_assert_eq!(unsigned.tx.outputs.len(), 3);
            prop_assert_eq!(unsigned.fee, 30_000);
            prop_assert_eq!(unsigned.tx.outputs[2].value, balance - MAX_PURCHASE);
        } else {
            prop_assert_eq!(unsigned.tx.outputs.len(), 2);
            prop_assert_eq!(unsigned.fee, 20_000);
        }
    }

    #[test]
    fn below_minimum_is_insufficient(balance in 1u64..MIN_PURCHASE) {
        let keys = derive_keys(&Seed::from_bytes(vec![42; 32]).unwrap()).unwrap();
        let err = plan_outputs(balance, &keys.destination_address, &keys.funding_address).unwrap_err();
        prop_assert_eq!(err, WalletError::InsufficientFunds { have: balance, need: MIN_PURCHASE });
    }
}
