//! Recognising past purchases.
//!
//! Every purchase leaves its dust output (index 1) unspent at the dust
//! address of the destination. Listing the unspent outputs of that address
//! and inspecting the transactions that created them recovers the purchase
//! history of a destination address.

use presale_core::address::{EthAddress, FundingAddress};
use presale_core::constants::{
    COIN, COLLECTOR_DEDUCTION, DUST_OUTPUT_INDEX, ETH_PER_BTC_MAX, ETH_PER_BTC_MIN, MIN_PURCHASE,
};
use presale_core::types::{Transaction, Txid, Utxo};

use crate::error::WalletError;

/// A purchase found on the funding chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purchase {
    pub txid: Txid,
    /// Amount the buyer paid in, in satoshis.
    pub value: u64,
    /// Destination address credited by the purchase.
    pub destination: EthAddress,
}

impl Purchase {
    /// Lower and upper ETH estimate at the advertised rate bounds.
    pub fn estimated_eth(&self) -> (u64, u64) {
        let at = |rate: u64| (u128::from(self.value) * u128::from(rate) / u128::from(COIN)) as u64;
        (at(ETH_PER_BTC_MIN), at(ETH_PER_BTC_MAX))
    }
}

/// Txids of dust outputs, in first-seen order without duplicates.
///
/// `utxos` are the unspent outputs of a dust address.
pub fn candidate_txids(utxos: &[Utxo]) -> Vec<Txid> {
    let mut txids: Vec<Txid> = Vec::new();
    for utxo in utxos {
        if utxo.outpoint.index == DUST_OUTPUT_INDEX && !txids.contains(&utxo.outpoint.txid) {
            txids.push(utxo.outpoint.txid);
        }
    }
    txids
}

/// Decode a raw transaction and return it as a purchase if it pays the
/// collector.
///
/// A purchase has at least two outputs, pays the collector at output 0 at
/// least `MIN_PURCHASE - COLLECTOR_DEDUCTION` and marks the destination in
/// the pay-to-pubkey-hash script of output 1. A transaction whose own txid
/// differs from `txid` is never reported.
pub fn detect_purchase(txid: Txid, raw: &[u8]) -> Result<Option<Purchase>, WalletError> {
    let tx = Transaction::decode(raw)?;
    if tx.txid() != txid {
        tracing::warn!(expected = %txid, got = %tx.txid(), "fetched transaction has a different txid");
        return Ok(None);
    }

    let [first, second, ..] = tx.outputs.as_slice() else {
        return Ok(None);
    };
    if FundingAddress::from_script(&first.script_pubkey) != Some(FundingAddress::collector()) {
        return Ok(None);
    }
    if first.value < MIN_PURCHASE - COLLECTOR_DEDUCTION {
        return Ok(None);
    }
    let Some(hash) = second.script_pubkey.p2pkh_hash() else {
        return Ok(None);
    };

    Ok(Some(Purchase {
        txid,
        value: first.value.saturating_add(COLLECTOR_DEDUCTION),
        destination: EthAddress::from_bytes(hash),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use presale_core::script::Script;
    use presale_core::types::TxOutput;

    fn dest() -> EthAddress {
        "958a93829bb26d0ee83615b6044b96598eb2f061".parse().unwrap()
    }

    fn purchase_tx(balance: u64) -> Transaction {
        let own: FundingAddress = "1Nei4xyfoXeowzXramqEC8EroK37eH3sHL".parse().unwrap();
        TransactionBuilder::new()
            .build(&[Utxo::new(Txid([9; 32]), 0, balance)], &dest(), &own)
            .unwrap()
            .tx
    }

    #[test]
    fn candidates_keep_dust_outputs_once() {
        let a = Txid([1; 32]);
        let b = Txid([2; 32]);
        let utxos = [
            Utxo::new(a, 1, 10_000),
            Utxo::new(b, 0, 50_000),
            Utxo::new(b, 1, 10_000),
            Utxo::new(a, 1, 10_000),
        ];
        assert_eq!(candidate_txids(&utxos), vec![a, b]);
        assert!(candidate_txids(&[]).is_empty());
    }

    #[test]
    fn detects_built_purchase() {
        let tx = purchase_tx(2_500_000);
        let found = detect_purchase(tx.txid(), &tx.encode()).unwrap().unwrap();
        assert_eq!(found.value, 2_500_000);
        assert_eq!(found.destination, dest());
        assert_eq!(found.txid, tx.txid());
    }

    #[test]
    fn purchase_with_change_reports_collector_share() {
        let tx = purchase_tx(200_000_000_000);
        let found = detect_purchase(tx.txid(), &tx.encode()).unwrap().unwrap();
        assert_eq!(found.value, 149_999_960_000 + COLLECTOR_DEDUCTION);
    }

    #[test]
    fn non_collector_payment_is_not_a_purchase() {
        let mut tx = purchase_tx(2_500_000);
        tx.outputs[0].script_pubkey = Script::p2sh(&[0x77; 20]);
        assert_eq!(detect_purchase(tx.txid(), &tx.encode()).unwrap(), None);
    }

    #[test]
    fn small_collector_payment_is_not_a_purchase() {
        let mut tx = purchase_tx(2_500_000);
        tx.outputs[0].value = MIN_PURCHASE - COLLECTOR_DEDUCTION - 1;
        assert_eq!(detect_purchase(tx.txid(), &tx.encode()).unwrap(), None);
    }

    #[test]
    fn single_output_is_not_a_purchase() {
        let mut tx = purchase_tx(2_500_000);
        tx.outputs.truncate(1);
        assert_eq!(detect_purchase(tx.txid(), &tx.encode()).unwrap(), None);
    }

    #[test]
    fn non_p2pkh_marker_is_not_a_purchase() {
        let mut tx = purchase_tx(2_500_000);
        tx.outputs[1] = TxOutput {
            value: 10_000,
            script_pubkey: Script::p2sh(&[0x01; 20]),
        };
        assert_eq!(detect_purchase(tx.txid(), &tx.encode()).unwrap(), None);
    }

    #[test]
    fn mismatched_txid_is_not_a_purchase() {
        let tx = purchase_tx(2_500_000);
        let other = purchase_tx(3_000_000).txid();
        assert_ne!(other, tx.txid());
        assert_eq!(detect_purchase(other, &tx.encode()).unwrap(), None);
        assert_eq!(detect_purchase(Txid::ZERO, &tx.encode()).unwrap(), None);
    }

    #[test]
    fn undecodable_transaction_errors() {
        let err = detect_purchase(Txid::ZERO, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, WalletError::Transaction(_)));
    }

    #[test]
    fn eth_estimate_bounds() {
        let p = Purchase {
            txid: Txid::ZERO,
            value: COIN,
            destination: dest(),
        };
        assert_eq!(p.estimated_eth(), (1337, 2000));

        let p = Purchase { value: 1_000_000, ..p };
        assert_eq!(p.estimated_eth(), (13, 20));
    }
}
