//! Purchase transaction construction.
//!
//! Every purchase spends all of the funding address's unspent outputs and
//! pays:
//!
//! ```text
//! output 0   collector        balance - 30_000             (balance <= MAX_PURCHASE)
//!                             MAX_PURCHASE - 40_000        (balance >  MAX_PURCHASE)
//! output 1   dust address     10_000
//! output 2   own address      balance - MAX_PURCHASE       (balance >  MAX_PURCHASE)
//! ```
//!
//! The dust address is the destination address's 20 bytes read as a
//! pay-to-pubkey-hash; the sale reads it back to credit the buyer. Whatever
//! the outputs leave over is the miner fee.

use presale_core::address::{EthAddress, FundingAddress};
use presale_core::constants::{
    COLLECTOR_DEDUCTION, COLLECTOR_DEDUCTION_WITH_CHANGE, DUST_VALUE, MAX_PURCHASE, MIN_PURCHASE,
    SEQUENCE_FINAL, TX_VERSION,
};
use presale_core::script::Script;
use presale_core::types::{Transaction, TxInput, TxOutput, Utxo, total_value};

use crate::error::WalletError;

/// One output of a purchase, before it becomes a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedOutput {
    pub address: FundingAddress,
    /// Value in satoshis.
    pub value: u64,
}

impl PlannedOutput {
    fn new(address: FundingAddress, value: u64) -> Self {
        Self { address, value }
    }

    pub fn to_tx_output(&self) -> TxOutput {
        TxOutput {
            value: self.value,
            script_pubkey: self.address.script_pubkey(),
        }
    }
}

/// Apply the purchase policy to a funding balance.
///
/// `own` receives the change when the balance exceeds [`MAX_PURCHASE`].
pub fn plan_outputs(
    balance: u64,
    destination: &EthAddress,
    own: &FundingAddress,
) -> Result<Vec<PlannedOutput>, WalletError> {
    if balance == 0 {
        return Err(WalletError::NoFunds);
    }
    if balance < MIN_PURCHASE {
        return Err(WalletError::InsufficientFunds {
            have: balance,
            need: MIN_PURCHASE,
        });
    }

    let collector = FundingAddress::collector();
    let dust = PlannedOutput::new(FundingAddress::from_eth_address(destination), DUST_VALUE);

    if balance > MAX_PURCHASE {
        Ok(vec![
            PlannedOutput::new(collector, MAX_PURCHASE - COLLECTOR_DEDUCTION_WITH_CHANGE),
            dust,
            PlannedOutput::new(*own, balance - MAX_PURCHASE),
        ])
    } else {
        Ok(vec![
            PlannedOutput::new(collector, balance - COLLECTOR_DEDUCTION),
            dust,
        ])
    }
}

/// A purchase transaction ready for signing.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    /// The transaction with empty scriptSigs.
    pub tx: Transaction,
    /// The scriptPubKey every input spends (P2PKH of the funding address).
    pub spent_script: Script,
    /// Sum of the spent outputs in satoshis.
    pub balance: u64,
    /// Miner fee: balance minus all outputs.
    pub fee: u64,
}

/// Builder for purchase transactions.
///
/// # Example
/// ```ignore
/// let unsigned = TransactionBuilder::new().build(&utxos, &eth_addr, &funding_addr)?;
/// let tx = TransactionSigner::new().sign(unsigned, &keys.funding)?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    lock_time: u32,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self { lock_time: 0 }
    }

    /// Set the transaction lock time (default 0).
    pub fn set_lock_time(&mut self, lock_time: u32) -> &mut Self {
        self.lock_time = lock_time;
        self
    }

    /// Spend every UTXO, in the given order, into the purchase outputs.
    pub fn build(
        &self,
        utxos: &[Utxo],
        destination: &EthAddress,
        own: &FundingAddress,
    ) -> Result<UnsignedTransaction, WalletError> {
        let balance = total_value(utxos)
            .ok_or_else(|| WalletError::InvalidAmount("funding balance overflow".into()))?;
        let planned = plan_outputs(balance, destination, own)?;

        let inputs = utxos
            .iter()
            .map(|utxo| TxInput {
                previous_output: utxo.outpoint,
                script_sig: Script::new(),
                sequence: SEQUENCE_FINAL,
            })
            .collect();
        let outputs: Vec<TxOutput> = planned.iter().map(PlannedOutput::to_tx_output).collect();

        let tx = Transaction {
            version: TX_VERSION,
            inputs,
            outputs,
            lock_time: self.lock_time,
        };
        let spent = tx.total_output_value()?;
        let fee = balance
            .checked_sub(spent)
            .ok_or_else(|| WalletError::InvalidAmount("outputs exceed balance".into()))?;

        tracing::debug!(
            inputs = utxos.len(),
            outputs = planned.len(),
            balance,
            fee,
            "built purchase transaction"
        );

        Ok(UnsignedTransaction {
            tx,
            spent_script: own.script_pubkey(),
            balance,
            fee,
        })
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presale_core::constants::COLLECTOR_ADDRESS;
    use presale_core::types::Txid;

    fn dest() -> EthAddress {
        "958a93829bb26d0ee83615b6044b96598eb2f061".parse().unwrap()
    }

    fn own() -> FundingAddress {
        "1Nei4xyfoXeowzXramqEC8EroK37eH3sHL".parse().unwrap()
    }

    fn utxos(values: &[u64]) -> Vec<Utxo> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Utxo::new(Txid([i as u8 + 1; 32]), i as u32, v))
            .collect()
    }

    fn values(planned: &[PlannedOutput]) -> Vec<u64> {
        planned.iter().map(|o| o.value).collect()
    }

    // --- plan_outputs ---

    #[test]
    fn zero_balance_is_no_funds() {
        assert_eq!(plan_outputs(0, &dest(), &own()).unwrap_err(), WalletError::NoFunds);
    }

    #[test]
    fn below_minimum_is_insufficient() {
        assert_eq!(
            plan_outputs(500_000, &dest(), &own()).unwrap_err(),
            WalletError::InsufficientFunds {
                have: 500_000,
                need: MIN_PURCHASE
            }
        );
        assert!(plan_outputs(MIN_PURCHASE - 1, &dest(), &own()).is_err());
    }

    #[test]
    fn minimum_purchase() {
        let planned = plan_outputs(1_000_000, &dest(), &own()).unwrap();
        assert_eq!(values(&planned), vec![970_000, 10_000]);
        assert_eq!(planned[0].address.to_string(), COLLECTOR_ADDRESS);
        assert_eq!(planned[1].address, FundingAddress::from_eth_address(&dest()));
    }

    #[test]
    fn exactly_maximum_has_no_change() {
        let planned = plan_outputs(MAX_PURCHASE, &dest(), &own()).unwrap();
        assert_eq!(values(&planned), vec![MAX_PURCHASE - 30_000, 10_000]);
    }

    #[test]
    fn above_maximum_returns_change() {
        let planned = plan_outputs(200_000_000_000, &dest(), &own()).unwrap();
        assert_eq!(
            values(&planned),
            vec![149_999_960_000, 10_000, 50_000_000_000]
        );
        assert_eq!(planned[2].address, own());
    }

    // --- build ---

    #[test]
    fn build_spends_all_utxos_in_order() {
        let utxos = utxos(&[400_000, 600_000, 250_000]);
        let unsigned = TransactionBuilder::new().build(&utxos, &dest(), &own()).unwrap();
        let tx = &unsigned.tx;

        assert_eq!(tx.version, 1);
        assert_eq!(tx.lock_time, 0);
        assert_eq!(tx.inputs.len(), 3);
        for (input, utxo) in tx.inputs.iter().zip(&utxos) {
            assert_eq!(input.previous_output, utxo.outpoint);
            assert!(input.script_sig.is_empty());
            assert_eq!(input.sequence, SEQUENCE_FINAL);
        }
        assert_eq!(unsigned.balance, 1_250_000);
        assert_eq!(tx.outputs[0].value, 1_220_000);
        assert_eq!(unsigned.spent_script, own().script_pubkey());
    }

    #[test]
    fn fee_is_balance_minus_outputs() {
        let unsigned = TransactionBuilder::new()
            .build(&utxos(&[1_000_000]), &dest(), &own())
            .unwrap();
        assert_eq!(unsigned.fee, COLLECTOR_DEDUCTION - DUST_VALUE);

        let unsigned = TransactionBuilder::new()
            .build(&utxos(&[MAX_PURCHASE, 5 * MIN_PURCHASE]), &dest(), &own())
            .unwrap();
        assert_eq!(unsigned.fee, COLLECTOR_DEDUCTION_WITH_CHANGE - DUST_VALUE);
    }

    #[test]
    fn output_scripts() {
        let unsigned = TransactionBuilder::new()
            .build(&utxos(&[2_000_000]), &dest(), &own())
            .unwrap();
        let outputs = &unsigned.tx.outputs;
        assert_eq!(outputs[0].script_pubkey.p2sh_hash(), Some(*FundingAddress::collector().hash()));
        assert_eq!(outputs[1].script_pubkey.p2pkh_hash(), Some(*dest().as_bytes()));
    }

    #[test]
    fn empty_utxo_set_is_no_funds() {
        assert_eq!(
            TransactionBuilder::new().build(&[], &dest(), &own()).unwrap_err(),
            WalletError::NoFunds
        );
    }

    #[test]
    fn overflowing_balance_is_invalid_amount() {
        let err = TransactionBuilder::new()
            .build(&utxos(&[u64::MAX, 1]), &dest(), &own())
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(_)));
    }

    #[test]
    fn lock_time_is_configurable() {
        let mut builder = TransactionBuilder::default();
        builder.set_lock_time(500);
        let unsigned = builder.build(&utxos(&[1_000_000]), &dest(), &own()).unwrap();
        assert_eq!(unsigned.tx.lock_time, 500);
    }
}
