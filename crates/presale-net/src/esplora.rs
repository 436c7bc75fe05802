//! Esplora REST client (Blockstream and compatible explorers).
//!
//! Endpoints used:
//! - `GET  /address/<address>/utxo`
//! - `POST /tx` with the raw hex as body, answered with the txid
//! - `GET  /tx/<txid>/hex`

use async_trait::async_trait;
use serde::Deserialize;

use presale_core::address::FundingAddress;
use presale_core::types::{Transaction, Txid, Utxo};

use crate::config::NetConfig;
use crate::error::NetError;
use crate::http::{checked, decode_hex_body};
use crate::traits::{Broadcaster, TxFetcher, UtxoProvider};

const NAME: &str = "esplora";

#[derive(Debug, Clone)]
pub struct Esplora {
    client: reqwest::Client,
    base_url: String,
}

impl Esplora {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &NetConfig) -> Result<Self, NetError> {
        Ok(Self::new(config.http_client()?, config.esplora_url.clone()))
    }
}

#[derive(Deserialize)]
struct EsploraUtxo {
    txid: Txid,
    vout: u32,
    value: u64,
}

fn parse_utxos(body: &str) -> Result<Vec<Utxo>, NetError> {
    let utxos: Vec<EsploraUtxo> =
        serde_json::from_str(body).map_err(|e| NetError::Decode(format!("utxo list: {e}")))?;
    Ok(utxos
        .into_iter()
        .map(|u| Utxo::new(u.txid, u.vout, u.value))
        .collect())
}

/// The txid the explorer echoes back must be the one we computed.
fn check_broadcast_txid(body: &str, tx: &Transaction) -> Result<Txid, NetError> {
    let expected = tx.txid();
    let got = Txid::from_hex(body).map_err(|e| NetError::Decode(format!("broadcast reply: {e}")))?;
    if got != expected {
        return Err(NetError::Decode(format!("broadcast reply txid {got}, expected {expected}")));
    }
    Ok(got)
}

#[async_trait]
impl UtxoProvider for Esplora {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn unspent(&self, address: &FundingAddress) -> Result<Vec<Utxo>, NetError> {
        let url = format!("{}/address/{address}/utxo", self.base_url);
        let resp = self.client.get(&url).send().await?;
        parse_utxos(&checked(NAME, resp).await?.text().await?)
    }
}

#[async_trait]
impl Broadcaster for Esplora {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, NetError> {
        let url = format!("{}/tx", self.base_url);
        let resp = self.client.post(&url).body(tx.to_hex()).send().await?;
        let body = checked(NAME, resp).await?.text().await?;
        check_broadcast_txid(&body, tx)
    }
}

#[async_trait]
impl TxFetcher for Esplora {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_transaction(&self, txid: &Txid) -> Result<Vec<u8>, NetError> {
        let url = format!("{}/tx/{txid}/hex", self.base_url);
        let resp = self.client.get(&url).send().await?;
        decode_hex_body(&checked(NAME, resp).await?.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presale_core::script::Script;
    use presale_core::types::{OutPoint, TxInput, TxOutput};

    fn tx() -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput {
                previous_output: OutPoint {
                    txid: Txid([3; 32]),
                    index: 0,
                },
                script_sig: Script::new(),
                sequence: u32::MAX,
            }],
            outputs: vec![TxOutput {
                value: 5,
                script_pubkey: Script::p2pkh(&[0; 20]),
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn parse_utxo_list() {
        let body = r#"[
            {"txid": "0202020202020202020202020202020202020202020202020202020202020202", "vout": 1,
             "status": {"confirmed": true, "block_height": 300000}, "value": 1000000},
            {"txid": "0303030303030303030303030303030303030303030303030303030303030303", "vout": 0,
             "status": {"confirmed": false}, "value": 5}
        ]"#;
        let utxos = parse_utxos(body).unwrap();
        assert_eq!(utxos, vec![
            Utxo::new(Txid([2; 32]), 1, 1_000_000),
            Utxo::new(Txid([3; 32]), 0, 5),
        ]);
    }

    #[test]
    fn parse_empty_list() {
        assert!(parse_utxos("[]").unwrap().is_empty());
        assert!(matches!(parse_utxos("{}"), Err(NetError::Decode(_))));
    }

    #[test]
    fn broadcast_reply_must_match() {
        let tx = tx();
        assert_eq!(check_broadcast_txid(&format!("{}\n", tx.txid()), &tx).unwrap(), tx.txid());
        assert!(matches!(
            check_broadcast_txid(&Txid::ZERO.to_string(), &tx),
            Err(NetError::Decode(_))
        ));
        assert!(matches!(
            check_broadcast_txid("sendrawtransaction RPC error", &tx),
            Err(NetError::Decode(_))
        ));
    }
}
