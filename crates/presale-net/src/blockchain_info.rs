//! blockchain.info API client.
//!
//! Endpoints used:
//! - `GET  /unspent?active=<address>` for unspent outputs
//! - `POST /pushtx` (form field `tx`) for broadcast
//! - `GET  /rawtx/<txid>?format=hex` for raw transactions

use async_trait::async_trait;
use serde::Deserialize;

use presale_core::address::FundingAddress;
use presale_core::types::{Transaction, Txid, Utxo};

use crate::config::NetConfig;
use crate::error::NetError;
use crate::http::{checked, decode_hex_body};
use crate::traits::{Broadcaster, TxFetcher, UtxoProvider};

const NAME: &str = "blockchain.info";

/// Body blockchain.info sends (with status 500) for an address without
/// unspent outputs.
const NO_FREE_OUTPUTS: &str = "No free outputs to spend";

#[derive(Debug, Clone)]
pub struct BlockchainInfo {
    client: reqwest::Client,
    base_url: String,
}

impl BlockchainInfo {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &NetConfig) -> Result<Self, NetError> {
        Ok(Self::new(config.http_client()?, config.blockchain_info_url.clone()))
    }
}

#[derive(Deserialize)]
struct UnspentResponse {
    unspent_outputs: Vec<UnspentOutput>,
}

#[derive(Deserialize)]
struct UnspentOutput {
    /// Txid in display (byte-reversed) order.
    tx_hash_big_endian: String,
    tx_output_n: u32,
    value: u64,
}

fn parse_unspent(body: &str) -> Result<Vec<Utxo>, NetError> {
    let resp: UnspentResponse =
        serde_json::from_str(body).map_err(|e| NetError::Decode(format!("unspent outputs: {e}")))?;
    resp.unspent_outputs
        .into_iter()
        .map(|o| {
            let txid = Txid::from_hex(&o.tx_hash_big_endian).map_err(|e| NetError::Decode(e.to_string()))?;
            Ok(Utxo::new(txid, o.tx_output_n, o.value))
        })
        .collect()
}

#[async_trait]
impl UtxoProvider for BlockchainInfo {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn unspent(&self, address: &FundingAddress) -> Result<Vec<Utxo>, NetError> {
        let url = format!("{}/unspent", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("active", address.to_string())])
            .send()
            .await?;

        match checked(NAME, resp).await {
            Ok(resp) => parse_unspent(&resp.text().await?),
            Err(NetError::Status { body, .. }) if body.contains(NO_FREE_OUTPUTS) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Broadcaster for BlockchainInfo {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, NetError> {
        let url = format!("{}/pushtx", self.base_url);
        let resp = self
            .client
            .post(&url)
            .form(&[("tx", tx.to_hex())])
            .send()
            .await?;
        checked(NAME, resp).await?;
        Ok(tx.txid())
    }
}

#[async_trait]
impl TxFetcher for BlockchainInfo {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_transaction(&self, txid: &Txid) -> Result<Vec<u8>, NetError> {
        let url = format!("{}/rawtx/{txid}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("format", "hex")])
            .send()
            .await?;
        let body = checked(NAME, resp).await?.text().await?;
        decode_hex_body(&body)
    }
}
