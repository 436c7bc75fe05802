//! Purchase notification to the sale's mail endpoint.

use async_trait::async_trait;
use serde::Serialize;

use presale_core::types::Transaction;
use presale_wallet::WalletRecord;

use crate::config::NetConfig;
use crate::error::NetError;
use crate::http::checked;
use crate::traits::Notifier;

const NAME: &str = "sale notifier";

/// Request body: the signed transaction, the buyer's email and the whole
/// wallet record (so the sale can mail a backup).
#[derive(Serialize)]
struct Notification<'a> {
    tx: String,
    email: &'a str,
    emailjson: &'a WalletRecord,
}

#[derive(Debug, Clone)]
pub struct SaleNotifier {
    client: reqwest::Client,
    url: String,
}

impl SaleNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn from_config(config: &NetConfig) -> Result<Self, NetError> {
        Ok(Self::new(config.http_client()?, config.notify_url.clone()))
    }
}

fn notification_body(tx: &Transaction, record: &WalletRecord) -> Result<serde_json::Value, NetError> {
    serde_json::to_value(Notification {
        tx: tx.to_hex(),
        email: &record.email,
        emailjson: record,
    })
    .map_err(|e| NetError::Decode(e.to_string()))
}

#[async_trait]
impl Notifier for SaleNotifier {
    async fn notify_purchase(&self, tx: &Transaction, record: &WalletRecord) -> Result<(), NetError> {
        let body = notification_body(tx, record)?;
        let resp = self.client.post(&self.url).json(&body).send().await?;
        checked(NAME, resp).await?;
        tracing::info!(txid = %tx.txid(), "sale notified of purchase");
        Ok(())
    }
}
