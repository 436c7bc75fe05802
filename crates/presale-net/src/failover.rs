//! Primary/fallback chains over the collaborator traits.
//!
//! Each helper tries providers in the given order and returns the first
//! success. Every failure is logged; when all fail the collected errors come
//! back as [`NetError::AllProvidersFailed`]. Nothing is retried beyond one
//! attempt per provider.

use presale_core::address::FundingAddress;
use presale_core::types::{Transaction, Txid, Utxo};

use crate::error::NetError;
use crate::traits::{Broadcaster, TxFetcher, UtxoProvider};

fn all_failed(operation: &'static str, attempts: Vec<String>) -> NetError {
    NetError::AllProvidersFailed { operation, attempts }
}

pub async fn unspent_with_fallback(
    providers: &[&dyn UtxoProvider],
    address: &FundingAddress,
) -> Result<Vec<Utxo>, NetError> {
    let mut attempts = Vec::with_capacity(providers.len());
    for provider in providers {
        match provider.unspent(address).await {
            Ok(utxos) => {
                tracing::debug!(provider = provider.name(), count = utxos.len(), %address, "fetched unspent outputs");
                return Ok(utxos);
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "unspent output lookup failed");
                attempts.push(format!("{}: {e}", provider.name()));
            }
        }
    }
    Err(all_failed("unspent lookup", attempts))
}

pub async fn broadcast_with_fallback(
    broadcasters: &[&dyn Broadcaster],
    tx: &Transaction,
) -> Result<Txid, NetError> {
    let mut attempts = Vec::with_capacity(broadcasters.len());
    for broadcaster in broadcasters {
        match broadcaster.broadcast(tx).await {
            Ok(txid) => {
                tracing::info!(provider = broadcaster.name(), %txid, "transaction broadcast");
                return Ok(txid);
            }
            Err(e) => {
                tracing::warn!(provider = broadcaster.name(), error = %e, "broadcast failed");
                attempts.push(format!("{}: {e}", broadcaster.name()));
            }
        }
    }
    Err(all_failed("broadcast", attempts))
}

pub async fn fetch_with_fallback(fetchers: &[&dyn TxFetcher], txid: &Txid) -> Result<Vec<u8>, NetError> {
    let mut attempts = Vec::with_capacity(fetchers.len());
    for fetcher in fetchers {
        match fetcher.fetch_transaction(txid).await {
            Ok(raw) => return Ok(raw),
            Err(e) => {
                tracing::warn!(provider = fetcher.name(), %txid, error = %e, "transaction fetch failed");
                attempts.push(format!("{}: {e}", fetcher.name()));
            }
        }
    }
    Err(all_failed("transaction fetch", attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use presale_core::script::Script;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // --- Mocks ---

    struct MockProvider {
        name: &'static str,
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn ok(name: &'static str) -> Self {
            Self {
                name,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn down(name: &'static str) -> Self {
            Self {
                name,
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn attempt(&self) -> Result<(), NetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NetError::Http(format!("{} unreachable", self.name)))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl UtxoProvider for MockProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn unspent(&self, _: &FundingAddress) -> Result<Vec<Utxo>, NetError> {
            self.attempt()?;
            Ok(vec![Utxo::new(Txid([self.name.len() as u8; 32]), 0, 1_000_000)])
        }
    }

    #[async_trait]
    impl Broadcaster for MockProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn broadcast(&self, tx: &Transaction) -> Result<Txid, NetError> {
            self.attempt()?;
            Ok(tx.txid())
        }
    }

    #[async_trait]
    impl TxFetcher for MockProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch_transaction(&self, _: &Txid) -> Result<Vec<u8>, NetError> {
            self.attempt()?;
            Ok(self.name.as_bytes().to_vec())
        }
    }

    fn address() -> FundingAddress {
        FundingAddress::from_pubkey_hash([9; 20])
    }

    fn tx() -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![],
            outputs: vec![presale_core::types::TxOutput {
                value: 1,
                script_pubkey: Script::p2pkh(&[0; 20]),
            }],
            lock_time: 0,
        }
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let primary = MockProvider::ok("primary");
        let fallback = MockProvider::ok("fallback");
        let utxos = unspent_with_fallback(&[&primary, &fallback], &address()).await.unwrap();
        assert_eq!(utxos[0].outpoint.txid, Txid([7; 32]));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn falls_back_when_primary_down() {
        let primary = MockProvider::down("primary");
        let fallback = MockProvider::ok("fallback");
        let utxos = unspent_with_fallback(&[&primary, &fallback], &address()).await.unwrap();
        assert_eq!(utxos[0].outpoint.txid, Txid([8; 32]));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn all_down_reports_every_attempt() {
        let a = MockProvider::down("a");
        let b = MockProvider::down("b");
        let err = broadcast_with_fallback(&[&a, &b], &tx()).await.unwrap_err();
        assert_eq!(
            err,
            NetError::AllProvidersFailed {
                operation: "broadcast",
                attempts: vec!["a: http: a unreachable".into(), "b: http: b unreachable".into()],
            }
        );
    }

    #[tokio::test]
    async fn broadcast_returns_txid() {
        let ok = MockProvider::ok("ok");
        let txid = broadcast_with_fallback(&[&ok], &tx()).await.unwrap();
        assert_eq!(txid, tx().txid());
    }

    #[tokio::test]
    async fn fetch_falls_back() {
        let a = MockProvider::down("a");
        let b = MockProvider::ok("bee");
        let raw = fetch_with_fallback(&[&a, &b], &Txid::ZERO).await.unwrap();
        assert_eq!(raw, b"bee");
    }

    #[tokio::test]
    async fn empty_chain_fails() {
        let err = fetch_with_fallback(&[], &Txid::ZERO).await.unwrap_err();
        assert!(matches!(err, NetError::AllProvidersFailed { ref attempts, .. } if attempts.is_empty()));
    }
}
