//! Network configuration loaded from environment variables.

use std::time::Duration;

use crate::error::NetError;

pub const DEFAULT_BLOCKCHAIN_INFO_URL: &str = "https://blockchain.info";
pub const DEFAULT_ESPLORA_URL: &str = "https://blockstream.info/api";
pub const DEFAULT_NOTIFY_URL: &str = "https://sale.ethereum.org/sendmail";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Endpoints and timeouts for the HTTP providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetConfig {
    /// Base URL of the blockchain.info API.
    pub blockchain_info_url: String,
    /// Base URL of an Esplora (Blockstream-compatible) REST API.
    pub esplora_url: String,
    /// Endpoint receiving purchase notifications.
    pub notify_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            blockchain_info_url: DEFAULT_BLOCKCHAIN_INFO_URL.to_string(),
            esplora_url: DEFAULT_ESPLORA_URL.to_string(),
            notify_url: DEFAULT_NOTIFY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl NetConfig {
    /// Load configuration from `PRESALE_*` environment variables, falling
    /// back to the defaults for unset ones.
    pub fn from_env() -> Result<Self, NetError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NetError> {
        let defaults = Self::default();

        let blockchain_info_url = lookup("PRESALE_BLOCKCHAIN_INFO_URL")
            .unwrap_or(defaults.blockchain_info_url);
        let esplora_url = lookup("PRESALE_ESPLORA_URL").unwrap_or(defaults.esplora_url);
        let notify_url = lookup("PRESALE_NOTIFY_URL").unwrap_or(defaults.notify_url);

        let timeout = match lookup("PRESALE_HTTP_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v.trim().parse().map_err(|_| {
                    NetError::Config(format!("PRESALE_HTTP_TIMEOUT_SECS must be a positive integer, got {v:?}"))
                })?;
                if secs == 0 {
                    return Err(NetError::Config("PRESALE_HTTP_TIMEOUT_SECS must be positive".into()));
                }
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Self {
            blockchain_info_url: trim_base(blockchain_info_url),
            esplora_url: trim_base(esplora_url),
            notify_url,
            timeout,
        })
    }

    /// HTTP client honouring the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, NetError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("presale-wallet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(NetError::from)
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = NetConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, NetConfig::default());
        assert_eq!(cfg.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn overrides_and_trailing_slash() {
        let cfg = NetConfig::from_lookup(lookup(&[
            ("PRESALE_ESPLORA_URL", "http://localhost:3000/"),
            ("PRESALE_NOTIFY_URL", "http://localhost:9/notify"),
            ("PRESALE_HTTP_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.esplora_url, "http://localhost:3000");
        assert_eq!(cfg.notify_url, "http://localhost:9/notify");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.blockchain_info_url, DEFAULT_BLOCKCHAIN_INFO_URL);
    }

    #[test]
    fn bad_timeout_rejected() {
        for bad in ["abc", "0", "-1"] {
            let err = NetConfig::from_lookup(lookup(&[("PRESALE_HTTP_TIMEOUT_SECS", bad)])).unwrap_err();
            assert!(matches!(err, NetError::Config(_)), "{bad}");
        }
    }

    #[test]
    fn client_builds() {
        assert!(NetConfig::default().http_client().is_ok());
    }
}
