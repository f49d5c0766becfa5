use std::time::Duration;

use crate::{Error, MarketCatalog, Result};

/// Process settings loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Market catalog TOML file. The built-in catalog is used when unset.
    pub market_catalog_path: Option<String>,

    /// How often each fed exchange is polled for prices.
    pub feed_poll_interval: Duration,

    /// Base URL of the Binance REST API used by the price feed.
    pub binance_rest_url: String,
}

impl Settings {
    const DEFAULT_POLL_SECS: u64 = 30;

    /// Load settings from environment variables. Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from `lookup`, which maps a variable name to its value.
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let feed_poll_interval = match optional("FEED_POLL_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!(
                        "FEED_POLL_INTERVAL_SECS must be a whole number of seconds, got: '{raw}'"
                    ))
                })?;
                if secs == 0 {
                    return Err(Error::Config(
                        "FEED_POLL_INTERVAL_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(Self::DEFAULT_POLL_SECS),
        };

        Ok(Settings {
            market_catalog_path: optional("MARKET_CATALOG_PATH"),
            feed_poll_interval,
            binance_rest_url: optional("BINANCE_REST_URL")
                .unwrap_or_else(|| "https://api.binance.com".to_string()),
        })
    }

    /// The configured catalog file, or the built-in catalog.
    pub fn market_catalog(&self) -> Result<MarketCatalog> {
        match &self.market_catalog_path {
            Some(path) => MarketCatalog::load(path),
            None => Ok(MarketCatalog::builtin()),
        }
    }
}
