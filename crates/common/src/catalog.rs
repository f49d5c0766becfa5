use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    split_trading_pair, ExamplePairs, ExchangeDirectory, LookupError, MinimumOrderAmounts,
    Result,
};

/// Static market knowledge consumed by validators and prompts.
///
/// Example `config/markets.toml`:
/// ```toml
/// default_minimum_order_amount = "0.001"
///
/// [exchanges.binance]
/// example_pair = "ZRX-ETH"
/// pairs = ["ETH-USDT", "ZRX-ETH"]
///
/// [minimum_order_amounts]
/// "ETH-USDT" = "0.5"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MarketCatalog {
    #[serde(default)]
    pub exchanges: BTreeMap<String, ExchangeListing>,
    #[serde(default)]
    pub minimum_order_amounts: HashMap<String, Decimal>,
    /// Used for listed pairs without an explicit minimum.
    #[serde(default)]
    pub default_minimum_order_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExchangeListing {
    #[serde(default)]
    pub example_pair: Option<String>,
    #[serde(default)]
    pub pairs: Vec<String>,
}

impl MarketCatalog {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml(&content)?;
        info!(
            path,
            exchanges = catalog.exchanges.len(),
            "Market catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Catalog used when no file is configured.
    pub fn builtin() -> Self {
        let listing = |example: Option<&str>, pairs: &[&str]| ExchangeListing {
            example_pair: example.map(str::to_string),
            pairs: pairs.iter().map(|p| p.to_string()).collect(),
        };

        let mut exchanges = BTreeMap::new();
        exchanges.insert(
            "binance".to_string(),
            listing(Some("ZRX-ETH"), &["BTC-USDT", "ETH-USDT", "ETH-BTC", "ZRX-ETH"]),
        );
        exchanges.insert(
            "kucoin".to_string(),
            listing(Some("ETH-USDT"), &["BTC-USDT", "ETH-USDT", "ETH-BTC"]),
        );
        exchanges.insert(
            "coinbase_pro".to_string(),
            listing(Some("ETH-USDC"), &["BTC-USD", "ETH-USD", "ETH-USDC"]),
        );
        exchanges.insert("huobi".to_string(), listing(None, &["btc-usdt", "eth-usdt"]));

        let minimum_order_amounts = [
            ("BTC-USDT", Decimal::new(1, 4)),
            ("ETH-USDT", Decimal::new(1, 2)),
            ("ETH-BTC", Decimal::new(1, 2)),
            ("ZRX-ETH", Decimal::from(1)),
            ("BTC-USD", Decimal::new(1, 4)),
            ("ETH-USD", Decimal::new(1, 2)),
            ("ETH-USDC", Decimal::new(1, 2)),
            ("btc-usdt", Decimal::new(1, 4)),
            ("eth-usdt", Decimal::new(1, 2)),
        ]
        .into_iter()
        .map(|(pair, min)| (pair.to_string(), min))
        .collect();

        Self {
            exchanges,
            minimum_order_amounts,
            default_minimum_order_amount: None,
        }
    }

    pub fn exchange_names(&self) -> impl Iterator<Item = &str> {
        self.exchanges.keys().map(String::as_str)
    }
}

impl ExchangeDirectory for MarketCatalog {
    fn is_known_exchange(&self, name: &str) -> bool {
        self.exchanges.contains_key(name)
    }

    fn is_listed(&self, market: &str, pair: &str) -> bool {
        self.exchanges
            .get(market)
            .map(|listing| listing.pairs.iter().any(|p| p == pair))
            .unwrap_or(false)
    }
}

impl ExamplePairs for MarketCatalog {
    fn example_pair(&self, market: &str) -> Option<String> {
        self.exchanges.get(market)?.example_pair.clone()
    }
}

impl MinimumOrderAmounts for MarketCatalog {
    fn minimum_order_amount(&self, trading_pair: &str) -> Result<Decimal, LookupError> {
        if split_trading_pair(trading_pair).is_none() {
            return Err(LookupError::MalformedPair(trading_pair.to_string()));
        }
        self.minimum_order_amounts
            .get(trading_pair)
            .copied()
            .or(self.default_minimum_order_amount)
            .ok_or_else(|| LookupError::NoMinimum(trading_pair.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
default_minimum_order_amount = "0.001"

[exchanges.binance]
example_pair = "ZRX-ETH"
pairs = ["ETH-USDT", "ZRX-ETH"]

[exchanges.kucoin]
pairs = ["ETH-USDT"]

[minimum_order_amounts]
"ETH-USDT" = "0.5"
"#;

    #[test]
    fn parses_toml_catalog() {
        let catalog = MarketCatalog::from_toml(SAMPLE).unwrap();
        assert!(catalog.is_known_exchange("binance"));
        assert!(!catalog.is_known_exchange("ddex"));
        assert!(catalog.is_listed("kucoin", "ETH-USDT"));
        assert!(!catalog.is_listed("kucoin", "ZRX-ETH"));
        assert_eq!(catalog.example_pair("binance").as_deref(), Some("ZRX-ETH"));
        assert_eq!(catalog.example_pair("kucoin"), None);
    }

    #[test]
    fn minimum_falls_back_to_default() {
        let catalog = MarketCatalog::from_toml(SAMPLE).unwrap();
        assert_eq!(catalog.minimum_order_amount("ETH-USDT").unwrap(), dec!(0.5));
        assert_eq!(catalog.minimum_order_amount("ZRX-ETH").unwrap(), dec!(0.001));
    }

    #[test]
    fn minimum_rejects_malformed_pair() {
        let catalog = MarketCatalog::builtin();
        assert_eq!(
            catalog.minimum_order_amount("ETHUSDT"),
            Err(LookupError::MalformedPair("ETHUSDT".into()))
        );
        assert_eq!(
            catalog.minimum_order_amount("DOGE-USDT"),
            Err(LookupError::NoMinimum("DOGE-USDT".into()))
        );
    }

    #[test]
    fn builtin_lists_minimum_for_every_pair() {
        let catalog = MarketCatalog::builtin();
        for (exchange, listing) in &catalog.exchanges {
            for pair in &listing.pairs {
                assert!(
                    catalog.minimum_order_amount(pair).is_ok(),
                    "{exchange} lists {pair} without a minimum"
                );
            }
        }
        assert_eq!(catalog.minimum_order_amount("ETH-USDC").unwrap(), dec!(0.01));
    }

    #[test]
    fn load_reads_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let catalog = MarketCatalog::load(file.path().to_str().unwrap()).unwrap();
        assert!(catalog.is_listed("binance", "ZRX-ETH"));
        assert_eq!(catalog.minimum_order_amount("ETH-USDT").unwrap(), dec!(0.5));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("markets.toml");
        let err = MarketCatalog::load(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"exchanges = 3").unwrap();
        let err = MarketCatalog::load(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, crate::Error::Toml(_)));
    }

    #[test]
    fn builtin_has_example_gaps() {
        let catalog = MarketCatalog::builtin();
        assert!(catalog.example_pair("huobi").is_none());
        assert!(catalog.example_pair("binance").is_some());
    }
}
