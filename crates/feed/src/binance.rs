use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use common::{split_trading_pair, Error, Result};

use crate::PriceSource;

/// Polls Binance's public ticker endpoint for every listed pair at once.
pub struct BinanceTickerSource {
    base_url: String,
    http: Client,
    /// Binance symbol ("ETHUSDT") to catalog pair ("ETH-USDT").
    symbols: HashMap<String, String>,
}

impl BinanceTickerSource {
    pub fn new<I, S>(base_url: impl Into<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            symbols: symbol_map(pairs),
        })
    }
}

#[async_trait]
impl PriceSource for BinanceTickerSource {
    fn exchange(&self) -> &str {
        "binance"
    }

    async fn fetch_prices(&self) -> Result<HashMap<String, Decimal>> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }

        let tickers: Vec<PriceTicker> = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;
        let prices = collect_prices(&self.symbols, tickers);
        debug!(pairs = prices.len(), "Binance tickers fetched");
        Ok(prices)
    }
}

fn symbol_map<I, S>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pairs
        .into_iter()
        .filter_map(|pair| {
            let pair = pair.as_ref();
            let (base, quote) = split_trading_pair(pair)?;
            Some((format!("{base}{quote}").to_uppercase(), pair.to_string()))
        })
        .collect()
}

/// Keep only tickers for listed pairs; unparseable prices are dropped.
fn collect_prices(
    symbols: &HashMap<String, String>,
    tickers: Vec<PriceTicker>,
) -> HashMap<String, Decimal> {
    tickers
        .into_iter()
        .filter_map(|t| {
            let pair = symbols.get(&t.symbol)?;
            let price = Decimal::from_str(&t.price).ok()?;
            Some((pair.clone(), price))
        })
        .collect()
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PriceTicker {
    symbol: String,
    price: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn symbols_map_back_to_catalog_pairs() {
        let map = symbol_map(["ETH-USDT", "zrx-eth", "BROKEN"]);
        assert_eq!(map.get("ETHUSDT").map(String::as_str), Some("ETH-USDT"));
        assert_eq!(map.get("ZRXETH").map(String::as_str), Some("zrx-eth"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn unlisted_and_garbled_tickers_are_dropped() {
        let map = symbol_map(["ETH-USDT", "BTC-USDT"]);
        let tickers = vec![
            PriceTicker {
                symbol: "ETHUSDT".into(),
                price: "3120.55000000".into(),
            },
            PriceTicker {
                symbol: "BTCUSDT".into(),
                price: "n/a".into(),
            },
            PriceTicker {
                symbol: "DOGEUSDT".into(),
                price: "0.1".into(),
            },
        ];
        let prices = collect_prices(&map, tickers);
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["ETH-USDT"], dec!(3120.55));
    }
}
