use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use common::Result;

/// Price snapshot provider for one exchange.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Exchange name this source serves (e.g. "binance").
    fn exchange(&self) -> &str;

    /// Latest prices keyed by `BASE-QUOTE` trading pair.
    async fn fetch_prices(&self) -> Result<HashMap<String, Decimal>>;
}
