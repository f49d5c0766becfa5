use rust_decimal::Decimal;

use crate::{LookupError, Result};

/// Knowledge about which exchanges exist and what they list.
pub trait ExchangeDirectory: Send + Sync {
    /// Whether `name` is a known exchange.
    fn is_known_exchange(&self, name: &str) -> bool;

    /// Whether `pair` (e.g. "ETH-USDT") is listed on `market`.
    fn is_listed(&self, market: &str, pair: &str) -> bool;
}

/// Example trading pairs shown in prompts, keyed by market name.
pub trait ExamplePairs: Send + Sync {
    fn example_pair(&self, market: &str) -> Option<String>;
}

/// Minimum order size lookup. May fail for malformed pairs or when the
/// backing service is unreachable.
pub trait MinimumOrderAmounts: Send + Sync {
    fn minimum_order_amount(&self, trading_pair: &str) -> Result<Decimal, LookupError>;
}

/// Background price-feed service driven by config hooks.
///
/// Both calls are fire-and-forget: `start` must not block on feed readiness,
/// and each `set_exchanges_to_feed` + `start` pair fully supersedes the
/// previous subscription.
pub trait PriceFeed: Send + Sync {
    fn set_exchanges_to_feed(&self, exchanges: Vec<String>);

    fn start(&self) -> Result<()>;
}
