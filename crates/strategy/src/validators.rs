//! Reusable input validators. Each returns `None` to accept and
//! `Some(error)` to reject; none of them fail fatally.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::warn;

use common::{
    split_trading_pair, ExchangeDirectory, LookupError, MinimumOrderAmounts, TypeTag,
    ValidationError,
};

pub fn validate_exchange(directory: &dyn ExchangeDirectory, name: &str) -> Option<ValidationError> {
    if directory.is_known_exchange(name) {
        None
    } else {
        Some(ValidationError::UnknownExchange(name.to_string()))
    }
}

pub fn validate_market_trading_pair(
    directory: &dyn ExchangeDirectory,
    market: &str,
    pair: &str,
) -> Option<ValidationError> {
    if directory.is_listed(market, pair) {
        None
    } else {
        Some(ValidationError::UnlistedPair {
            market: market.to_string(),
            pair: pair.to_string(),
        })
    }
}

/// Check that `raw` is a decimal between `min` and `max`. Bounds are
/// accepted only when `inclusive` is set.
pub fn validate_decimal(
    raw: &str,
    min: Decimal,
    max: Decimal,
    inclusive: bool,
) -> Option<ValidationError> {
    let value = match Decimal::from_str(raw.trim()) {
        Ok(v) => v,
        Err(_) => {
            return Some(ValidationError::Parse {
                expected: TypeTag::Decimal,
                raw: raw.to_string(),
            })
        }
    };

    let in_range = if inclusive {
        min <= value && value <= max
    } else {
        min < value && value < max
    };

    if in_range {
        None
    } else {
        Some(ValidationError::OutOfRange {
            min,
            max,
            inclusive,
        })
    }
}

/// Check an order amount against the exchange minimum for `trading_pair`.
///
/// Lookup failures (malformed pair, unknown minimum, service down) all
/// collapse into [`ValidationError::LookupFailed`], which users see as a
/// generic message.
pub fn validate_order_amount(
    minimums: &dyn MinimumOrderAmounts,
    trading_pair: &str,
    raw: &str,
) -> Option<ValidationError> {
    let minimum = match minimum_for(minimums, trading_pair) {
        Ok(m) => m,
        Err(cause) => {
            warn!(pair = %trading_pair, error = %cause, "Minimum order amount lookup failed");
            return Some(ValidationError::LookupFailed(cause));
        }
    };

    let amount = match Decimal::from_str(raw.trim()) {
        Ok(v) => v,
        Err(_) => {
            return Some(ValidationError::Parse {
                expected: TypeTag::Decimal,
                raw: raw.to_string(),
            })
        }
    };

    if amount < minimum {
        Some(ValidationError::BelowMinimum { minimum })
    } else {
        None
    }
}

/// Minimum order amount for a `BASE-QUOTE` pair.
pub fn minimum_for(
    minimums: &dyn MinimumOrderAmounts,
    trading_pair: &str,
) -> Result<Decimal, LookupError> {
    if split_trading_pair(trading_pair).is_none() {
        return Err(LookupError::MalformedPair(trading_pair.to_string()));
    }
    minimums.minimum_order_amount(trading_pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MarketCatalog;
    use rust_decimal_macros::dec;

    struct FailingMinimums;

    impl MinimumOrderAmounts for FailingMinimums {
        fn minimum_order_amount(&self, _: &str) -> Result<Decimal, LookupError> {
            Err(LookupError::Unavailable("timeout".into()))
        }
    }

    #[test]
    fn exchange_must_be_known() {
        let catalog = MarketCatalog::builtin();
        assert!(validate_exchange(&catalog, "binance").is_none());
        assert_eq!(
            validate_exchange(&catalog, "ddex"),
            Some(ValidationError::UnknownExchange("ddex".into()))
        );
    }

    #[test]
    fn pair_must_be_listed_on_market() {
        let catalog = MarketCatalog::builtin();
        assert!(validate_market_trading_pair(&catalog, "binance", "ZRX-ETH").is_none());
        let err = validate_market_trading_pair(&catalog, "kucoin", "ZRX-ETH").unwrap();
        assert_eq!(err.to_string(), "'ZRX-ETH' is not a valid trading pair on kucoin.");
    }

    #[test]
    fn exclusive_bounds_reject_edges() {
        assert!(validate_decimal("0", dec!(0), dec!(100), false).is_some());
        assert!(validate_decimal("100", dec!(0), dec!(100), false).is_some());
        assert!(validate_decimal("0.01", dec!(0), dec!(100), false).is_none());
        assert!(validate_decimal("99.99", dec!(0), dec!(100), false).is_none());
    }

    #[test]
    fn inclusive_bounds_accept_edges() {
        assert!(validate_decimal("0", dec!(0), dec!(100), true).is_none());
        assert!(validate_decimal("100", dec!(0), dec!(100), true).is_none());
        assert!(validate_decimal("100.0001", dec!(0), dec!(100), true).is_some());
    }

    #[test]
    fn decimal_validator_reports_parse_failure() {
        assert!(matches!(
            validate_decimal("ten", dec!(0), dec!(100), false),
            Some(ValidationError::Parse { .. })
        ));
    }

    #[test]
    fn out_of_range_message_names_bounds() {
        let err = validate_decimal("150", dec!(0), dec!(100), false).unwrap();
        assert_eq!(err.to_string(), "Value must be between 0 and 100 (exclusive).");
    }

    #[test]
    fn order_amount_lookup_failure_hides_cause() {
        let err = validate_order_amount(&FailingMinimums, "ETH-USDT", "1").unwrap();
        assert_eq!(err.to_string(), "Invalid order amount.");
        assert_eq!(
            err,
            ValidationError::LookupFailed(LookupError::Unavailable("timeout".into()))
        );
    }

    #[test]
    fn order_amount_malformed_pair_is_lookup_failure() {
        let catalog = MarketCatalog::builtin();
        let err = validate_order_amount(&catalog, "ETHUSDT", "1").unwrap();
        assert_eq!(
            err,
            ValidationError::LookupFailed(LookupError::MalformedPair("ETHUSDT".into()))
        );
    }

    #[test]
    fn order_amount_below_minimum() {
        let catalog = MarketCatalog::builtin();
        let err = validate_order_amount(&catalog, "ETH-USDT", "0.001").unwrap();
        assert_eq!(err.to_string(), "Order amount must be at least 0.01.");
        assert!(validate_order_amount(&catalog, "ETH-USDT", "0.01").is_none());
    }
}
