//! Config registry for the cross-exchange market making strategy.
//!
//! Declaration order matters: trading-pair prompts read the market entries,
//! the order amount reads the maker pair, and the taker-market hook reads
//! the maker market. Reordering entries breaks those lookups.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use common::{
    split_trading_pair, ConfigValue, Error, ExamplePairs, ExchangeDirectory, MarketCatalog,
    MinimumOrderAmounts, PriceFeed, Result, TypeTag,
};

use crate::validators::{
    minimum_for, validate_decimal, validate_exchange, validate_market_trading_pair,
    validate_order_amount,
};
use crate::{ConfigRegistry, ConfigVar, RequiredExchanges};

pub const STRATEGY_NAME: &str = "cross_exchange_market_making";

pub mod keys {
    pub const STRATEGY: &str = "strategy";
    pub const MAKER_MARKET: &str = "maker_market";
    pub const TAKER_MARKET: &str = "taker_market";
    pub const MAKER_MARKET_TRADING_PAIR: &str = "maker_market_trading_pair";
    pub const TAKER_MARKET_TRADING_PAIR: &str = "taker_market_trading_pair";
    pub const MIN_PROFITABILITY: &str = "min_profitability";
    pub const ORDER_AMOUNT: &str = "order_amount";
    pub const ADJUST_ORDER_ENABLED: &str = "adjust_order_enabled";
    pub const ACTIVE_ORDER_CANCELING: &str = "active_order_canceling";
    pub const CANCEL_ORDER_THRESHOLD: &str = "cancel_order_threshold";
    pub const LIMIT_ORDER_MIN_EXPIRATION: &str = "limit_order_min_expiration";
    pub const TOP_DEPTH_TOLERANCE: &str = "top_depth_tolerance";
    pub const ANTI_HYSTERESIS_DURATION: &str = "anti_hysteresis_duration";
    pub const ORDER_SIZE_TAKER_VOLUME_FACTOR: &str = "order_size_taker_volume_factor";
    pub const ORDER_SIZE_TAKER_BALANCE_FACTOR: &str = "order_size_taker_balance_factor";
    pub const ORDER_SIZE_PORTFOLIO_RATIO_LIMIT: &str = "order_size_portfolio_ratio_limit";
}

/// Collaborators the XEMM entries call into.
#[derive(Clone)]
pub struct XemmDeps {
    pub directory: Arc<dyn ExchangeDirectory>,
    pub examples: Arc<dyn ExamplePairs>,
    pub minimums: Arc<dyn MinimumOrderAmounts>,
    pub required_exchanges: RequiredExchanges,
    pub price_feed: Arc<dyn PriceFeed>,
}

impl XemmDeps {
    /// Wire every lookup to a single market catalog.
    pub fn from_catalog(
        catalog: Arc<MarketCatalog>,
        required_exchanges: RequiredExchanges,
        price_feed: Arc<dyn PriceFeed>,
    ) -> Self {
        Self {
            directory: catalog.clone(),
            examples: catalog.clone(),
            minimums: catalog,
            required_exchanges,
            price_feed,
        }
    }
}

/// Build the XEMM registry with its entries in resolution order.
pub fn build(deps: &XemmDeps) -> Result<ConfigRegistry> {
    let entries = vec![
        ConfigVar::new(keys::STRATEGY, TypeTag::String).with_default(STRATEGY_NAME),
        ConfigVar::new(keys::MAKER_MARKET, TypeTag::String)
            .prompt("Enter your maker exchange name >>> ")
            .prompt_on_new()
            .validator(exchange_validator(deps.directory.clone()))
            .on_validated({
                let required = deps.required_exchanges.clone();
                move |value: &ConfigValue, _: &ConfigRegistry| {
                    required.push(hook_str(keys::MAKER_MARKET, value)?);
                    Ok(())
                }
            }),
        ConfigVar::new(keys::TAKER_MARKET, TypeTag::String)
            .prompt("Enter your taker exchange name >>> ")
            .prompt_on_new()
            .validator(exchange_validator(deps.directory.clone()))
            .on_validated(taker_market_on_validated(
                deps.required_exchanges.clone(),
                deps.price_feed.clone(),
            )),
        ConfigVar::new(keys::MAKER_MARKET_TRADING_PAIR, TypeTag::String)
            .prompt_with(trading_pair_prompt(
                "maker",
                keys::MAKER_MARKET,
                deps.examples.clone(),
            ))
            .prompt_on_new()
            .validator(trading_pair_validator(
                keys::MAKER_MARKET,
                deps.directory.clone(),
            )),
        ConfigVar::new(keys::TAKER_MARKET_TRADING_PAIR, TypeTag::String)
            .prompt_with(trading_pair_prompt(
                "taker",
                keys::TAKER_MARKET,
                deps.examples.clone(),
            ))
            .prompt_on_new()
            .validator(trading_pair_validator(
                keys::TAKER_MARKET,
                deps.directory.clone(),
            )),
        ConfigVar::new(keys::MIN_PROFITABILITY, TypeTag::Decimal)
            .prompt(
                "What is the minimum profitability for you to make a trade? \
                 (Enter 1 to indicate 1%) >>> ",
            )
            .prompt_on_new()
            .validator(|raw: &str, _: &ConfigRegistry| {
                Ok(validate_decimal(raw, Decimal::ZERO, Decimal::ONE_HUNDRED, false))
            }),
        ConfigVar::new(keys::ORDER_AMOUNT, TypeTag::Decimal)
            .prompt_with(order_amount_prompt(deps.minimums.clone()))
            .prompt_on_new()
            .validator({
                let minimums = deps.minimums.clone();
                move |raw: &str, registry: &ConfigRegistry| {
                    let pair = registry.str_value(keys::MAKER_MARKET_TRADING_PAIR)?;
                    Ok(validate_order_amount(minimums.as_ref(), pair, raw))
                }
            }),
        // Advanced settings below are never prompted; strategy construction
        // still reads every key.
        ConfigVar::new(keys::ADJUST_ORDER_ENABLED, TypeTag::Bool)
            .with_default(true)
            .required_if(never),
        ConfigVar::new(keys::ACTIVE_ORDER_CANCELING, TypeTag::Bool)
            .with_default(true)
            .required_if(never),
        // Non-zero so that disabling active canceling does not cancel
        // orders right after they expire.
        ConfigVar::new(keys::CANCEL_ORDER_THRESHOLD, TypeTag::Decimal)
            .with_default(Decimal::from(5))
            .required_if(never),
        ConfigVar::new(keys::LIMIT_ORDER_MIN_EXPIRATION, TypeTag::Float)
            .with_default(130.0)
            .required_if(never),
        ConfigVar::new(keys::TOP_DEPTH_TOLERANCE, TypeTag::Decimal)
            .with_default(Decimal::ZERO)
            .required_if(never),
        ConfigVar::new(keys::ANTI_HYSTERESIS_DURATION, TypeTag::Float)
            .with_default(60.0)
            .required_if(never),
        ConfigVar::new(keys::ORDER_SIZE_TAKER_VOLUME_FACTOR, TypeTag::Decimal)
            .with_default(Decimal::from(25))
            .required_if(never),
        ConfigVar::new(keys::ORDER_SIZE_TAKER_BALANCE_FACTOR, TypeTag::Decimal)
            .with_default(Decimal::new(995, 1))
            .required_if(never),
        ConfigVar::new(keys::ORDER_SIZE_PORTFOLIO_RATIO_LIMIT, TypeTag::Decimal)
            .with_default(Decimal::new(1667, 2))
            .required_if(never),
    ];

    ConfigRegistry::from_entries(STRATEGY_NAME, entries)
}

fn never(_: &ConfigRegistry) -> bool {
    false
}

fn hook_str<'v>(key: &str, value: &'v ConfigValue) -> Result<&'v str> {
    value.as_str().ok_or_else(|| Error::TypeMismatch {
        key: key.to_string(),
        expected: TypeTag::String,
        actual: value.type_tag(),
    })
}

fn exchange_validator(
    directory: Arc<dyn ExchangeDirectory>,
) -> impl Fn(&str, &ConfigRegistry) -> Result<Option<common::ValidationError>> + Send + Sync + 'static
{
    move |raw: &str, _: &ConfigRegistry| Ok(validate_exchange(directory.as_ref(), raw))
}

fn trading_pair_validator(
    market_key: &'static str,
    directory: Arc<dyn ExchangeDirectory>,
) -> impl Fn(&str, &ConfigRegistry) -> Result<Option<common::ValidationError>> + Send + Sync + 'static
{
    move |raw: &str, registry: &ConfigRegistry| {
        let market = registry.str_value(market_key)?;
        Ok(validate_market_trading_pair(directory.as_ref(), market, raw))
    }
}

fn trading_pair_prompt(
    side: &'static str,
    market_key: &'static str,
    examples: Arc<dyn ExamplePairs>,
) -> impl Fn(&ConfigRegistry) -> Result<String> + Send + Sync + 'static {
    move |registry: &ConfigRegistry| {
        let market = registry.str_value(market_key)?;
        let example = examples
            .example_pair(market)
            .map(|pair| format!(" (e.g. {pair})"))
            .unwrap_or_default();
        Ok(format!(
            "Enter the token trading pair you would like to trade on {side} market: \
             {market}{example} >>> "
        ))
    }
}

/// When the minimum cannot be looked up the prompt leaves it out; the
/// validator reports the failure once the user answers.
fn order_amount_prompt(
    minimums: Arc<dyn MinimumOrderAmounts>,
) -> impl Fn(&ConfigRegistry) -> Result<String> + Send + Sync + 'static {
    move |registry: &ConfigRegistry| {
        let pair = registry.str_value(keys::MAKER_MARKET_TRADING_PAIR)?;
        let base = split_trading_pair(pair).map_or(pair, |(base, _)| base);
        let minimum = minimum_for(minimums.as_ref(), pair)
            .map(|min| format!(" (minimum {min})"))
            .unwrap_or_default();
        Ok(format!("What is the amount of {base} per order?{minimum} >>> "))
    }
}

/// Register the taker as required, then point the price feed at exactly
/// the maker and taker markets and (re)start it. The maker market must be
/// resolved before this runs.
pub fn taker_market_on_validated(
    required_exchanges: RequiredExchanges,
    price_feed: Arc<dyn PriceFeed>,
) -> impl Fn(&ConfigValue, &ConfigRegistry) -> Result<()> + Send + Sync + 'static {
    move |value: &ConfigValue, registry: &ConfigRegistry| {
        let taker = hook_str(keys::TAKER_MARKET, value)?;
        required_exchanges.push(taker);
        let maker = registry.str_value(keys::MAKER_MARKET)?;
        info!(maker = %maker, taker = %taker, "Restarting price feed for configured markets");
        price_feed.set_exchanges_to_feed(vec![maker.to_string(), taker.to_string()]);
        price_feed.start()
    }
}

/// Typed view of a resolved XEMM registry, handed to strategy construction.
#[derive(Debug, Clone, PartialEq)]
pub struct XemmParams {
    pub strategy: String,
    pub maker_market: String,
    pub taker_market: String,
    pub maker_market_trading_pair: String,
    pub taker_market_trading_pair: String,
    pub min_profitability: Decimal,
    pub order_amount: Decimal,
    pub adjust_order_enabled: bool,
    pub active_order_canceling: bool,
    pub cancel_order_threshold: Decimal,
    pub limit_order_min_expiration: f64,
    pub top_depth_tolerance: Decimal,
    pub anti_hysteresis_duration: f64,
    pub order_size_taker_volume_factor: Decimal,
    pub order_size_taker_balance_factor: Decimal,
    pub order_size_portfolio_ratio_limit: Decimal,
}

impl XemmParams {
    pub fn from_registry(registry: &ConfigRegistry) -> Result<Self> {
        Ok(Self {
            strategy: registry.str_value(keys::STRATEGY)?.to_string(),
            maker_market: registry.str_value(keys::MAKER_MARKET)?.to_string(),
            taker_market: registry.str_value(keys::TAKER_MARKET)?.to_string(),
            maker_market_trading_pair: registry
                .str_value(keys::MAKER_MARKET_TRADING_PAIR)?
                .to_string(),
            taker_market_trading_pair: registry
                .str_value(keys::TAKER_MARKET_TRADING_PAIR)?
                .to_string(),
            min_profitability: registry.decimal_value(keys::MIN_PROFITABILITY)?,
            order_amount: registry.decimal_value(keys::ORDER_AMOUNT)?,
            adjust_order_enabled: registry.bool_value(keys::ADJUST_ORDER_ENABLED)?,
            active_order_canceling: registry.bool_value(keys::ACTIVE_ORDER_CANCELING)?,
            cancel_order_threshold: registry.decimal_value(keys::CANCEL_ORDER_THRESHOLD)?,
            limit_order_min_expiration: registry.float_value(keys::LIMIT_ORDER_MIN_EXPIRATION)?,
            top_depth_tolerance: registry.decimal_value(keys::TOP_DEPTH_TOLERANCE)?,
            anti_hysteresis_duration: registry.float_value(keys::ANTI_HYSTERESIS_DURATION)?,
            order_size_taker_volume_factor: registry
                .decimal_value(keys::ORDER_SIZE_TAKER_VOLUME_FACTOR)?,
            order_size_taker_balance_factor: registry
                .decimal_value(keys::ORDER_SIZE_TAKER_BALANCE_FACTOR)?,
            order_size_portfolio_ratio_limit: registry
                .decimal_value(keys::ORDER_SIZE_PORTFOLIO_RATIO_LIMIT)?,
        })
    }
}
