pub mod catalog;
pub mod config;
pub mod error;
pub mod exchange;
pub mod types;

pub use catalog::{ExchangeListing, MarketCatalog};
pub use config::Settings;
pub use error::{Error, LookupError, Result, ValidationError};
pub use exchange::{ExamplePairs, ExchangeDirectory, MinimumOrderAmounts, PriceFeed};
pub use types::*;
