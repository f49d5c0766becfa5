pub mod binance;
pub mod manager;
pub mod source;

pub use binance::BinanceTickerSource;
pub use manager::ExchangePriceManager;
pub use source::PriceSource;
