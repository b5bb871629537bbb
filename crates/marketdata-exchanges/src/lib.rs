// This crate contains exchange-specific implementations of the IExchange
// trait. Each exchange has its own module.

pub mod binance;
pub mod bybit;
pub mod factory;
pub mod hyperliquid;

// Re-export the core trait
pub use marketdata_core::IExchange;

// Re-export exchange clients and the registry
pub use binance::BinanceExchange;
pub use bybit::BybitExchange;
pub use factory::{ExchangeInfo, ExchangeRegistry};
pub use hyperliquid::HyperliquidExchange;
