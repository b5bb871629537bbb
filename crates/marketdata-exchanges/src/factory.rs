//! Registry mapping exchange names to adapter constructors.
//!
//! The registry is a plain value owned by the composition root: build it
//! once at startup (usually via [`ExchangeRegistry::with_default_exchanges`])
//! and pass it by reference to whatever needs to create adapters.

use std::collections::BTreeMap;

use marketdata_core::{ExchangeError, IExchange};
use serde::Serialize;

use crate::binance::BinanceExchange;
use crate::bybit::BybitExchange;
use crate::hyperliquid::HyperliquidExchange;

/// Metadata about a registered exchange, available without instantiation.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeInfo {
    pub name: String,
    pub supported_markets: Vec<String>,
    pub description: String,
}

type Constructor = Box<dyn Fn() -> Box<dyn IExchange> + Send + Sync>;

struct Registration {
    supported_markets: &'static [&'static str],
    description: &'static str,
    ctor: Constructor,
}

pub struct ExchangeRegistry {
    registry: BTreeMap<String, Registration>,
}

impl ExchangeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            registry: BTreeMap::new(),
        }
    }

    /// A registry with every built-in exchange registered.
    pub fn with_default_exchanges() -> Self {
        let mut registry = Self::new();
        registry.register(
            "binance",
            BinanceExchange::SUPPORTED_MARKETS,
            "Binance spot and USDT-margined perpetual futures markets",
            || Box::new(BinanceExchange::new()),
        );
        registry.register(
            "bybit",
            BybitExchange::SUPPORTED_MARKETS,
            "Bybit spot and linear perpetual futures markets",
            || Box::new(BybitExchange::new()),
        );
        registry.register(
            "hyperliquid",
            HyperliquidExchange::SUPPORTED_MARKETS,
            "Hyperliquid spot and perpetual markets with live market snapshots",
            || Box::new(HyperliquidExchange::new()),
        );
        registry
    }

    /// Register an adapter constructor under `name`. Names are stored
    /// lowercased; registering the same name again replaces the previous
    /// entry.
    pub fn register<F>(
        &mut self,
        name: &str,
        supported_markets: &'static [&'static str],
        description: &'static str,
        ctor: F,
    ) where
        F: Fn() -> Box<dyn IExchange> + Send + Sync + 'static,
    {
        self.registry.insert(
            name.to_lowercase(),
            Registration {
                supported_markets,
                description,
                ctor: Box::new(ctor),
            },
        );
    }

    /// Create an adapter instance by name (case-insensitive).
    pub fn create(&self, name: &str) -> Result<Box<dyn IExchange>, ExchangeError> {
        match self.registry.get(&name.to_lowercase()) {
            Some(registration) => Ok((registration.ctor)()),
            None => Err(ExchangeError::Validation(format!(
                "Exchange '{}' not found. Available exchanges: {}",
                name,
                self.list_exchanges().join(", ")
            ))),
        }
    }

    /// Names of all registered exchanges.
    pub fn list_exchanges(&self) -> Vec<String> {
        self.registry.keys().cloned().collect()
    }

    /// Metadata for one registered exchange; no adapter is instantiated.
    pub fn get_exchange_info(&self, name: &str) -> Result<ExchangeInfo, ExchangeError> {
        let key = name.to_lowercase();
        match self.registry.get(&key) {
            Some(registration) => Ok(ExchangeInfo {
                name: key,
                supported_markets: registration
                    .supported_markets
                    .iter()
                    .map(|m| m.to_string())
                    .collect(),
                description: registration.description.to_string(),
            }),
            None => Err(ExchangeError::Validation(format!(
                "Exchange '{}' not found. Available exchanges: {}",
                name,
                self.list_exchanges().join(", ")
            ))),
        }
    }
}

impl Default for ExchangeRegistry {
    fn default() -> Self {
        Self::with_default_exchanges()
    }
}
