use async_trait::async_trait;

use crate::cache::PairCache;
use crate::error::ExchangeError;
use crate::http::HttpResource;
use crate::types::*;

/// IExchange is the core trait that all exchange implementations must
/// implement. It provides a unified interface for listing trading pairs and
/// fetching candlestick data from different exchanges.
///
/// Optional operations (funding history, open interest, live snapshots) are
/// modeled as narrow capability traits; callers probe for them through the
/// accessors below (`funding_history`, `market_data`, ...) instead of
/// attempting a call and catching the failure. An absent capability is not
/// an adapter error.
#[async_trait]
pub trait IExchange: Send + Sync + std::fmt::Debug {
    /// Lowercase exchange name, used as the prefix of exchange tags like
    /// "binance-spot".
    fn name(&self) -> &'static str;

    /// Market types this exchange serves, in declaration order. Pure; each
    /// adapter also exposes this as an inherent constant so the registry can
    /// report it without instantiating the adapter.
    fn supported_markets(&self) -> &'static [&'static str];

    /// Pair cache owned by this instance.
    fn pair_cache(&self) -> &PairCache;

    /// HTTP resource owned by this instance.
    fn http(&self) -> &HttpResource;

    /// Exchange-info endpoint for the given market type.
    fn market_url(&self, market_type: &str) -> Result<&str, ExchangeError>;

    /// Parse one exchange-info endpoint into (trading, non-trading) symbol
    /// sets. Fails with a validation error if `exchange_tag` is not one of
    /// this vendor's known tags, before any network call is made.
    async fn fetch_symbols(
        &self,
        url: &str,
        exchange_tag: &str,
    ) -> Result<(Vec<SymbolPair>, Vec<SymbolPair>), ExchangeError>;

    /// Fetch all pairs for a market type, with time-bounded caching.
    ///
    /// Validates `market_type` against [`IExchange::supported_markets`]
    /// before any network call, consults the cache when `use_cache` holds a
    /// fresh entry, and otherwise fetches live, tags every pair with its
    /// active flag and the "{name}-{market}" exchange tag, and (when caching
    /// is enabled) stores the result.
    async fn fetch_all_pairs(
        &self,
        market_type: &str,
        use_cache: bool,
    ) -> Result<PairListing, ExchangeError> {
        if !self.supported_markets().contains(&market_type) {
            return Err(ExchangeError::Validation(format!(
                "Unsupported market type '{}'. Supported markets: {}",
                market_type,
                self.supported_markets().join(", ")
            )));
        }

        if use_cache {
            if let Some(cached) = self.pair_cache().get(market_type) {
                tracing::info!("Using cached data for {}", market_type);
                return Ok(cached);
            }
        }

        let exchange_tag = format!("{}-{}", self.name(), market_type);
        let url = self.market_url(market_type)?.to_string();
        let (trading, non_trading) = self.fetch_symbols(&url, &exchange_tag).await?;

        let listing = PairListing {
            active: tag_pairs(trading, &exchange_tag, true),
            inactive: tag_pairs(non_trading, &exchange_tag, false),
        };

        if use_cache {
            self.pair_cache().insert(market_type, listing.clone());
        }

        Ok(listing)
    }

    /// Fetch candlestick data. Exchanges without kline support keep this
    /// default, which reports the capability as unsupported; callers should
    /// treat that as "feature not supported", not as a fault.
    #[allow(unused_variables)]
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        market_type: &str,
        start_time: Option<i64>,
        end_time: Option<i64>,
        limit: u32,
        timezone: Option<&str>,
    ) -> Result<Vec<Kline>, ExchangeError> {
        Err(ExchangeError::Unsupported(format!(
            "kline fetching not implemented for {}",
            self.name()
        )))
    }

    /// Historical funding rates, if this exchange provides them.
    fn funding_history(&self) -> Option<&dyn IFundingHistory> {
        None
    }

    /// Funding rate configuration info, if this exchange provides it.
    fn funding_info(&self) -> Option<&dyn IFundingInfo> {
        None
    }

    /// Point-in-time open interest, if this exchange provides it.
    fn open_interest(&self) -> Option<&dyn IOpenInterest> {
        None
    }

    /// Aggregated open interest history, if this exchange provides it.
    fn open_interest_history(&self) -> Option<&dyn IOpenInterestHistory> {
        None
    }

    /// Sampled open interest series, if this exchange provides it. See the
    /// note on [`IOpenInterestSeries`] for why this is distinct from
    /// [`IOpenInterest`].
    fn open_interest_series(&self) -> Option<&dyn IOpenInterestSeries> {
        None
    }

    /// Live market snapshots, if this exchange provides them.
    fn market_data(&self) -> Option<&dyn IMarketData> {
        None
    }

    /// Release the underlying HTTP connection early. Dropping the adapter
    /// releases it as well; this is the explicit escape hatch.
    fn close(&self) {
        self.http().close();
    }
}

fn tag_pairs(pairs: Vec<SymbolPair>, exchange_tag: &str, is_active: bool) -> Vec<TradingPair> {
    pairs
        .into_iter()
        .map(|p| TradingPair {
            symbol: p.symbol,
            pair: p.pair,
            exchange: exchange_tag.to_string(),
            is_active,
        })
        .collect()
}

/// Historical funding rate settlements.
///
/// `symbol` is optional where the vendor allows an all-symbols query
/// (Binance); vendors that require a symbol reject `None` with a validation
/// error.
#[async_trait]
pub trait IFundingHistory: Send + Sync {
    async fn fetch_funding_rate_history(
        &self,
        symbol: Option<&str>,
        start_time: Option<i64>,
        end_time: Option<i64>,
        limit: u32,
    ) -> Result<Vec<FundingRateRecord>, ExchangeError>;
}

/// Funding rate cap/floor/interval configuration.
#[async_trait]
pub trait IFundingInfo: Send + Sync {
    async fn fetch_funding_rate_info(&self) -> Result<Vec<FundingRateInfo>, ExchangeError>;
}

/// Current open interest as a single point-in-time record (Binance).
#[async_trait]
pub trait IOpenInterest: Send + Sync {
    async fn fetch_open_interest(
        &self,
        symbol: &str,
    ) -> Result<OpenInterestRecord, ExchangeError>;
}

/// Aggregated historical open interest buckets (Binance).
#[async_trait]
pub trait IOpenInterestHistory: Send + Sync {
    async fn fetch_open_interest_history(
        &self,
        symbol: &str,
        period: &str,
        limit: u32,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<Vec<OpenInterestHistoryRecord>, ExchangeError>;
}

/// Open interest sampled at a required granularity, returned as a list even
/// for "current" queries (Bybit).
///
/// This shape deliberately differs from [`IOpenInterest`]: the two vendors
/// expose incompatible result shapes for the conceptually-same operation,
/// and the contract keeps them distinct so callers must branch on which
/// capability an exchange actually offers.
#[async_trait]
pub trait IOpenInterestSeries: Send + Sync {
    async fn fetch_open_interest(
        &self,
        symbol: &str,
        interval: &str,
        start_time: Option<i64>,
        end_time: Option<i64>,
        limit: u32,
    ) -> Result<Vec<OpenInterestRecord>, ExchangeError>;
}

/// Live per-asset market snapshots (Hyperliquid).
#[async_trait]
pub trait IMarketData: Send + Sync {
    async fn fetch_market_data(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<MarketDataSnapshot>, ExchangeError>;
}
