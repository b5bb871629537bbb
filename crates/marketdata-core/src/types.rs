use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Intermediate output of a vendor exchange-info parse: the base asset and
/// the vendor's trading-pair identifier, before exchange tagging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolPair {
    pub symbol: String,
    pub pair: String,
}

/// One listed trading pair, tagged with the vendor+market it belongs to
/// (e.g. "binance-spot") and whether it is currently tradable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPair {
    pub symbol: String,
    pub pair: String,
    pub exchange: String,
    pub is_active: bool,
}

/// Result of a full pair listing for one market type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairListing {
    pub active: Vec<TradingPair>,
    pub inactive: Vec<TradingPair>,
}

/// One candlestick. Prices and volumes are kept as the vendor's decimal
/// strings; `open_time` is milliseconds since epoch. Sequences of klines are
/// always chronological (oldest first) regardless of the vendor's native
/// ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trades: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker_buy_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker_buy_quote: Option<String>,
}

/// One historical funding rate settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRateRecord {
    pub symbol: String,
    pub funding_rate: String,
    /// Settlement time in milliseconds since epoch.
    pub funding_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_price: Option<String>,
}

/// Funding rate configuration for one contract (cap/floor/interval
/// adjustments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRateInfo {
    pub symbol: String,
    pub adjusted_funding_rate_cap: Option<String>,
    pub adjusted_funding_rate_floor: Option<String>,
    pub funding_interval_hours: Option<i64>,
}

/// Open interest at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenInterestRecord {
    pub symbol: String,
    pub open_interest: String,
    pub timestamp: i64,
}

/// One bucket of the historical open interest aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenInterestHistoryRecord {
    pub symbol: String,
    pub sum_open_interest: Option<String>,
    pub sum_open_interest_value: Option<String>,
    pub timestamp: i64,
}

/// Live per-asset market snapshot (Hyperliquid). Request-scoped; never
/// cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataSnapshot {
    pub symbol: String,
    pub mark_price: Option<String>,
    pub oracle_price: Option<String>,
    pub mid_price: Option<String>,
    pub prev_day_price: Option<String>,
    /// 24h change in percent, rounded to two decimals; zero when the
    /// previous-day price is zero or absent.
    pub price_change_24h: Decimal,
    pub volume_24h_base: Option<String>,
    pub volume_24h_usd: Option<String>,
    pub funding_rate: Option<String>,
    pub open_interest: Option<String>,
    pub premium: Option<String>,
    pub max_leverage: Option<u32>,
    pub size_decimals: Option<u32>,
    pub is_delisted: bool,
}
