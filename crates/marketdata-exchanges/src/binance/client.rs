use async_trait::async_trait;
use marketdata_core::{
    ExchangeError, HttpResource, IExchange, IFundingHistory, IFundingInfo, IOpenInterest,
    IOpenInterestHistory, PairCache, RetryConfig,
};
use marketdata_core::types::*;
use tracing::warn;

use super::types::*;

const SPOT_BASE_URL: &str = "https://api.binance.com";
const FUTURES_BASE_URL: &str = "https://fapi.binance.com";
const DEFAULT_QUOTE_ASSET: &str = "USDT";

const VALID_INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1M",
];

const VALID_OI_PERIODS: &[&str] = &["5m", "15m", "30m", "1h", "2h", "4h", "6h", "12h", "1d"];

/// Binance adapter covering spot and USDT-margined perpetual futures.
#[derive(Debug)]
pub struct BinanceExchange {
    http: HttpResource,
    cache: PairCache,
    spot_base_url: String,
    futures_base_url: String,
    spot_info_url: String,
    futures_info_url: String,
    quote_asset: &'static str,
}

impl BinanceExchange {
    pub const SUPPORTED_MARKETS: &'static [&'static str] = &["spot", "futures"];

    pub fn new() -> Self {
        Self::with_base_urls(SPOT_BASE_URL.to_string(), FUTURES_BASE_URL.to_string())
    }

    /// Point the adapter at custom hosts (testing, proxies).
    pub fn with_base_urls(spot_base_url: String, futures_base_url: String) -> Self {
        Self {
            http: HttpResource::new(),
            cache: PairCache::default(),
            spot_info_url: format!("{}/api/v3/exchangeInfo?permissions=SPOT", spot_base_url),
            futures_info_url: format!("{}/fapi/v1/exchangeInfo", futures_base_url),
            spot_base_url,
            futures_base_url,
            quote_asset: DEFAULT_QUOTE_ASSET,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.cache = PairCache::new(ttl);
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.http = HttpResource::with_retry(retry);
        self
    }

    fn partition_symbols(
        &self,
        info: ExchangeInfo,
        exchange_tag: &str,
    ) -> Result<(Vec<SymbolPair>, Vec<SymbolPair>), ExchangeError> {
        let futures = match exchange_tag {
            "binance-spot" => false,
            "binance-futures" => true,
            other => {
                return Err(ExchangeError::Validation(format!(
                    "Invalid Binance exchange type: {}",
                    other
                )))
            }
        };

        let mut trading = Vec::new();
        let mut non_trading = Vec::new();

        for item in info.symbols {
            if item.quote_asset != self.quote_asset {
                continue;
            }
            if futures && item.contract_type.as_deref() != Some("PERPETUAL") {
                continue;
            }
            let pair = if futures {
                item.pair.unwrap_or(item.symbol)
            } else {
                item.symbol
            };
            let entry = SymbolPair {
                symbol: item.base_asset,
                pair,
            };
            if item.status.as_deref() == Some("TRADING") {
                trading.push(entry);
            } else {
                non_trading.push(entry);
            }
        }

        Ok((trading, non_trading))
    }
}

impl Default for BinanceExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IExchange for BinanceExchange {
    fn name(&self) -> &'static str {
        "binance"
    }

    fn supported_markets(&self) -> &'static [&'static str] {
        Self::SUPPORTED_MARKETS
    }

    fn pair_cache(&self) -> &PairCache {
        &self.cache
    }

    fn http(&self) -> &HttpResource {
        &self.http
    }

    fn market_url(&self, market_type: &str) -> Result<&str, ExchangeError> {
        match market_type {
            "spot" => Ok(&self.spot_info_url),
            "futures" => Ok(&self.futures_info_url),
            other => Err(ExchangeError::Validation(format!(
                "Invalid market type '{}'. Supported: 'spot', 'futures'",
                other
            ))),
        }
    }

    async fn fetch_symbols(
        &self,
        url: &str,
        exchange_tag: &str,
    ) -> Result<(Vec<SymbolPair>, Vec<SymbolPair>), ExchangeError> {
        // Reject unknown tags before spending a network round trip.
        if exchange_tag != "binance-spot" && exchange_tag != "binance-futures" {
            return Err(ExchangeError::Validation(format!(
                "Invalid Binance exchange type: {}",
                exchange_tag
            )));
        }
        let info: ExchangeInfo = self.http.get_json(url).await?;
        self.partition_symbols(info, exchange_tag)
    }

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
        if !VALID_INTERVALS.contains(&interval) {
            return Err(ExchangeError::Validation(format!(
                "Invalid interval '{}'. Supported intervals: {}",
                interval,
                VALID_INTERVALS.join(", ")
            )));
        }

        let base = match market_type {
            "spot" => format!("{}/api/v3/klines", self.spot_base_url),
            "futures" => format!("{}/fapi/v1/klines", self.futures_base_url),
            other => {
                return Err(ExchangeError::Validation(format!(
                    "Invalid market type '{}'. Supported: 'spot', 'futures'",
                    other
                )))
            }
        };

        let max_limit = if market_type == "spot" { 1000 } else { 1500 };
        if limit > max_limit {
            return Err(ExchangeError::Validation(format!(
                "Limit cannot exceed {} for {} market",
                max_limit, market_type
            )));
        }

        let mut url = format!(
            "{}?symbol={}&interval={}&limit={}",
            base, symbol, interval, limit
        );
        if market_type == "spot" {
            let tz = timezone.unwrap_or("0");
            if !tz.is_empty() {
                url.push_str(&format!("&timeZone={}", tz));
            }
        }
        if let Some(start) = start_time {
            url.push_str(&format!("&startTime={}", start));
        }
        if let Some(end) = end_time {
            url.push_str(&format!("&endTime={}", end));
        }

        let rows: Vec<Vec<serde_json::Value>> = self.http.get_json(&url).await?;

        // Binance returns oldest-first already.
        let mut klines = Vec::with_capacity(rows.len());
        for row in &rows {
            match convert_kline_row(row) {
                Ok(kline) => klines.push(kline),
                Err(e) => warn!("Failed to convert kline: {}", e),
            }
        }
        Ok(klines)
    }

    fn funding_history(&self) -> Option<&dyn IFundingHistory> {
        Some(self)
    }

    fn funding_info(&self) -> Option<&dyn IFundingInfo> {
        Some(self)
    }

    fn open_interest(&self) -> Option<&dyn IOpenInterest> {
        Some(self)
    }

    fn open_interest_history(&self) -> Option<&dyn IOpenInterestHistory> {
        Some(self)
    }
}

#[async_trait]
impl IFundingHistory for BinanceExchange {
    async fn fetch_funding_rate_history(
        &self,
        symbol: Option<&str>,
        start_time: Option<i64>,
        end_time: Option<i64>,
        limit: u32,
    ) -> Result<Vec<FundingRateRecord>, ExchangeError> {
        if !(1..=1000).contains(&limit) {
            return Err(ExchangeError::Validation(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let mut url = format!("{}/fapi/v1/fundingRate?limit={}", self.futures_base_url, limit);
        if let Some(symbol) = symbol {
            url.push_str(&format!("&symbol={}", symbol));
        }
        if let Some(start) = start_time {
            url.push_str(&format!("&startTime={}", start));
        }
        if let Some(end) = end_time {
            url.push_str(&format!("&endTime={}", end));
        }

        let rows: Vec<FundingRateEntry> = self.http.get_json(&url).await?;
        Ok(rows
            .into_iter()
            .map(|r| FundingRateRecord {
                symbol: r.symbol,
                funding_rate: r.funding_rate,
                funding_time: r.funding_time,
                mark_price: r.mark_price,
            })
            .collect())
    }
}

#[async_trait]
impl IFundingInfo for BinanceExchange {
    async fn fetch_funding_rate_info(&self) -> Result<Vec<FundingRateInfo>, ExchangeError> {
        let url = format!("{}/fapi/v1/fundingInfo", self.futures_base_url);
        let rows: Vec<FundingInfoEntry> = self.http.get_json(&url).await?;
        Ok(rows
            .into_iter()
            .map(|r| FundingRateInfo {
                symbol: r.symbol,
                adjusted_funding_rate_cap: r.adjusted_funding_rate_cap,
                adjusted_funding_rate_floor: r.adjusted_funding_rate_floor,
                funding_interval_hours: r.funding_interval_hours,
            })
            .collect())
    }
}

#[async_trait]
impl IOpenInterest for BinanceExchange {
    async fn fetch_open_interest(
        &self,
        symbol: &str,
    ) -> Result<OpenInterestRecord, ExchangeError> {
        let url = format!(
            "{}/fapi/v1/openInterest?symbol={}",
            self.futures_base_url, symbol
        );
        let data: OpenInterestResponse = self.http.get_json(&url).await?;
        Ok(OpenInterestRecord {
            symbol: data.symbol,
            open_interest: data.open_interest,
            timestamp: data.time,
        })
    }
}

#[async_trait]
impl IOpenInterestHistory for BinanceExchange {
    async fn fetch_open_interest_history(
        &self,
        symbol: &str,
        period: &str,
        limit: u32,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<Vec<OpenInterestHistoryRecord>, ExchangeError> {
        if !VALID_OI_PERIODS.contains(&period) {
            return Err(ExchangeError::Validation(format!(
                "Invalid period '{}'. Supported periods: {}",
                period,
                VALID_OI_PERIODS.join(", ")
            )));
        }
        if !(1..=500).contains(&limit) {
            return Err(ExchangeError::Validation(
                "Limit must be between 1 and 500".to_string(),
            ));
        }

        let mut url = format!(
            "{}/futures/data/openInterestHist?symbol={}&period={}&limit={}",
            self.futures_base_url, symbol, period, limit
        );
        if let Some(start) = start_time {
            url.push_str(&format!("&startTime={}", start));
        }
        if let Some(end) = end_time {
            url.push_str(&format!("&endTime={}", end));
        }

        let rows: Vec<OpenInterestHistEntry> = self.http.get_json(&url).await?;
        Ok(rows
            .into_iter()
            .map(|r| OpenInterestHistoryRecord {
                symbol: r.symbol,
                sum_open_interest: r.sum_open_interest,
                sum_open_interest_value: r.sum_open_interest_value,
                timestamp: r.timestamp,
            })
            .collect())
    }
}

/// Map one positional kline row into the uniform shape. Binance rows are
/// fixed-position arrays of 12 columns; the last column is ignored.
fn convert_kline_row(row: &[serde_json::Value]) -> Result<Kline, ExchangeError> {
    if row.len() < 11 {
        return Err(ExchangeError::UnexpectedResponse(format!(
            "kline row has {} columns, expected at least 11",
            row.len()
        )));
    }

    let open_time = row[0]
        .as_i64()
        .ok_or_else(|| ExchangeError::UnexpectedResponse("invalid kline open time".to_string()))?;

    Ok(Kline {
        open_time,
        open: cell_string(&row[1]),
        high: cell_string(&row[2]),
        low: cell_string(&row[3]),
        close: cell_string(&row[4]),
        volume: cell_string(&row[5]),
        close_time: row[6].as_i64(),
        quote_volume: Some(cell_string(&row[7])),
        trades: row[8].as_i64(),
        taker_buy_base: Some(cell_string(&row[9])),
        taker_buy_quote: Some(cell_string(&row[10])),
    })
}

fn cell_string(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
