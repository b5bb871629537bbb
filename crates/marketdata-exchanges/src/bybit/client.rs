use async_trait::async_trait;
use marketdata_core::{
    ExchangeError, HttpResource, IExchange, IFundingHistory, IOpenInterestSeries, PairCache,
    RetryConfig,
};
use marketdata_core::types::*;
use tracing::warn;

use super::types::*;

const BASE_URL: &str = "https://api.bybit.com";
const DEFAULT_QUOTE_ASSET: &str = "USDT";

const VALID_INTERVALS: &[&str] = &[
    "1", "3", "5", "15", "30", "60", "120", "240", "360", "720", "D", "W", "M",
];

const VALID_OI_INTERVALS: &[&str] = &["5min", "15min", "30min", "1h", "4h", "1d"];

/// Bybit adapter covering spot and linear (USDT-margined) perpetual futures.
///
/// The v5 listing endpoint only reports instruments in Trading status, so
/// the inactive side of a pair listing is always empty for this vendor.
#[derive(Debug)]
pub struct BybitExchange {
    http: HttpResource,
    cache: PairCache,
    base_url: String,
    spot_info_url: String,
    futures_info_url: String,
    quote_asset: &'static str,
}

impl BybitExchange {
    pub const SUPPORTED_MARKETS: &'static [&'static str] = &["spot", "futures"];

    pub fn new() -> Self {
        Self::with_base_url(BASE_URL.to_string())
    }

    /// Point the adapter at a custom host (testing, proxies).
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http: HttpResource::new(),
            cache: PairCache::default(),
            spot_info_url: format!(
                "{}/v5/market/instruments-info?category=spot&status=Trading&limit=1000",
                base_url
            ),
            futures_info_url: format!(
                "{}/v5/market/instruments-info?category=linear&status=Trading&limit=1000",
                base_url
            ),
            base_url,
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

    fn category_for(market_type: &str) -> Result<&'static str, ExchangeError> {
        match market_type {
            "spot" => Ok("spot"),
            "futures" => Ok("linear"),
            other => Err(ExchangeError::Validation(format!(
                "Invalid market type '{}'. Supported: 'spot', 'futures'",
                other
            ))),
        }
    }
}

impl Default for BybitExchange {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwrap the vendor envelope: a non-zero retCode is a vendor-reported
/// failure, distinct from a transport error.
fn unwrap_envelope<T>(response: BybitResponse<T>) -> Result<T, ExchangeError> {
    if response.ret_code != 0 {
        return Err(ExchangeError::Vendor(format!(
            "Bybit API error: {}",
            if response.ret_msg.is_empty() {
                "Unknown error".to_string()
            } else {
                response.ret_msg
            }
        )));
    }
    response.result.ok_or_else(|| {
        ExchangeError::UnexpectedResponse("Bybit response is missing the result field".to_string())
    })
}

/// Map positional kline rows into the uniform shape and restore
/// chronological order (the vendor returns newest first).
fn convert_klines(rows: &[Vec<String>]) -> Vec<Kline> {
    let mut klines = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() < 7 {
            warn!("Skipping kline row with {} columns", row.len());
            continue;
        }
        let open_time = match row[0].parse::<i64>() {
            Ok(t) => t,
            Err(_) => {
                warn!("Skipping kline row with invalid start time '{}'", row[0]);
                continue;
            }
        };
        klines.push(Kline {
            open_time,
            open: row[1].clone(),
            high: row[2].clone(),
            low: row[3].clone(),
            close: row[4].clone(),
            volume: row[5].clone(),
            close_time: None,
            quote_volume: Some(row[6].clone()),
            trades: None,
            taker_buy_base: None,
            taker_buy_quote: None,
        });
    }
    klines.reverse();
    klines
}

#[async_trait]
impl IExchange for BybitExchange {
    fn name(&self) -> &'static str {
        "bybit"
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
        let futures = match exchange_tag {
            "bybit-spot" => false,
            "bybit-futures" => true,
            other => {
                return Err(ExchangeError::Validation(format!(
                    "Invalid Bybit exchange type: {}",
                    other
                )))
            }
        };

        let response: BybitResponse<InstrumentsResult> = self.http.get_json(url).await?;
        let result = unwrap_envelope(response)?;

        let trading = result
            .list
            .into_iter()
            .filter(|item| {
                item.quote_coin == self.quote_asset
                    && item.status == "Trading"
                    && (!futures || item.contract_type.as_deref() == Some("LinearPerpetual"))
            })
            .map(|item| SymbolPair {
                symbol: item.base_coin,
                pair: item.symbol,
            })
            .collect();

        // The listing endpoint cannot report closed instruments.
        Ok((trading, Vec::new()))
    }

    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        market_type: &str,
        start_time: Option<i64>,
        end_time: Option<i64>,
        limit: u32,
        _timezone: Option<&str>,
    ) -> Result<Vec<Kline>, ExchangeError> {
        if !VALID_INTERVALS.contains(&interval) {
            return Err(ExchangeError::Validation(format!(
                "Invalid interval '{}'. Supported intervals: {}",
                interval,
                VALID_INTERVALS.join(", ")
            )));
        }
        if !(1..=1000).contains(&limit) {
            return Err(ExchangeError::Validation(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }
        let category = Self::category_for(market_type)?;

        let mut url = format!(
            "{}/v5/market/kline?symbol={}&interval={}&category={}&limit={}",
            self.base_url, symbol, interval, category, limit
        );
        if let Some(start) = start_time {
            url.push_str(&format!("&start={}", start));
        }
        if let Some(end) = end_time {
            url.push_str(&format!("&end={}", end));
        }

        let response: BybitResponse<KlineResult> = self.http.get_json(&url).await?;
        let result = unwrap_envelope(response)?;
        Ok(convert_klines(&result.list))
    }

    fn funding_history(&self) -> Option<&dyn IFundingHistory> {
        Some(self)
    }

    fn open_interest_series(&self) -> Option<&dyn IOpenInterestSeries> {
        Some(self)
    }
}

#[async_trait]
impl IFundingHistory for BybitExchange {
    async fn fetch_funding_rate_history(
        &self,
        symbol: Option<&str>,
        start_time: Option<i64>,
        end_time: Option<i64>,
        limit: u32,
    ) -> Result<Vec<FundingRateRecord>, ExchangeError> {
        let symbol = symbol.ok_or_else(|| {
            ExchangeError::Validation(
                "A symbol is required for Bybit funding rate history".to_string(),
            )
        })?;
        if !(1..=200).contains(&limit) {
            return Err(ExchangeError::Validation(
                "Limit must be between 1 and 200".to_string(),
            ));
        }
        // Vendor rule: a start time is only accepted together with an end time.
        if start_time.is_some() && end_time.is_none() {
            return Err(ExchangeError::Validation(
                "If start_time is provided, end_time must also be provided".to_string(),
            ));
        }

        let mut url = format!(
            "{}/v5/market/funding/history?category=linear&symbol={}&limit={}",
            self.base_url, symbol, limit
        );
        if let Some(start) = start_time {
            url.push_str(&format!("&startTime={}", start));
        }
        if let Some(end) = end_time {
            url.push_str(&format!("&endTime={}", end));
        }

        let response: BybitResponse<FundingResult> = self.http.get_json(&url).await?;
        let result = unwrap_envelope(response)?;

        let mut records = Vec::with_capacity(result.list.len());
        for entry in result.list {
            match entry.funding_rate_timestamp.parse::<i64>() {
                Ok(funding_time) => records.push(FundingRateRecord {
                    symbol: entry.symbol,
                    funding_rate: entry.funding_rate,
                    funding_time,
                    mark_price: None,
                }),
                Err(_) => warn!(
                    "Skipping funding record with invalid timestamp '{}'",
                    entry.funding_rate_timestamp
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl IOpenInterestSeries for BybitExchange {
    async fn fetch_open_interest(
        &self,
        symbol: &str,
        interval: &str,
        start_time: Option<i64>,
        end_time: Option<i64>,
        limit: u32,
    ) -> Result<Vec<OpenInterestRecord>, ExchangeError> {
        if !VALID_OI_INTERVALS.contains(&interval) {
            return Err(ExchangeError::Validation(format!(
                "Invalid interval '{}'. Supported intervals: {}",
                interval,
                VALID_OI_INTERVALS.join(", ")
            )));
        }
        if !(1..=200).contains(&limit) {
            return Err(ExchangeError::Validation(
                "Limit must be between 1 and 200".to_string(),
            ));
        }

        let mut url = format!(
            "{}/v5/market/open-interest?category=linear&symbol={}&intervalTime={}&limit={}",
            self.base_url, symbol, interval, limit
        );
        if let Some(start) = start_time {
            url.push_str(&format!("&startTime={}", start));
        }
        if let Some(end) = end_time {
            url.push_str(&format!("&endTime={}", end));
        }

        let response: BybitResponse<OpenInterestResult> = self.http.get_json(&url).await?;
        let result = unwrap_envelope(response)?;

        let symbol_from_response = result.symbol;
        let mut records = Vec::with_capacity(result.list.len());
        for entry in result.list {
            match entry.timestamp.parse::<i64>() {
                Ok(timestamp) => records.push(OpenInterestRecord {
                    symbol: symbol_from_response.clone(),
                    open_interest: entry.open_interest,
                    timestamp,
                }),
                Err(_) => warn!(
                    "Skipping open interest record with invalid timestamp '{}'",
                    entry.timestamp
                ),
            }
        }
        Ok(records)
    }
}
