use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use marketdata_core::{
    ExchangeError, HttpResource, IExchange, IMarketData, PairCache, RetryConfig,
};
use marketdata_core::types::*;
use rust_decimal::Decimal;
use serde_json::json;

use super::types::*;

const INFO_URL: &str = "https://api.hyperliquid.xyz/info";

/// Wrapped or bridged token names collapse to their canonical symbol before
/// they appear in any pair name or symbol field.
const TOKEN_ALIASES: &[(&str, &str)] = &[("USDT0", "USDT")];

/// Hyperliquid adapter. The exchange exposes a single info endpoint that is
/// queried with a typed POST body; spot and perpetual listings come from
/// different query types against the same URL.
///
/// Historical klines are not available on this venue; the live snapshot
/// capability ([`IMarketData`]) is the replacement.
#[derive(Debug)]
pub struct HyperliquidExchange {
    http: HttpResource,
    cache: PairCache,
    info_url: String,
}

impl HyperliquidExchange {
    pub const SUPPORTED_MARKETS: &'static [&'static str] = &["spot", "futures"];

    pub fn new() -> Self {
        Self::with_info_url(INFO_URL.to_string())
    }

    /// Point the adapter at a custom info endpoint (testing, proxies).
    pub fn with_info_url(info_url: String) -> Self {
        Self {
            http: HttpResource::new(),
            cache: PairCache::default(),
            info_url,
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
}

impl Default for HyperliquidExchange {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_token(name: &str) -> String {
    for (alias, canonical) in TOKEN_ALIASES {
        if name == *alias {
            return (*canonical).to_string();
        }
    }
    name.to_string()
}

/// Resolve the two-level token index -> token table into named spot pairs.
/// Pairs whose token indices do not resolve are dropped; the endpoint does
/// not report inactive pairs.
fn spot_pairs(meta: SpotMeta) -> (Vec<SymbolPair>, Vec<SymbolPair>) {
    let tokens_map: HashMap<u64, String> = meta
        .tokens
        .into_iter()
        .map(|t| (t.index, normalize_token(&t.name)))
        .collect();

    let mut trading = Vec::new();
    for pair in meta.universe {
        if pair.tokens.len() < 2 {
            continue;
        }
        let (base_idx, quote_idx) = (pair.tokens[0], pair.tokens[1]);
        if let (Some(base), Some(quote)) = (tokens_map.get(&base_idx), tokens_map.get(&quote_idx))
        {
            trading.push(SymbolPair {
                symbol: base.clone(),
                pair: format!("{}/{}", base, quote),
            });
        }
    }

    (trading, Vec::new())
}

/// Partition the flat perpetual universe into live and delisted assets,
/// synthesizing "SYMBOL-USD" pair names.
fn futures_pairs(meta: Meta) -> (Vec<SymbolPair>, Vec<SymbolPair>) {
    let mut trading = Vec::new();
    let mut non_trading = Vec::new();

    for asset in meta.universe {
        let entry = SymbolPair {
            pair: format!("{}-USD", asset.name),
            symbol: asset.name,
        };
        if asset.is_delisted {
            non_trading.push(entry);
        } else {
            trading.push(entry);
        }
    }

    (trading, non_trading)
}

/// 24h percentage change from mark price vs. previous-day price, rounded to
/// two decimals. Yields zero when the previous-day price is zero, absent or
/// unparseable.
fn price_change_24h(mark_px: Option<&str>, prev_day_px: Option<&str>) -> Decimal {
    let mark = mark_px.and_then(|s| Decimal::from_str(s).ok());
    let prev = prev_day_px.and_then(|s| Decimal::from_str(s).ok());
    match (mark, prev) {
        (Some(mark), Some(prev)) if prev > Decimal::ZERO => {
            ((mark - prev) / prev * Decimal::from(100)).round_dp(2)
        }
        _ => Decimal::ZERO,
    }
}

/// Zip the static universe with the parallel live contexts by position.
fn snapshots(meta: Meta, asset_ctxs: Vec<AssetCtx>, symbol: Option<&str>) -> Vec<MarketDataSnapshot> {
    let mut markets = Vec::new();

    for (i, asset) in meta.universe.into_iter().enumerate() {
        if let Some(filter) = symbol {
            if asset.name != filter {
                continue;
            }
        }
        let Some(ctx) = asset_ctxs.get(i) else {
            continue;
        };

        markets.push(MarketDataSnapshot {
            price_change_24h: price_change_24h(ctx.mark_px.as_deref(), ctx.prev_day_px.as_deref()),
            symbol: asset.name,
            mark_price: ctx.mark_px.clone(),
            oracle_price: ctx.oracle_px.clone(),
            mid_price: ctx.mid_px.clone(),
            prev_day_price: ctx.prev_day_px.clone(),
            volume_24h_base: ctx.day_base_vlm.clone(),
            volume_24h_usd: ctx.day_ntl_vlm.clone(),
            funding_rate: ctx.funding.clone(),
            open_interest: ctx.open_interest.clone(),
            premium: ctx.premium.clone(),
            max_leverage: asset.max_leverage,
            size_decimals: asset.sz_decimals,
            is_delisted: asset.is_delisted,
        });
    }

    markets
}

#[async_trait]
impl IExchange for HyperliquidExchange {
    fn name(&self) -> &'static str {
        "hyperliquid"
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
            "spot" | "futures" => Ok(&self.info_url),
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
        match exchange_tag {
            "hyperliquid-spot" => {
                let meta: SpotMeta = self.http.post_json(url, &json!({"type": "spotMeta"})).await?;
                Ok(spot_pairs(meta))
            }
            "hyperliquid-futures" => {
                let meta: Meta = self.http.post_json(url, &json!({"type": "meta"})).await?;
                Ok(futures_pairs(meta))
            }
            other => Err(ExchangeError::Validation(format!(
                "Invalid Hyperliquid exchange type: {}",
                other
            ))),
        }
    }

    async fn fetch_klines(
        &self,
        _symbol: &str,
        _interval: &str,
        _market_type: &str,
        _start_time: Option<i64>,
        _end_time: Option<i64>,
        _limit: u32,
        _timezone: Option<&str>,
    ) -> Result<Vec<Kline>, ExchangeError> {
        Err(ExchangeError::Unsupported(
            "Hyperliquid does not provide historical kline/candlestick data. Use \
             fetch_market_data() instead to get live market data including current price, \
             24h volume, funding rate, and open interest."
                .to_string(),
        ))
    }

    fn market_data(&self) -> Option<&dyn IMarketData> {
        Some(self)
    }
}

#[async_trait]
impl IMarketData for HyperliquidExchange {
    async fn fetch_market_data(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<MarketDataSnapshot>, ExchangeError> {
        let (meta, asset_ctxs): (Meta, Vec<AssetCtx>) = self
            .http
            .post_json(&self.info_url, &json!({"type": "metaAndAssetCtxs"}))
            .await?;
        Ok(snapshots(meta, asset_ctxs, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_change_24h_rounds_to_two_decimals() {
        let change = price_change_24h(Some("101540.0"), Some("102983.0"));
        assert_eq!(change, Decimal::from_str("-1.40").unwrap());
    }

    #[test]
    fn test_price_change_24h_guards_division_by_zero() {
        assert_eq!(price_change_24h(Some("101540.0"), Some("0")), Decimal::ZERO);
        assert_eq!(price_change_24h(Some("101540.0"), None), Decimal::ZERO);
        assert_eq!(price_change_24h(None, Some("102983.0")), Decimal::ZERO);
        assert_eq!(
            price_change_24h(Some("bogus"), Some("102983.0")),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_token_alias_normalization() {
        assert_eq!(normalize_token("USDT0"), "USDT");
        assert_eq!(normalize_token("USDC"), "USDC");
        assert_eq!(normalize_token("PURR"), "PURR");
    }

    #[test]
    fn test_spot_pairs_resolve_token_indices() {
        let meta: SpotMeta = serde_json::from_value(json!({
            "tokens": [
                {"name": "PURR", "index": 0},
                {"name": "USDC", "index": 1},
                {"name": "USDT0", "index": 2},
            ],
            "universe": [
                {"tokens": [0, 1], "name": "PURR/USDC"},
                {"tokens": [2, 1], "name": "@1"},
                {"tokens": [9, 1], "name": "@2"},
                {"tokens": [0], "name": "@3"},
            ]
        }))
        .unwrap();

        let (trading, non_trading) = spot_pairs(meta);

        // Unresolvable indices and short token lists are dropped.
        assert_eq!(trading.len(), 2);
        assert_eq!(trading[0].symbol, "PURR");
        assert_eq!(trading[0].pair, "PURR/USDC");
        // The wrapped stablecoin collapses to its canonical symbol.
        assert_eq!(trading[1].symbol, "USDT");
        assert_eq!(trading[1].pair, "USDT/USDC");
        assert!(non_trading.is_empty());
    }

    #[test]
    fn test_futures_pairs_partition_on_delisting() {
        let meta: Meta = serde_json::from_value(json!({
            "universe": [
                {"name": "BTC", "szDecimals": 5, "maxLeverage": 40},
                {"name": "ETH", "szDecimals": 4, "maxLeverage": 25},
                {"name": "LUNA", "szDecimals": 1, "maxLeverage": 3, "isDelisted": true},
            ]
        }))
        .unwrap();

        let (trading, non_trading) = futures_pairs(meta);

        assert_eq!(trading.len(), 2);
        assert_eq!(trading[0].pair, "BTC-USD");
        assert_eq!(non_trading.len(), 1);
        assert_eq!(non_trading[0].pair, "LUNA-USD");
    }

    #[test]
    fn test_snapshots_zip_by_position() {
        let meta: Meta = serde_json::from_value(json!({
            "universe": [
                {"name": "BTC", "szDecimals": 5, "maxLeverage": 40},
                {"name": "ETH", "szDecimals": 4, "maxLeverage": 25},
            ]
        }))
        .unwrap();
        let ctxs: Vec<AssetCtx> = serde_json::from_value(json!([
            {"markPx": "101540.0", "prevDayPx": "102983.0", "oraclePx": "101530.0",
             "dayNtlVlm": "2500000000.0", "dayBaseVlm": "24000.0", "funding": "0.0000125",
             "openInterest": "12345.6", "premium": "0.0001"},
            {"markPx": "3100.0", "prevDayPx": "0", "funding": "0.0000100"},
        ]))
        .unwrap();

        let all = snapshots(meta, ctxs, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].symbol, "BTC");
        assert_eq!(all[0].price_change_24h, Decimal::from_str("-1.40").unwrap());
        assert_eq!(all[0].max_leverage, Some(40));
        assert_eq!(all[1].price_change_24h, Decimal::ZERO);
    }

    #[test]
    fn test_snapshots_single_asset_filter() {
        let meta: Meta = serde_json::from_value(json!({
            "universe": [{"name": "BTC"}, {"name": "ETH"}]
        }))
        .unwrap();
        let ctxs: Vec<AssetCtx> = serde_json::from_value(json!([
            {"markPx": "101540.0"},
            {"markPx": "3100.0"},
        ]))
        .unwrap();

        let only_eth = snapshots(meta, ctxs, Some("ETH"));
        assert_eq!(only_eth.len(), 1);
        assert_eq!(only_eth[0].symbol, "ETH");
    }

    #[test]
    fn test_snapshots_skip_assets_without_context() {
        let meta: Meta = serde_json::from_value(json!({
            "universe": [{"name": "BTC"}, {"name": "ETH"}]
        }))
        .unwrap();
        let ctxs: Vec<AssetCtx> = serde_json::from_value(json!([{"markPx": "101540.0"}])).unwrap();

        let all = snapshots(meta, ctxs, None);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].symbol, "BTC");
    }

    #[tokio::test]
    async fn test_klines_are_not_supported() {
        let exchange = HyperliquidExchange::new();
        let err = exchange
            .fetch_klines("BTC", "1h", "futures", None, None, 100, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Unsupported(_)));
        assert!(err.to_string().contains("fetch_market_data"));
    }

    #[tokio::test]
    async fn test_unsupported_market_type_needs_no_network() {
        let exchange = HyperliquidExchange::with_info_url("http://127.0.0.1:9".to_string())
            .with_retry_config(RetryConfig::new(
                1,
                std::time::Duration::from_millis(1),
                std::time::Duration::from_millis(1),
            ));
        let err = exchange.fetch_all_pairs("margin", true).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Validation(_)));
    }
}
