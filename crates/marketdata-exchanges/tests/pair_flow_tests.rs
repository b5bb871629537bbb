//! End-to-end adapter flows against a local fixture server.
//!
//! The server answers every request with one canned JSON body and counts
//! accepted connections, which lets these tests assert how many network
//! calls an operation actually made.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use marketdata_core::{ExchangeError, IExchange};
use marketdata_exchanges::{BinanceExchange, BybitExchange, HyperliquidExchange};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn spawn_fixture_server(body: String) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), hits)
}

fn binance_spot_info_body() -> String {
    serde_json::json!({
        "symbols": [
            {"symbol": "BTCUSDT", "baseAsset": "BTC", "quoteAsset": "USDT", "status": "TRADING"},
            {"symbol": "ETHUSDT", "baseAsset": "ETH", "quoteAsset": "USDT", "status": "TRADING"},
            {"symbol": "HIFIUSDT", "baseAsset": "HIFI", "quoteAsset": "USDT", "status": "BREAK"},
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_binance_spot_pairs_end_to_end() {
    let (url, _hits) = spawn_fixture_server(binance_spot_info_body()).await;
    let exchange = BinanceExchange::with_base_urls(url.clone(), url);

    let listing = exchange.fetch_all_pairs("spot", true).await.unwrap();

    assert_eq!(listing.active.len(), 2);
    for pair in &listing.active {
        assert!(pair.is_active);
        assert_eq!(pair.exchange, "binance-spot");
    }
    assert_eq!(listing.active[0].symbol, "BTC");
    assert_eq!(listing.active[0].pair, "BTCUSDT");

    assert_eq!(listing.inactive.len(), 1);
    assert!(!listing.inactive[0].is_active);
    assert_eq!(listing.inactive[0].symbol, "HIFI");
    assert_eq!(listing.inactive[0].exchange, "binance-spot");
}

#[tokio::test]
async fn test_pair_cache_bounds_network_calls() {
    let (url, hits) = spawn_fixture_server(binance_spot_info_body()).await;
    let exchange = BinanceExchange::with_base_urls(url.clone(), url)
        .with_cache_ttl(Duration::from_millis(80));

    let first = exchange.fetch_all_pairs("spot", true).await.unwrap();
    let second = exchange.fetch_all_pairs("spot", true).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // After the TTL has elapsed the stale entry falls through to a live
    // fetch.
    tokio::time::sleep(Duration::from_millis(120)).await;
    exchange.fetch_all_pairs("spot", true).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_bypass_always_fetches() {
    let (url, hits) = spawn_fixture_server(binance_spot_info_body()).await;
    let exchange = BinanceExchange::with_base_urls(url.clone(), url);

    exchange.fetch_all_pairs("spot", false).await.unwrap();

    // Closing the connection early is an escape hatch, not a terminal state:
    // the next request reopens it.
    exchange.close();
    exchange.fetch_all_pairs("spot", false).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_entries_are_per_market_type() {
    let (url, hits) = spawn_fixture_server(binance_spot_info_body()).await;
    // The fixture body has no futures fields, so the futures listing parses
    // to an empty set; only the call counting matters here.
    let exchange = BinanceExchange::with_base_urls(url.clone(), url);

    exchange.fetch_all_pairs("spot", true).await.unwrap();
    exchange.fetch_all_pairs("futures", true).await.unwrap();
    exchange.fetch_all_pairs("spot", true).await.unwrap();
    exchange.fetch_all_pairs("futures", true).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_binance_futures_kline_limit_cap_allows_1500() {
    let (url, hits) = spawn_fixture_server("[]".to_string()).await;
    let exchange = BinanceExchange::with_base_urls(url.clone(), url);

    let spot = exchange
        .fetch_klines("BTCUSDT", "1h", "spot", None, None, 1000, None)
        .await
        .unwrap();
    assert!(spot.is_empty());

    let futures = exchange
        .fetch_klines("BTCUSDT", "1h", "futures", None, None, 1500, None)
        .await
        .unwrap();
    assert!(futures.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    let err = exchange
        .fetch_klines("BTCUSDT", "1h", "spot", None, None, 1500, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Validation(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_bybit_klines_reverse_to_chronological_order() {
    let body = serde_json::json!({
        "retCode": 0,
        "retMsg": "OK",
        "result": {
            "list": [
                ["1700007200000", "35100.0", "35200.0", "35000.0", "35150.0", "10.5", "368000.0"],
                ["1700003600000", "35000.0", "35120.0", "34900.0", "35100.0", "12.1", "424000.0"],
                ["1700000000000", "34900.0", "35050.0", "34800.0", "35000.0", "9.8", "342000.0"],
            ]
        }
    })
    .to_string();
    let (url, _hits) = spawn_fixture_server(body).await;
    let exchange = BybitExchange::with_base_url(url);

    let first = exchange
        .fetch_klines("BTCUSDT", "60", "spot", None, None, 200, None)
        .await
        .unwrap();
    let second = exchange
        .fetch_klines("BTCUSDT", "60", "spot", None, None, 200, None)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert!(first.windows(2).all(|w| w[0].open_time < w[1].open_time));
    assert_eq!(first[0].open_time, 1700000000000);
}

#[tokio::test]
async fn test_bybit_vendor_error_is_not_a_transport_error() {
    let body = serde_json::json!({
        "retCode": 10001,
        "retMsg": "params error: symbol invalid",
    })
    .to_string();
    let (url, _hits) = spawn_fixture_server(body).await;
    let exchange = BybitExchange::with_base_url(url);

    let err = exchange
        .fetch_klines("NOPEUSDT", "60", "spot", None, None, 200, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Vendor(_)));
    assert!(err.to_string().contains("symbol invalid"));
}

#[tokio::test]
async fn test_bybit_missing_granularity_makes_no_network_call() {
    let (url, hits) = spawn_fixture_server("{}".to_string()).await;
    let exchange = BybitExchange::with_base_url(url);
    let series = exchange.open_interest_series().unwrap();

    let err = series
        .fetch_open_interest("BTCUSDT", "", None, None, 50)
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Validation(_)));
    assert!(err.to_string().contains("Invalid interval"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_bybit_inactive_pairs_are_always_empty() {
    let body = serde_json::json!({
        "retCode": 0,
        "retMsg": "OK",
        "result": {
            "list": [
                {"symbol": "BTCUSDT", "baseCoin": "BTC", "quoteCoin": "USDT", "status": "Trading"},
                {"symbol": "ETHBTC", "baseCoin": "ETH", "quoteCoin": "BTC", "status": "Trading"},
            ]
        }
    })
    .to_string();
    let (url, _hits) = spawn_fixture_server(body).await;
    let exchange = BybitExchange::with_base_url(url);

    let listing = exchange.fetch_all_pairs("spot", true).await.unwrap();
    assert_eq!(listing.active.len(), 1);
    assert_eq!(listing.active[0].exchange, "bybit-spot");
    assert!(listing.inactive.is_empty());
}

#[tokio::test]
async fn test_hyperliquid_futures_pairs_end_to_end() {
    let body = serde_json::json!({
        "universe": [
            {"name": "BTC", "szDecimals": 5, "maxLeverage": 40},
            {"name": "LUNA", "szDecimals": 1, "maxLeverage": 3, "isDelisted": true},
        ]
    })
    .to_string();
    let (url, _hits) = spawn_fixture_server(body).await;
    let exchange = HyperliquidExchange::with_info_url(url);

    let listing = exchange.fetch_all_pairs("futures", true).await.unwrap();

    assert_eq!(listing.active.len(), 1);
    assert_eq!(listing.active[0].pair, "BTC-USD");
    assert_eq!(listing.active[0].exchange, "hyperliquid-futures");
    assert_eq!(listing.inactive.len(), 1);
    assert_eq!(listing.inactive[0].pair, "LUNA-USD");
    assert!(!listing.inactive[0].is_active);
}

#[tokio::test]
async fn test_hyperliquid_market_data_is_never_cached() {
    let body = serde_json::json!([
        {"universe": [{"name": "BTC", "szDecimals": 5, "maxLeverage": 40}]},
        [{"markPx": "101540.0", "prevDayPx": "102983.0", "funding": "0.0000125",
          "openInterest": "12345.6", "dayNtlVlm": "2500000000.0", "dayBaseVlm": "24000.0"}]
    ])
    .to_string();
    let (url, hits) = spawn_fixture_server(body).await;
    let exchange = HyperliquidExchange::with_info_url(url);
    let market_data = exchange.market_data().unwrap();

    let first = market_data.fetch_market_data(Some("BTC")).await.unwrap();
    let second = market_data.fetch_market_data(Some("BTC")).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].symbol, "BTC");
    assert_eq!(first[0].price_change_24h.to_string(), "-1.40");
    assert_eq!(first, second);
    // Snapshots are request-scoped: every call goes to the network.
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
