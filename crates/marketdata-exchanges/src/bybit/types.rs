use serde::Deserialize;

/// Every Bybit v5 response is wrapped in this envelope. A non-zero
/// `retCode` is a vendor-side failure even though the HTTP status is 2xx.
#[derive(Debug, Deserialize)]
pub struct BybitResponse<T> {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg", default)]
    pub ret_msg: String,
    #[serde(default)]
    pub result: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InstrumentsResult {
    #[serde(default)]
    pub list: Vec<Instrument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub base_coin: String,
    pub quote_coin: String,
    pub status: String,
    #[serde(default)]
    pub contract_type: Option<String>,
}

/// Kline rows are positional string arrays:
/// [startTime, open, high, low, close, volume, turnover], newest first.
#[derive(Debug, Default, Deserialize)]
pub struct KlineResult {
    #[serde(default)]
    pub list: Vec<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FundingResult {
    #[serde(default)]
    pub list: Vec<FundingEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingEntry {
    pub symbol: String,
    pub funding_rate: String,
    pub funding_rate_timestamp: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterestResult {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub list: Vec<OpenInterestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterestEntry {
    pub open_interest: String,
    pub timestamp: String,
}
