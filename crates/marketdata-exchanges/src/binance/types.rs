use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    /// Futures exchange-info carries a separate `pair` field; spot does not.
    #[serde(default)]
    pub pair: Option<String>,
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateEntry {
    pub symbol: String,
    pub funding_rate: String,
    pub funding_time: i64,
    #[serde(default)]
    pub mark_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingInfoEntry {
    pub symbol: String,
    #[serde(default)]
    pub adjusted_funding_rate_cap: Option<String>,
    #[serde(default)]
    pub adjusted_funding_rate_floor: Option<String>,
    #[serde(default)]
    pub funding_interval_hours: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterestResponse {
    pub symbol: String,
    pub open_interest: String,
    pub time: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterestHistEntry {
    pub symbol: String,
    #[serde(default)]
    pub sum_open_interest: Option<String>,
    #[serde(default)]
    pub sum_open_interest_value: Option<String>,
    pub timestamp: i64,
}
