use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SpotMeta {
    #[serde(default)]
    pub tokens: Vec<SpotToken>,
    #[serde(default)]
    pub universe: Vec<SpotPair>,
}

#[derive(Debug, Deserialize)]
pub struct SpotToken {
    pub name: String,
    pub index: u64,
    #[serde(rename = "tokenId", default)]
    pub token_id: Option<String>,
    #[serde(rename = "weiDecimals", default)]
    pub wei_decimals: Option<u32>,
}

/// A spot pair references its base and quote tokens by index into the
/// token table.
#[derive(Debug, Deserialize)]
pub struct SpotPair {
    #[serde(default)]
    pub tokens: Vec<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub universe: Vec<PerpAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpAsset {
    pub name: String,
    #[serde(default)]
    pub sz_decimals: Option<u32>,
    #[serde(default)]
    pub max_leverage: Option<u32>,
    #[serde(default)]
    pub is_delisted: bool,
}

/// Live per-asset context; parallel to `Meta::universe` by position.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCtx {
    #[serde(default)]
    pub funding: Option<String>,
    #[serde(default)]
    pub open_interest: Option<String>,
    #[serde(default)]
    pub prev_day_px: Option<String>,
    #[serde(default)]
    pub day_ntl_vlm: Option<String>,
    #[serde(default)]
    pub premium: Option<String>,
    #[serde(default)]
    pub oracle_px: Option<String>,
    #[serde(default)]
    pub mark_px: Option<String>,
    #[serde(default)]
    pub mid_px: Option<String>,
    #[serde(default)]
    pub day_base_vlm: Option<String>,
}
