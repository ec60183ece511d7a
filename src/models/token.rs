use serde::{Deserialize, Serialize};

/// One entry of the `alchemy_getTokenBalances` response. The balance is the
/// raw hex amount as reported upstream; nothing is derived at this layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenBalance {
    pub contract_address: String,
    pub token_balance: String,
}

/// `alchemy_getTokenMetadata` result. `decimals` is genuinely optional in
/// the wild; the aggregation layer applies the documented default of 18.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub logo: Option<String>,
}

/// A balance record joined with metadata and a unit price. Rebuilt wholesale
/// every fetch cycle, never mutated in place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBalance {
    pub contract_address: String,
    pub raw_balance: String,
    pub balance: f64,
    pub formatted_balance: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub unit_price_usd: f64,
    pub value_usd: f64,
}

/// Per-id entry of the CoinGecko simple-price map, field names preserved
/// so the proxy body matches the upstream shape.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PricePoint {
    pub usd: f64,
    #[serde(default)]
    pub usd_24h_change: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_24h_vol: Option<f64>,
}

/// A single-asset quote. `is_mock_data` is true when the value came from
/// the literal fallback table instead of the upstream; the flag must reach
/// the consumer untouched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub id: String,
    pub symbol: String,
    pub usd: f64,
    pub usd_24h_change: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_24h_vol: Option<f64>,
    pub is_mock_data: bool,
}

/// Current gas price derived from `eth_gasPrice`. No history is kept.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasQuote {
    pub wei_hex: String,
    pub gwei: f64,
    pub formatted: String,
}

/// Gas-oracle tiers as decimal-string gwei, the upstream's own convention.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GasOracleReading {
    #[serde(rename = "SafeGasPrice")]
    pub safe: String,
    #[serde(rename = "ProposeGasPrice")]
    pub propose: String,
    #[serde(rename = "FastGasPrice")]
    pub fast: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NftAttribute {
    pub trait_type: String,
    pub value: String,
}

/// Owned NFT, keyed by (contract address, token id). Attribute order is
/// preserved as reported.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NftRecord {
    pub contract_address: String,
    pub token_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    pub attributes: Vec<NftAttribute>,
}

/// One row of `alchemy_getAssetTransfers`, the wallet's recent activity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfer {
    pub hash: String,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub category: String,
    pub block_num: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_balance_deserializes_upstream_shape() {
        let entry: RawTokenBalance = serde_json::from_str(
            r#"{"contractAddress":"0xabc","tokenBalance":"0x0de0b6b3a7640000"}"#,
        )
        .unwrap();
        assert_eq!(entry.contract_address, "0xabc");
        assert_eq!(entry.token_balance, "0x0de0b6b3a7640000");
    }

    #[test]
    fn metadata_tolerates_missing_decimals() {
        let meta: TokenMetadata =
            serde_json::from_str(r#"{"name":"Pepe","symbol":"PEPE"}"#).unwrap();
        assert_eq!(meta.decimals, None);
        assert_eq!(meta.symbol.as_deref(), Some("PEPE"));
    }

    #[test]
    fn gas_oracle_reading_uses_upstream_field_names() {
        let reading: GasOracleReading = serde_json::from_str(
            r#"{"SafeGasPrice":"18","ProposeGasPrice":"23","FastGasPrice":"28"}"#,
        )
        .unwrap();
        assert_eq!(reading.propose, "23");
    }
}
