use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    config::Config,
    constants::{alchemy_nft_base, alchemy_rpc_base, PROVIDER_REQUEST_TIMEOUT_SECS},
    error::{AppError, Result},
    models::{AssetTransfer, NftAttribute, NftRecord, RawTokenBalance, TokenMetadata},
    providers::TokenDataProvider,
};

/// Alchemy client: JSON-RPC for balances/metadata/gas/transfers plus the
/// REST NFT listing. One outbound request per call, failures become `None`.
pub struct AlchemyProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AlchemyProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROVIDER_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: config.alchemy_api_key.clone(),
        })
    }

    fn rpc_url(&self, chain_id: u64) -> String {
        format!("{}/{}", alchemy_rpc_base(chain_id), self.api_key)
    }

    async fn rpc_call(&self, chain_id: u64, method: &str, params: Value) -> Option<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(self.rpc_url(chain_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| tracing::warn!("{} request failed: {}", method, e))
            .ok()?;
        if !response.status().is_success() {
            tracing::warn!("{} returned status {}", method, response.status());
            return None;
        }
        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| tracing::warn!("{} returned invalid JSON: {}", method, e))
            .ok()?;
        if let Some(error) = payload.get("error") {
            tracing::warn!("{} RPC error: {}", method, error);
            return None;
        }
        payload.get("result").cloned()
    }
}

#[async_trait]
impl TokenDataProvider for AlchemyProvider {
    async fn token_balances(&self, address: &str, chain_id: u64) -> Option<Vec<RawTokenBalance>> {
        let result = self
            .rpc_call(chain_id, "alchemy_getTokenBalances", json!([address, "erc20"]))
            .await?;
        let entries = result.get("tokenBalances")?.as_array()?;
        // Upstream reports per-token errors as null balances; those entries
        // are skipped here rather than failing the whole response.
        let balances = entries
            .iter()
            .filter_map(|entry| serde_json::from_value::<RawTokenBalance>(entry.clone()).ok())
            .collect();
        Some(balances)
    }

    async fn token_metadata(&self, contract: &str, chain_id: u64) -> Option<TokenMetadata> {
        let result = self
            .rpc_call(chain_id, "alchemy_getTokenMetadata", json!([contract]))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| tracing::debug!("token metadata decode failed for {}: {}", contract, e))
            .ok()
    }

    async fn gas_price(&self, chain_id: u64) -> Option<String> {
        let result = self.rpc_call(chain_id, "eth_gasPrice", json!([])).await?;
        result.as_str().map(str::to_string)
    }

    async fn asset_transfers(&self, address: &str, chain_id: u64) -> Option<Vec<AssetTransfer>> {
        let params = json!([{
            "fromBlock": "0x0",
            "toBlock": "latest",
            "toAddress": address,
            "category": ["external", "erc20", "erc721"],
            "order": "desc",
            "maxCount": "0x19",
        }]);
        let result = self
            .rpc_call(chain_id, "alchemy_getAssetTransfers", params)
            .await?;
        let transfers = result.get("transfers")?.as_array()?;
        Some(transfers.iter().filter_map(parse_transfer).collect())
    }

    async fn owned_nfts(&self, address: &str, chain_id: u64) -> Option<Vec<NftRecord>> {
        let url = format!(
            "{}/{}/getNFTsForOwner",
            alchemy_nft_base(chain_id),
            self.api_key
        );
        let response = self
            .client
            .get(url)
            .query(&[("owner", address), ("pageSize", "24")])
            .send()
            .await
            .map_err(|e| tracing::warn!("getNFTsForOwner request failed: {}", e))
            .ok()?;
        if !response.status().is_success() {
            tracing::warn!("getNFTsForOwner returned status {}", response.status());
            return None;
        }
        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| tracing::warn!("getNFTsForOwner returned invalid JSON: {}", e))
            .ok()?;
        let owned = payload.get("ownedNfts")?.as_array()?;
        Some(owned.iter().filter_map(parse_nft).collect())
    }
}

fn parse_transfer(entry: &Value) -> Option<AssetTransfer> {
    Some(AssetTransfer {
        hash: entry.get("hash")?.as_str()?.to_string(),
        from: entry.get("from")?.as_str()?.to_string(),
        to: entry
            .get("to")
            .and_then(Value::as_str)
            .map(str::to_string),
        asset: entry
            .get("asset")
            .and_then(Value::as_str)
            .map(str::to_string),
        value: entry.get("value").and_then(Value::as_f64),
        category: entry
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or("external")
            .to_string(),
        block_num: entry
            .get("blockNum")
            .and_then(Value::as_str)
            .unwrap_or("0x0")
            .to_string(),
    })
}

fn parse_nft(entry: &Value) -> Option<NftRecord> {
    let contract_address = entry
        .get("contract")?
        .get("address")?
        .as_str()?
        .to_string();
    let token_id = entry.get("tokenId")?.as_str()?.to_string();

    let attributes = entry
        .get("raw")
        .and_then(|raw| raw.get("metadata"))
        .and_then(|meta| meta.get("attributes"))
        .and_then(Value::as_array)
        .map(|attrs| {
            attrs
                .iter()
                .filter_map(|attr| {
                    Some(NftAttribute {
                        trait_type: attr.get("trait_type")?.as_str()?.to_string(),
                        value: match attr.get("value")? {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        },
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(NftRecord {
        contract_address,
        token_id,
        name: entry.get("name").and_then(Value::as_str).map(str::to_string),
        description: entry
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        image_url: entry
            .get("image")
            .and_then(|image| {
                image
                    .get("cachedUrl")
                    .or_else(|| image.get("originalUrl"))
            })
            .and_then(Value::as_str)
            .map(str::to_string),
        collection_name: entry
            .get("collection")
            .and_then(|collection| collection.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        attributes,
    })
}
