use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    config::Config,
    constants::PROXY_UPSTREAM_TIMEOUT_SECS,
    error::{AppError, Result},
    models::GasOracleReading,
    providers::GasOracleProvider,
};

/// Etherscan gas-oracle client for the proxy route. The API key is
/// optional by design: without one the route serves its fallback values.
pub struct EtherscanProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl EtherscanProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROXY_UPSTREAM_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.etherscan_base_url.trim_end_matches('/').to_string(),
            api_key: config.etherscan_api_key.clone(),
        })
    }
}

#[async_trait]
impl GasOracleProvider for EtherscanProvider {
    async fn gas_oracle(&self) -> Option<GasOracleReading> {
        let key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())?;
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "gastracker"),
                ("action", "gasoracle"),
                ("apikey", key),
            ])
            .send()
            .await
            .map_err(|e| tracing::warn!("gas oracle request failed: {}", e))
            .ok()?;
        if !response.status().is_success() {
            tracing::warn!("gas oracle returned status {}", response.status());
            return None;
        }
        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| tracing::warn!("gas oracle returned invalid JSON: {}", e))
            .ok()?;
        // Etherscan reports failures as {"status":"0", ...} with HTTP 200.
        if payload.get("status").and_then(Value::as_str) != Some("1") {
            tracing::warn!(
                "gas oracle reported non-success: {}",
                payload.get("message").and_then(serde_json::Value::as_str).unwrap_or("?")
            );
            return None;
        }
        let result = payload.get("result")?.clone();
        serde_json::from_value(result)
            .map_err(|e| tracing::warn!("gas oracle decode failed: {}", e))
            .ok()
    }
}
