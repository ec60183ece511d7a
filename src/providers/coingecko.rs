use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    config::Config,
    constants::{coingecko_id_for, coingecko_platform, PROXY_UPSTREAM_TIMEOUT_SECS},
    error::{AppError, Result},
    models::{PricePoint, PriceQuote},
    providers::PriceProvider,
};

/// CoinGecko client. The optional demo API key is attached as a header
/// when configured; without it the public endpoints are used as-is.
/// The client timeout is the prices proxy's degradation bound: a hung
/// upstream must collapse to the fallback payload within it.
pub struct CoingeckoProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Maps a ticker symbol to the provider id. Symbols outside the static
/// table resolve to their lower-cased form as a best-effort guess; the
/// second component reports whether the table matched so callers can log
/// the guess (a known source of silently-zero prices otherwise).
pub fn resolve_coingecko_id(symbol: &str) -> (String, bool) {
    match coingecko_id_for(symbol) {
        Some(id) => (id.to_string(), true),
        None => (symbol.trim().to_ascii_lowercase(), false),
    }
}

impl CoingeckoProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROXY_UPSTREAM_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.coingecko_base_url.trim_end_matches('/').to_string(),
            api_key: config.coingecko_api_key.clone(),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Option<Value> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.get(url).query(query);
        if let Some(key) = self.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
            request = request.header("x-cg-demo-api-key", key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| tracing::warn!("coingecko {} request failed: {}", path, e))
            .ok()?;
        if !response.status().is_success() {
            tracing::warn!("coingecko {} returned status {}", path, response.status());
            return None;
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| tracing::warn!("coingecko {} returned invalid JSON: {}", path, e))
            .ok()
    }
}

#[async_trait]
impl PriceProvider for CoingeckoProvider {
    async fn simple_prices(
        &self,
        ids: &[String],
        vs_currency: &str,
    ) -> Option<HashMap<String, PricePoint>> {
        if ids.is_empty() {
            return Some(HashMap::new());
        }
        let joined = ids.join(",");
        let payload = self
            .get_json(
                "simple/price",
                &[
                    ("ids", joined.as_str()),
                    ("vs_currencies", vs_currency),
                    ("include_24hr_change", "true"),
                    ("include_market_cap", "true"),
                    ("include_24hr_vol", "true"),
                ],
            )
            .await?;
        let map = payload.as_object()?;
        let mut prices = HashMap::with_capacity(map.len());
        for (id, point) in map {
            match serde_json::from_value::<PricePoint>(point.clone()) {
                Ok(point) => {
                    prices.insert(id.clone(), point);
                }
                Err(e) => tracing::debug!("price entry for {} skipped: {}", id, e),
            }
        }
        Some(prices)
    }

    async fn quote_by_symbol(&self, symbol: &str) -> Option<PriceQuote> {
        let (id, resolved) = resolve_coingecko_id(symbol);
        if !resolved {
            tracing::warn!(
                "symbol {} not in id table; guessing provider id {}",
                symbol,
                id
            );
        }
        let prices = self.simple_prices(&[id.clone()], "usd").await?;
        let point = prices.get(&id)?;
        Some(PriceQuote {
            id,
            symbol: symbol.to_ascii_uppercase(),
            usd: point.usd,
            usd_24h_change: point.usd_24h_change,
            usd_market_cap: point.usd_market_cap,
            usd_24h_vol: point.usd_24h_vol,
            is_mock_data: false,
        })
    }

    async fn price_by_contract(&self, contract: &str, chain_id: u64) -> Option<f64> {
        let path = format!("simple/token_price/{}", coingecko_platform(chain_id));
        let payload = self
            .get_json(
                &path,
                &[("contract_addresses", contract), ("vs_currencies", "usd")],
            )
            .await?;
        payload
            .get(contract.to_ascii_lowercase().as_str())
            .or_else(|| payload.get(contract))
            .and_then(|entry| entry.get("usd"))
            .and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_uses_table_for_known_symbols() {
        assert_eq!(resolve_coingecko_id("ETH"), ("ethereum".to_string(), true));
        assert_eq!(resolve_coingecko_id("usdc"), ("usd-coin".to_string(), true));
    }

    #[test]
    fn resolver_lowercases_unknown_symbols() {
        assert_eq!(resolve_coingecko_id("PEPE"), ("pepe".to_string(), false));
        assert_eq!(resolve_coingecko_id(" Wif "), ("wif".to_string(), false));
    }

    #[test]
    fn proxy_degradation_bound_is_five_seconds() {
        assert_eq!(PROXY_UPSTREAM_TIMEOUT_SECS, 5);
    }
}
