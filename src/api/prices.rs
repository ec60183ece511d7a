use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    constants::{fallback_price_point, FALLBACK_PRICE_IDS},
    error::{AppError, Result},
    models::PricePoint,
    services::{price_feed_key, CancelToken},
};

#[derive(Debug, Deserialize)]
pub struct PricesQuery {
    pub ids: Option<String>,
    pub vs_currencies: Option<String>,
}

/// Proxy body: the upstream id-keyed map flattened next to an explicit
/// degraded marker, so consumers can tell live data from the fallback
/// without comparing id sets.
#[derive(Debug, Serialize)]
pub struct PricesProxyResponse {
    pub degraded: bool,
    #[serde(flatten)]
    pub prices: HashMap<String, PricePoint>,
}

fn parse_ids(raw: Option<&str>) -> Result<Vec<String>> {
    let ids: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(AppError::BadRequest(
            "ids query parameter is required".to_string(),
        ));
    }
    Ok(ids)
}

/// The literal payload served when the upstream is unreachable.
pub fn fallback_prices() -> HashMap<String, PricePoint> {
    FALLBACK_PRICE_IDS
        .iter()
        .filter_map(|id| {
            let (usd, change, cap, vol) = fallback_price_point(id)?;
            Some((
                id.to_string(),
                PricePoint {
                    usd,
                    usd_24h_change: change,
                    usd_market_cap: Some(cap),
                    usd_24h_vol: Some(vol),
                },
            ))
        })
        .collect()
}

fn proxy_response(data: Option<HashMap<String, PricePoint>>) -> PricesProxyResponse {
    match data {
        // An empty map from a healthy upstream (no requested id known) is
        // still live data, not a failure.
        Some(prices) => PricesProxyResponse {
            degraded: false,
            prices,
        },
        // Graceful degradation is deliberate: HTTP 200 with the literal
        // fallback set, flagged so it is never mistaken for market data.
        None => PricesProxyResponse {
            degraded: true,
            prices: fallback_prices(),
        },
    }
}

/// GET /api/coingecko/prices?ids=a,b&vs_currencies=usd
pub async fn get_prices(
    State(state): State<AppState>,
    Query(query): Query<PricesQuery>,
) -> Result<Json<PricesProxyResponse>> {
    let ids = parse_ids(query.ids.as_deref())?;
    let vs_currency = query
        .vs_currencies
        .filter(|vs| !vs.trim().is_empty())
        .unwrap_or_else(|| "usd".to_string());

    let key = price_feed_key(&ids, &vs_currency);
    let prices_provider = state.prices.clone();
    let snapshot = state
        .price_cache
        .get_or_fetch(&key, &CancelToken::new(), || {
            let prices_provider = prices_provider.clone();
            let ids = ids.clone();
            let vs_currency = vs_currency.clone();
            async move { prices_provider.simple_prices(&ids, &vs_currency).await }
        })
        .await;

    Ok(Json(proxy_response(snapshot.data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ids_is_a_bad_request() {
        assert!(parse_ids(None).is_err());
        assert!(parse_ids(Some(" , ,")).is_err());
        assert_eq!(parse_ids(Some("ethereum, bitcoin")).unwrap().len(), 2);
    }

    #[test]
    fn upstream_failure_serves_the_documented_fallback() {
        let response = proxy_response(None);
        assert!(response.degraded);
        assert_eq!(response.prices.len(), 3);
        assert_eq!(response.prices["ethereum"].usd, 2487.32);
        assert!(response.prices.contains_key("bitcoin"));
        assert!(response.prices.contains_key("usd-coin"));
    }

    #[test]
    fn live_data_is_not_marked_degraded() {
        let mut prices = HashMap::new();
        prices.insert(
            "ethereum".to_string(),
            PricePoint {
                usd: 3000.0,
                usd_24h_change: 1.0,
                usd_market_cap: None,
                usd_24h_vol: None,
            },
        );
        let response = proxy_response(Some(prices));
        assert!(!response.degraded);
        assert_eq!(response.prices["ethereum"].usd, 3000.0);
    }

    #[test]
    fn empty_map_from_healthy_upstream_is_live() {
        let response = proxy_response(Some(HashMap::new()));
        assert!(!response.degraded);
        assert!(response.prices.is_empty());
    }

    #[test]
    fn proxy_body_flattens_the_price_map() {
        let body = serde_json::to_value(proxy_response(None)).unwrap();
        assert_eq!(body["degraded"], true);
        assert_eq!(body["ethereum"]["usd"], 2487.32);
    }
}
