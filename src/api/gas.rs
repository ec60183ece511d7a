use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::{
    constants::{FALLBACK_GAS_FAST, FALLBACK_GAS_PROPOSE, FALLBACK_GAS_SAFE},
    models::GasOracleReading,
};

/// Upstream field names preserved, with the explicit degraded marker the
/// prices proxy also carries.
#[derive(Debug, Serialize)]
pub struct GasProxyResponse {
    #[serde(rename = "SafeGasPrice")]
    pub safe_gas_price: String,
    #[serde(rename = "ProposeGasPrice")]
    pub propose_gas_price: String,
    #[serde(rename = "FastGasPrice")]
    pub fast_gas_price: String,
    pub degraded: bool,
}

fn proxy_response(reading: Option<GasOracleReading>) -> GasProxyResponse {
    match reading {
        Some(reading) => GasProxyResponse {
            safe_gas_price: reading.safe,
            propose_gas_price: reading.propose,
            fast_gas_price: reading.fast,
            degraded: false,
        },
        // No key configured, upstream timeout, or upstream non-success all
        // land here: HTTP 200 with the literal tiers, flagged degraded.
        None => GasProxyResponse {
            safe_gas_price: FALLBACK_GAS_SAFE.to_string(),
            propose_gas_price: FALLBACK_GAS_PROPOSE.to_string(),
            fast_gas_price: FALLBACK_GAS_FAST.to_string(),
            degraded: true,
        },
    }
}

/// GET /api/gas/ethereum
pub async fn get_ethereum_gas(State(state): State<AppState>) -> Json<GasProxyResponse> {
    Json(proxy_response(state.gas_oracle.gas_oracle().await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_failure_serves_literal_tiers() {
        let response = proxy_response(None);
        assert!(response.degraded);
        assert_eq!(response.safe_gas_price, "18");
        assert_eq!(response.propose_gas_price, "23");
        assert_eq!(response.fast_gas_price, "28");
    }

    #[test]
    fn live_reading_passes_through() {
        let response = proxy_response(Some(GasOracleReading {
            safe: "11".into(),
            propose: "14".into(),
            fast: "19".into(),
        }));
        assert!(!response.degraded);
        assert_eq!(response.propose_gas_price, "14");
    }

    #[test]
    fn body_uses_upstream_field_names() {
        let body = serde_json::to_value(proxy_response(None)).unwrap();
        assert_eq!(body["SafeGasPrice"], "18");
        assert_eq!(body["degraded"], true);
    }
}
