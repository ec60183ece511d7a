use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{chain_or_default, require_address, AppState};
use crate::{
    constants::fallback_price_point,
    error::{AppError, Result},
    models::{ApiResponse, AssetTransfer, EnrichedBalance, GasQuote, NftRecord, PriceQuote},
    providers::coingecko::resolve_coingecko_id,
    services::{gas, portfolio::total_value_usd, CancelToken, Dataset, FeedKey},
};

#[derive(Debug, Deserialize)]
pub struct WalletQuery {
    pub address: Option<String>,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ChainQuery {
    pub chain_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTokensResponse {
    pub address: String,
    pub chain_id: u64,
    pub total_value_usd: f64,
    pub tokens: Vec<EnrichedBalance>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NftListResponse {
    pub address: String,
    pub chain_id: u64,
    pub count: usize,
    pub nfts: Vec<NftRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferListResponse {
    pub address: String,
    pub chain_id: u64,
    pub transfers: Vec<AssetTransfer>,
}

fn sort_by_value_desc(tokens: &mut [EnrichedBalance]) {
    tokens.sort_by(|a, b| {
        b.value_usd
            .partial_cmp(&a.value_usd)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// GET /api/v1/portfolio/tokens?address=&chain_id=
pub async fn get_tokens(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<ApiResponse<PortfolioTokensResponse>>> {
    let address = require_address(query.address.as_deref())?;
    let chain_id = chain_or_default(query.chain_id, &state.config);

    let key = FeedKey::new(Dataset::Balances, Some(&address), chain_id);
    let portfolio = state.portfolio.clone();
    let fetch_address = address.clone();
    let snapshot = state
        .balance_cache
        .get_or_fetch(&key, &CancelToken::new(), || {
            let portfolio = portfolio.clone();
            let fetch_address = fetch_address.clone();
            async move {
                portfolio
                    .enriched_balances(&fetch_address, chain_id)
                    .await
                    .ok()
            }
        })
        .await;

    let mut tokens = match snapshot.data {
        Some(tokens) => tokens,
        None => {
            return Err(AppError::ExternalApi(
                snapshot
                    .error
                    .unwrap_or_else(|| "token balances unavailable".to_string()),
            ))
        }
    };

    // The aggregation itself guarantees no order; the dashboard wants
    // largest positions first.
    sort_by_value_desc(&mut tokens);
    let total_value_usd = total_value_usd(&tokens);

    Ok(Json(ApiResponse::success(PortfolioTokensResponse {
        address,
        chain_id,
        total_value_usd,
        tokens,
        updated_at: Utc::now(),
    })))
}

/// GET /api/v1/portfolio/nfts?address=&chain_id=
pub async fn get_nfts(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<ApiResponse<NftListResponse>>> {
    let address = require_address(query.address.as_deref())?;
    let chain_id = chain_or_default(query.chain_id, &state.config);

    let key = FeedKey::new(Dataset::Nfts, Some(&address), chain_id);
    let tokens = state.tokens.clone();
    let fetch_address = address.clone();
    let snapshot = state
        .nft_cache
        .get_or_fetch(&key, &CancelToken::new(), || {
            let tokens = tokens.clone();
            let fetch_address = fetch_address.clone();
            async move { tokens.owned_nfts(&fetch_address, chain_id).await }
        })
        .await;

    let nfts = snapshot
        .data
        .ok_or_else(|| AppError::ExternalApi("NFT listing unavailable".to_string()))?;

    Ok(Json(ApiResponse::success(NftListResponse {
        address,
        chain_id,
        count: nfts.len(),
        nfts,
    })))
}

/// GET /api/v1/portfolio/transfers?address=&chain_id=
pub async fn get_transfers(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<ApiResponse<TransferListResponse>>> {
    let address = require_address(query.address.as_deref())?;
    let chain_id = chain_or_default(query.chain_id, &state.config);

    let key = FeedKey::new(Dataset::Transfers, Some(&address), chain_id);
    let tokens = state.tokens.clone();
    let fetch_address = address.clone();
    let snapshot = state
        .transfer_cache
        .get_or_fetch(&key, &CancelToken::new(), || {
            let tokens = tokens.clone();
            let fetch_address = fetch_address.clone();
            async move { tokens.asset_transfers(&fetch_address, chain_id).await }
        })
        .await;

    let transfers = snapshot
        .data
        .ok_or_else(|| AppError::ExternalApi("transfer history unavailable".to_string()))?;

    Ok(Json(ApiResponse::success(TransferListResponse {
        address,
        chain_id,
        transfers,
    })))
}

/// GET /api/v1/gas/quote?chain_id=
pub async fn get_gas_quote(
    State(state): State<AppState>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ApiResponse<GasQuote>>> {
    let chain_id = chain_or_default(query.chain_id, &state.config);

    let key = FeedKey::new(Dataset::Gas, None, chain_id);
    let tokens = state.tokens.clone();
    let snapshot = state
        .gas_cache
        .get_or_fetch(&key, &CancelToken::new(), || {
            let tokens = tokens.clone();
            async move {
                let wei_hex = tokens.gas_price(chain_id).await?;
                gas::quote_from_wei_hex(&wei_hex)
            }
        })
        .await;

    let quote = snapshot
        .data
        .ok_or_else(|| AppError::ExternalApi("gas price unavailable".to_string()))?;

    Ok(Json(ApiResponse::success(quote)))
}

/// Fallback literal for a symbol, marked as mock data. Only the three
/// documented fallback assets resolve here.
fn fallback_quote(symbol: &str) -> Option<PriceQuote> {
    let (id, _) = resolve_coingecko_id(symbol);
    let (usd, change, cap, vol) = fallback_price_point(&id)?;
    Some(PriceQuote {
        id,
        symbol: symbol.to_ascii_uppercase(),
        usd,
        usd_24h_change: change,
        usd_market_cap: Some(cap),
        usd_24h_vol: Some(vol),
        is_mock_data: true,
    })
}

/// GET /api/v1/prices/quote?symbol=
pub async fn get_price_quote(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<ApiResponse<PriceQuote>>> {
    let symbol = query
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("symbol query parameter is required".to_string()))?;

    if let Some(quote) = state.prices.quote_by_symbol(&symbol).await {
        return Ok(Json(ApiResponse::success(quote)));
    }

    let quote = fallback_quote(&symbol)
        .ok_or_else(|| AppError::ExternalApi(format!("price unavailable for {}", symbol)))?;
    Ok(Json(ApiResponse::success(quote)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(contract: &str, value_usd: f64) -> EnrichedBalance {
        EnrichedBalance {
            contract_address: contract.to_string(),
            raw_balance: "0x1".to_string(),
            balance: 1.0,
            formatted_balance: "1".to_string(),
            name: contract.to_string(),
            symbol: contract.to_string(),
            decimals: 18,
            logo: None,
            unit_price_usd: value_usd,
            value_usd,
        }
    }

    #[test]
    fn tokens_are_sorted_largest_first() {
        let mut tokens = vec![balance("a", 1.0), balance("b", 30.0), balance("c", 5.0)];
        sort_by_value_desc(&mut tokens);
        let order: Vec<&str> = tokens.iter().map(|t| t.contract_address.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn fallback_quote_is_marked_mock() {
        let quote = fallback_quote("eth").unwrap();
        assert!(quote.is_mock_data);
        assert_eq!(quote.id, "ethereum");
        assert_eq!(quote.usd, 2487.32);
        assert!(fallback_quote("PEPE").is_none());
    }
}
