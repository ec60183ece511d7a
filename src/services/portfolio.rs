use std::sync::Arc;

use futures_util::future::join_all;

use crate::{
    constants::DEFAULT_TOKEN_DECIMALS,
    error::{AppError, Result},
    models::{EnrichedBalance, RawTokenBalance},
    providers::{PriceProvider, TokenDataProvider},
    utils::{format_units, parse_hex_u256, truncate_address, units_to_f64},
};

/// Joins raw balances with metadata and unit prices into the enriched
/// record set the dashboard renders. Per-token enrichment is
/// all-or-nothing: a token whose metadata cannot be fetched (or whose raw
/// balance does not parse) is dropped rather than emitted half-filled; a
/// missing price only zeroes the value. The operation as a whole fails
/// only when the initial balances fetch fails.
pub struct PortfolioService {
    tokens: Arc<dyn TokenDataProvider>,
    prices: Arc<dyn PriceProvider>,
}

fn is_zero_balance(raw: &str) -> bool {
    parse_hex_u256(raw).map(|v| v.is_zero()).unwrap_or(false)
}

impl PortfolioService {
    pub fn new(tokens: Arc<dyn TokenDataProvider>, prices: Arc<dyn PriceProvider>) -> Self {
        Self { tokens, prices }
    }

    /// Output order is whatever the concurrent resolution produced; callers
    /// wanting a stable order sort explicitly.
    pub async fn enriched_balances(
        &self,
        address: &str,
        chain_id: u64,
    ) -> Result<Vec<EnrichedBalance>> {
        let raw = self
            .tokens
            .token_balances(address, chain_id)
            .await
            .ok_or_else(|| AppError::ExternalApi("token balances fetch failed".to_string()))?;

        let held: Vec<RawTokenBalance> = raw
            .into_iter()
            .filter(|entry| !is_zero_balance(&entry.token_balance))
            .collect();

        let enriched = join_all(
            held.into_iter()
                .map(|entry| self.enrich_token(entry, chain_id)),
        )
        .await;

        Ok(enriched.into_iter().flatten().collect())
    }

    async fn enrich_token(
        &self,
        entry: RawTokenBalance,
        chain_id: u64,
    ) -> Option<EnrichedBalance> {
        let raw_amount = parse_hex_u256(&entry.token_balance)?;

        let (metadata, unit_price) = tokio::join!(
            self.tokens.token_metadata(&entry.contract_address, chain_id),
            self.prices.price_by_contract(&entry.contract_address, chain_id),
        );

        let metadata = match metadata {
            Some(metadata) => metadata,
            None => {
                tracing::debug!(
                    "dropping {}: metadata fetch failed",
                    entry.contract_address
                );
                return None;
            }
        };

        let decimals = metadata.decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS);
        let symbol = metadata
            .symbol
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| truncate_address(&entry.contract_address, 6, 4));
        let name = metadata
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| symbol.clone());

        let balance = units_to_f64(raw_amount, decimals);
        let unit_price_usd = unit_price.unwrap_or(0.0);

        Some(EnrichedBalance {
            contract_address: entry.contract_address,
            raw_balance: entry.token_balance,
            balance,
            formatted_balance: format_units(raw_amount, decimals),
            name,
            symbol,
            decimals,
            logo: metadata.logo,
            unit_price_usd,
            value_usd: balance * unit_price_usd,
        })
    }
}

/// Total USD value across an enriched set.
pub fn total_value_usd(balances: &[EnrichedBalance]) -> f64 {
    balances.iter().map(|b| b.value_usd).sum()
}
