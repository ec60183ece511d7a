// src/api/mod.rs

pub mod gas;
pub mod health;
pub mod portfolio;
pub mod prices;

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    config::Config,
    error::{AppError, Result},
    models::{AssetTransfer, EnrichedBalance, GasQuote, NftRecord, PricePoint},
    providers::{
        alchemy::AlchemyProvider, coingecko::CoingeckoProvider, etherscan::EtherscanProvider,
        GasOracleProvider, PriceProvider, TokenDataProvider,
    },
    services::{Dataset, PortfolioService, SwrCache},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tokens: Arc<dyn TokenDataProvider>,
    pub prices: Arc<dyn PriceProvider>,
    pub gas_oracle: Arc<dyn GasOracleProvider>,
    pub portfolio: Arc<PortfolioService>,
    pub balance_cache: Arc<SwrCache<Vec<EnrichedBalance>>>,
    pub nft_cache: Arc<SwrCache<Vec<NftRecord>>>,
    pub transfer_cache: Arc<SwrCache<Vec<AssetTransfer>>>,
    pub gas_cache: Arc<SwrCache<GasQuote>>,
    pub price_cache: Arc<SwrCache<HashMap<String, PricePoint>>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let tokens: Arc<dyn TokenDataProvider> = Arc::new(AlchemyProvider::new(&config)?);
        let prices: Arc<dyn PriceProvider> = Arc::new(CoingeckoProvider::new(&config)?);
        let gas_oracle: Arc<dyn GasOracleProvider> = Arc::new(EtherscanProvider::new(&config)?);
        let portfolio = Arc::new(PortfolioService::new(tokens.clone(), prices.clone()));

        Ok(Self {
            config,
            tokens,
            prices,
            gas_oracle,
            portfolio,
            balance_cache: Arc::new(SwrCache::for_dataset(Dataset::Balances)),
            nft_cache: Arc::new(SwrCache::for_dataset(Dataset::Nfts)),
            transfer_cache: Arc::new(SwrCache::for_dataset(Dataset::Transfers)),
            gas_cache: Arc::new(SwrCache::for_dataset(Dataset::Gas)),
            price_cache: Arc::new(SwrCache::for_dataset(Dataset::Prices)),
        })
    }
}

/// Address-keyed routes reject blank addresses up front; no network call
/// is ever made for an absent key.
pub fn require_address(address: Option<&str>) -> Result<String> {
    address
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("address query parameter is required".to_string()))
}

pub fn chain_or_default(chain_id: Option<u64>, config: &Config) -> u64 {
    chain_id.unwrap_or(config.default_chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_address_rejects_blank_values() {
        assert!(require_address(None).is_err());
        assert!(require_address(Some("  ")).is_err());
        assert_eq!(require_address(Some(" 0xabc ")).unwrap(), "0xabc");
    }
}
