// External data providers. Each function is a single-attempt request
// wrapper: no retries, no backoff, and no error ever crosses the boundary.
// Failures are logged and collapse to `None`; retry policy belongs to the
// feed cache layer, not here.

pub mod alchemy;
pub mod coingecko;
pub mod etherscan;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::{
    AssetTransfer, GasOracleReading, NftRecord, PricePoint, PriceQuote, RawTokenBalance,
    TokenMetadata,
};

/// Balance / metadata / gas / NFT source (Alchemy in production).
#[async_trait]
pub trait TokenDataProvider: Send + Sync {
    /// All ERC-20 balances for a wallet, raw hex amounts included.
    async fn token_balances(&self, address: &str, chain_id: u64) -> Option<Vec<RawTokenBalance>>;

    /// Name/symbol/decimals/logo for a token contract.
    async fn token_metadata(&self, contract: &str, chain_id: u64) -> Option<TokenMetadata>;

    /// Current gas price as a wei-scale hex string.
    async fn gas_price(&self, chain_id: u64) -> Option<String>;

    /// Recent transfers touching the wallet.
    async fn asset_transfers(&self, address: &str, chain_id: u64) -> Option<Vec<AssetTransfer>>;

    /// NFTs owned by the wallet.
    async fn owned_nfts(&self, address: &str, chain_id: u64) -> Option<Vec<NftRecord>>;
}

/// USD price source (CoinGecko in production).
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Simple-price map for a set of provider ids.
    async fn simple_prices(
        &self,
        ids: &[String],
        vs_currency: &str,
    ) -> Option<HashMap<String, PricePoint>>;

    /// Quote for one symbol; `is_mock_data` must be false on this path.
    async fn quote_by_symbol(&self, symbol: &str) -> Option<PriceQuote>;

    /// Unit USD price for a token contract on a chain.
    async fn price_by_contract(&self, contract: &str, chain_id: u64) -> Option<f64>;
}

/// Gas-oracle source for the key-holding proxy route (Etherscan in
/// production). Split from `TokenDataProvider` because it is the only
/// upstream whose key is optional by design.
#[async_trait]
pub trait GasOracleProvider: Send + Sync {
    async fn gas_oracle(&self) -> Option<GasOracleReading>;
}
