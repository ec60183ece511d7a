// All service modules
pub mod feeds;
pub mod gas;
pub mod log_filter;
pub mod portfolio;

pub use feeds::{CancelToken, Dataset, FeedKey, PollingFeed, SwrCache};
pub use portfolio::PortfolioService;

use crate::api::AppState;
use crate::constants::FALLBACK_PRICE_IDS;

/// Cache key for a simple-price query; the joined id list plus currency
/// plays the role the wallet address plays for address-keyed datasets.
pub fn price_feed_key(ids: &[String], vs_currency: &str) -> FeedKey {
    FeedKey::new(
        Dataset::Prices,
        Some(&format!("{}|{}", ids.join(","), vs_currency)),
        0,
    )
}

/// Start the background feed warmers. The returned handles own the polling
/// tasks; dropping them tears the timers down.
pub fn start_background_services(state: &AppState) -> Vec<PollingFeed> {
    tracing::info!("Starting background feed warmers...");
    let mut warmers = Vec::new();

    // Gas quote for the default chain, kept warm for the quote route.
    let chain_id = state.config.default_chain_id;
    let tokens = state.tokens.clone();
    warmers.push(PollingFeed::spawn(
        state.gas_cache.clone(),
        FeedKey::new(Dataset::Gas, None, chain_id),
        Dataset::Gas.poll_interval(),
        move || {
            let tokens = tokens.clone();
            async move {
                let wei_hex = tokens.gas_price(chain_id).await?;
                gas::quote_from_wei_hex(&wei_hex)
            }
        },
    ));

    // Headline assets the prices proxy serves most often.
    let ids: Vec<String> = FALLBACK_PRICE_IDS.iter().map(|id| id.to_string()).collect();
    let prices = state.prices.clone();
    warmers.push(PollingFeed::spawn(
        state.price_cache.clone(),
        price_feed_key(&ids, "usd"),
        Dataset::Prices.poll_interval(),
        move || {
            let prices = prices.clone();
            let ids = ids.clone();
            async move { prices.simple_prices(&ids, "usd").await }
        },
    ));

    warmers
}
