/// Application constants

// API version
pub const API_VERSION: &str = "v1";

// Dataset poll intervals (seconds)
pub const GAS_POLL_INTERVAL_SECS: u64 = 15;
pub const PRICES_POLL_INTERVAL_SECS: u64 = 60;
pub const BALANCES_POLL_INTERVAL_SECS: u64 = 30;
pub const NFTS_POLL_INTERVAL_SECS: u64 = 60;

// Stale window: how long a last-known-good value may still be served
// after its TTL expired when a refresh keeps failing.
pub const FEED_STALE_WINDOW_SECS: u64 = 300;

// Hard cap on resident cache slots per feed cache. The address-keyed
// routes are unauthenticated, so arbitrary callers can mint keys; past
// the cap, slots outside the stale window are pruned on the next commit.
pub const FEED_CACHE_MAX_ENTRIES: usize = 50_000;

// Outbound request timeouts (seconds)
pub const PROVIDER_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const PROXY_UPSTREAM_TIMEOUT_SECS: u64 = 5;

// Fallback decimals when token metadata omits the field.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

// Chain ids
pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_OPTIMISM: u64 = 10;
pub const CHAIN_POLYGON: u64 = 137;
pub const CHAIN_BASE: u64 = 8453;
pub const CHAIN_ARBITRUM: u64 = 42161;

/// Alchemy JSON-RPC base URL for a chain. Unknown chain ids resolve to the
/// Ethereum mainnet endpoint rather than erroring.
pub fn alchemy_rpc_base(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_OPTIMISM => "https://opt-mainnet.g.alchemy.com/v2",
        CHAIN_POLYGON => "https://polygon-mainnet.g.alchemy.com/v2",
        CHAIN_BASE => "https://base-mainnet.g.alchemy.com/v2",
        CHAIN_ARBITRUM => "https://arb-mainnet.g.alchemy.com/v2",
        _ => "https://eth-mainnet.g.alchemy.com/v2",
    }
}

/// Alchemy NFT REST base URL for a chain, same mainnet fallback.
pub fn alchemy_nft_base(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_OPTIMISM => "https://opt-mainnet.g.alchemy.com/nft/v3",
        CHAIN_POLYGON => "https://polygon-mainnet.g.alchemy.com/nft/v3",
        CHAIN_BASE => "https://base-mainnet.g.alchemy.com/nft/v3",
        CHAIN_ARBITRUM => "https://arb-mainnet.g.alchemy.com/nft/v3",
        _ => "https://eth-mainnet.g.alchemy.com/nft/v3",
    }
}

/// CoinGecko asset-platform slug used for contract-address price lookups.
pub fn coingecko_platform(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_OPTIMISM => "optimistic-ethereum",
        CHAIN_POLYGON => "polygon-pos",
        CHAIN_BASE => "base",
        CHAIN_ARBITRUM => "arbitrum-one",
        _ => "ethereum",
    }
}

/// Static symbol -> CoinGecko id table. Symbols not listed here fall back
/// to their lower-cased form as a best-effort id; callers log that case.
pub fn coingecko_id_for(symbol: &str) -> Option<&'static str> {
    match symbol.to_ascii_uppercase().as_str() {
        "ETH" | "WETH" => Some("ethereum"),
        "BTC" | "WBTC" => Some("bitcoin"),
        "USDC" => Some("usd-coin"),
        "USDT" => Some("tether"),
        "DAI" => Some("dai"),
        "MATIC" | "POL" => Some("matic-network"),
        "ARB" => Some("arbitrum"),
        "OP" => Some("optimism"),
        "LINK" => Some("chainlink"),
        "UNI" => Some("uniswap"),
        "AAVE" => Some("aave"),
        "SHIB" => Some("shiba-inu"),
        _ => None,
    }
}

// Literal fallback quotes served when the price upstream is unreachable.
// The proxy marks these with degraded=true; the direct quote path marks
// them with is_mock_data=true.
pub const FALLBACK_PRICE_IDS: [&str; 3] = ["ethereum", "bitcoin", "usd-coin"];

pub fn fallback_price_point(id: &str) -> Option<(f64, f64, f64, f64)> {
    // (usd, usd_24h_change, usd_market_cap, usd_24h_vol)
    match id {
        "ethereum" => Some((2487.32, 2.34, 299_120_000_000.0, 14_230_000_000.0)),
        "bitcoin" => Some((43_521.87, 1.12, 851_440_000_000.0, 22_910_000_000.0)),
        "usd-coin" => Some((1.0, 0.01, 32_870_000_000.0, 5_120_000_000.0)),
        _ => None,
    }
}

// Literal gas-oracle fallback, decimal-string gwei.
pub const FALLBACK_GAS_SAFE: &str = "18";
pub const FALLBACK_GAS_PROPOSE: &str = "23";
pub const FALLBACK_GAS_FAST: &str = "28";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_chain_falls_back_to_mainnet() {
        assert_eq!(alchemy_rpc_base(999_999), alchemy_rpc_base(CHAIN_ETHEREUM));
        assert_eq!(coingecko_platform(999_999), "ethereum");
    }

    #[test]
    fn symbol_table_is_case_insensitive() {
        assert_eq!(coingecko_id_for("eth"), Some("ethereum"));
        assert_eq!(coingecko_id_for("Usdc"), Some("usd-coin"));
        assert_eq!(coingecko_id_for("PEPE"), None);
    }

    #[test]
    fn fallback_table_covers_exactly_the_documented_ids() {
        for id in FALLBACK_PRICE_IDS {
            assert!(fallback_price_point(id).is_some());
        }
        assert!(fallback_price_point("solana").is_none());
        assert_eq!(fallback_price_point("ethereum").unwrap().0, 2487.32);
    }
}
