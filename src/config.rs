use serde::Deserialize;
use std::env;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Upstream API keys (server-side only; never returned to the browser)
    pub alchemy_api_key: String,
    pub etherscan_api_key: Option<String>,
    pub coingecko_api_key: Option<String>,

    // Upstream base URLs (overridable for staging / tests)
    pub coingecko_base_url: String,
    pub etherscan_base_url: String,

    // Default chain served when a request carries no chain_id
    pub default_chain_id: u64,

    // Logging noise suppression, comma-separated substrings
    pub log_suppress_substrings: Option<String>,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            alchemy_api_key: env::var("ALCHEMY_API_KEY")
                .unwrap_or_else(|_| "demo".to_string()),
            etherscan_api_key: env::var("ETHERSCAN_API_KEY").ok(),
            coingecko_api_key: env::var("COINGECKO_API_KEY").ok(),

            coingecko_base_url: env::var("COINGECKO_BASE_URL")
                .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string()),
            etherscan_base_url: env::var("ETHERSCAN_BASE_URL")
                .unwrap_or_else(|_| "https://api.etherscan.io/api".to_string()),

            default_chain_id: env::var("DEFAULT_CHAIN_ID")
                .unwrap_or_else(|_| "1".to_string())
                .parse()?,

            log_suppress_substrings: env::var("LOG_SUPPRESS_SUBSTRINGS").ok(),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.alchemy_api_key.trim().is_empty() {
            anyhow::bail!("ALCHEMY_API_KEY is empty");
        }
        if Url::parse(&self.coingecko_base_url).is_err() {
            anyhow::bail!("COINGECKO_BASE_URL is not a valid URL");
        }
        if Url::parse(&self.etherscan_base_url).is_err() {
            anyhow::bail!("ETHERSCAN_BASE_URL is not a valid URL");
        }

        if self.alchemy_api_key == "demo" {
            tracing::warn!("Using the shared demo Alchemy key; expect rate limits");
        }
        if self.etherscan_api_key.is_none() {
            tracing::warn!("ETHERSCAN_API_KEY missing; gas proxy will serve fallback values");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    /// Substrings the log noise filter should suppress, env override first.
    pub fn suppressed_log_substrings(&self) -> Vec<String> {
        match self.log_suppress_substrings.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => crate::services::log_filter::DEFAULT_NOISE_SUBSTRINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 3000,
            environment: "test".into(),
            alchemy_api_key: "test-key".into(),
            etherscan_api_key: None,
            coingecko_api_key: None,
            coingecko_base_url: "https://api.coingecko.com/api/v3".into(),
            etherscan_base_url: "https://api.etherscan.io/api".into(),
            default_chain_id: 1,
            log_suppress_substrings: None,
            cors_allowed_origins: "*".into(),
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = test_config();
        config.coingecko_base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn suppression_list_prefers_env_override() {
        let mut config = test_config();
        config.log_suppress_substrings = Some("foo, bar".into());
        assert_eq!(config.suppressed_log_substrings(), vec!["foo", "bar"]);
    }
}
