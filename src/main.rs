use axum::http::HeaderValue;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod api;
mod config;
mod constants;
mod error;
mod models;
mod providers;
mod services;
mod utils;

use config::Config;
use constants::API_VERSION;
use services::log_filter::NoiseFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config first: the log noise filter is built from it.
    let config = Config::from_env()?;

    let noise_filter = NoiseFilter::new(config.suppressed_log_substrings());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web3os_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_filter(noise_filter))
        .init();

    config.validate()?;

    tracing::info!("Starting Web3 OS data backend");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    let state = api::AppState::new(config.clone())?;

    // Build router
    let app = build_router(state.clone());

    // Warmer handles own their polling tasks; keep them for the lifetime
    // of the server.
    let _warmers = services::start_background_services(&state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Key-hiding proxy routes consumed by the browser
        .route("/api/coingecko/prices", get(api::prices::get_prices))
        .route("/api/gas/ethereum", get(api::gas::get_ethereum_gas))
        // Dashboard data
        .route("/api/v1/portfolio/tokens", get(api::portfolio::get_tokens))
        .route("/api/v1/portfolio/nfts", get(api::portfolio::get_nfts))
        .route(
            "/api/v1/portfolio/transfers",
            get(api::portfolio::get_transfers),
        )
        .route("/api/v1/gas/quote", get(api::portfolio::get_gas_quote))
        .route("/api/v1/prices/quote", get(api::portfolio::get_price_quote))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
