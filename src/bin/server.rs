//! Farcry Server - prediction API
//!
//! Serves the regression and time-series pipelines over HTTP.
//!
//! # Usage
//! ```sh
//! MARKET_DATA_PROVIDER=yahoo MODEL_STORAGE=supabase cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `SERVER_HOST` / `SERVER_PORT` - Bind address (default: 0.0.0.0:8000)
//! - `MARKET_DATA_PROVIDER` - yahoo, binance, csv or mock (default: yahoo)
//! - `MODEL_STORAGE` - supabase, local_dir or memory (default: local_dir)
//! - `LOG_STORE` - sqlite, supabase or memory (default: sqlite)

use anyhow::{Context, Result};
use farcry::config::Config;
use farcry::infrastructure::ServiceFactory;
use farcry::infrastructure::observability::Metrics;
use farcry::interfaces::http;
use tokio::net::TcpListener;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received. Exiting...");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Farcry Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: MarketData={:?}, Models={:?}, Logs={:?}",
        config.market_data.provider, config.storage.backend, config.storage.log_store
    );

    let metrics = Metrics::new()?;
    let ctx = ServiceFactory::build_context(&config, metrics).await?;

    let bind_address = config.server.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    http::serve(listener, ctx, shutdown_signal()).await
}
