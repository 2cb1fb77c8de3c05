//! Configuration for Farcry.
//!
//! Loaded from environment variables (after `.env` via dotenvy), grouped by
//! concern: market data, model/log storage and the HTTP server.

mod market_data_config;
mod server_config;
mod storage_config;

pub use market_data_config::{MarketDataEnvConfig, MarketDataProvider};
pub use server_config::ServerEnvConfig;
pub use storage_config::{LogStoreKind, StorageBackend, StorageEnvConfig};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub market_data: MarketDataEnvConfig,
    pub storage: StorageEnvConfig,
    pub server: ServerEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let market_data =
            MarketDataEnvConfig::from_env().context("Invalid market data configuration")?;
        let storage = StorageEnvConfig::from_env().context("Invalid storage configuration")?;
        let server = ServerEnvConfig::from_env();

        Ok(Self {
            market_data,
            storage,
            server,
        })
    }
}
