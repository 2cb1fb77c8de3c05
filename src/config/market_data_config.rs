//! Market data provider configuration.

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Where daily bars come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketDataProvider {
    Yahoo,
    Binance,
    Csv,
    Mock,
}

impl FromStr for MarketDataProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yahoo" => Ok(MarketDataProvider::Yahoo),
            "binance" => Ok(MarketDataProvider::Binance),
            "csv" => Ok(MarketDataProvider::Csv),
            "mock" => Ok(MarketDataProvider::Mock),
            _ => anyhow::bail!(
                "Invalid MARKET_DATA_PROVIDER: {}. Must be 'yahoo', 'binance', 'csv', or 'mock'",
                s
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketDataEnvConfig {
    pub provider: MarketDataProvider,
    pub yahoo_base_url: String,
    pub binance_base_url: String,
    pub csv_dir: PathBuf,
}

impl MarketDataEnvConfig {
    pub fn from_env() -> Result<Self> {
        let provider_str =
            env::var("MARKET_DATA_PROVIDER").unwrap_or_else(|_| "yahoo".to_string());

        Ok(Self {
            provider: MarketDataProvider::from_str(&provider_str)?,
            yahoo_base_url: env::var("YAHOO_BASE_URL")
                .unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string()),
            binance_base_url: env::var("BINANCE_BASE_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            csv_dir: env::var("MARKET_DATA_CSV_DIR")
                .unwrap_or_else(|_| "data/prices".to_string())
                .into(),
        })
    }
}
