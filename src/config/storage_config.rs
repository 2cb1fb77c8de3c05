//! Model storage and audit log store configuration.

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Backend holding the serialized models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Supabase,
    LocalDir,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supabase" => Ok(StorageBackend::Supabase),
            "local" | "local_dir" => Ok(StorageBackend::LocalDir),
            "memory" => Ok(StorageBackend::Memory),
            _ => anyhow::bail!(
                "Invalid MODEL_STORAGE: {}. Must be 'supabase', 'local_dir', or 'memory'",
                s
            ),
        }
    }
}

/// Backend of the audit log table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStoreKind {
    Sqlite,
    Supabase,
    Memory,
}

impl FromStr for LogStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(LogStoreKind::Sqlite),
            "supabase" => Ok(LogStoreKind::Supabase),
            "memory" => Ok(LogStoreKind::Memory),
            _ => anyhow::bail!(
                "Invalid LOG_STORE: {}. Must be 'sqlite', 'supabase', or 'memory'",
                s
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub local_dir: PathBuf,
    /// Parent of the per-invocation scratch directories; system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    pub regression_btc_path: String,
    pub regression_eth_path: String,
    pub sarima_btc_path: String,
    pub trend_seasonal_eth_path: String,
    pub log_store: LogStoreKind,
    pub database_url: String,
    pub supabase_url: String,
    pub supabase_key: String,
}

impl StorageEnvConfig {
    pub fn from_env() -> Result<Self> {
        let backend_str = env::var("MODEL_STORAGE").unwrap_or_else(|_| "local_dir".to_string());
        let log_store_str = env::var("LOG_STORE").unwrap_or_else(|_| "sqlite".to_string());

        let config = Self {
            backend: StorageBackend::from_str(&backend_str)?,
            bucket: env::var("MODEL_BUCKET").unwrap_or_else(|_| "models".to_string()),
            local_dir: env::var("MODEL_DIR")
                .unwrap_or_else(|_| "data/storage".to_string())
                .into(),
            scratch_dir: env::var("MODEL_SCRATCH_DIR").ok().map(PathBuf::from),
            regression_btc_path: env::var("REGRESSION_BTC_MODEL")
                .unwrap_or_else(|_| "regression/btc_br_model.json".to_string()),
            regression_eth_path: env::var("REGRESSION_ETH_MODEL")
                .unwrap_or_else(|_| "regression/eth_br_model.json".to_string()),
            sarima_btc_path: env::var("SARIMA_BTC_MODEL")
                .unwrap_or_else(|_| "time_series/btc_sarima_model.json".to_string()),
            trend_seasonal_eth_path: env::var("TREND_SEASONAL_ETH_MODEL")
                .unwrap_or_else(|_| "time_series/eth_prophet_model.json".to_string()),
            log_store: LogStoreKind::from_str(&log_store_str)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/farcry.db".to_string()),
            supabase_url: env::var("SUPABASE_URL").unwrap_or_default(),
            supabase_key: env::var("SUPABASE_KEY").unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn uses_supabase(&self) -> bool {
        self.backend == StorageBackend::Supabase || self.log_store == LogStoreKind::Supabase
    }

    fn validate(&self) -> Result<()> {
        if self.uses_supabase() && (self.supabase_url.is_empty() || self.supabase_key.is_empty()) {
            anyhow::bail!("SUPABASE_URL and SUPABASE_KEY are required when Supabase is selected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_aliases() {
        assert_eq!(StorageBackend::from_str("local").unwrap(), StorageBackend::LocalDir);
        assert_eq!(StorageBackend::from_str("LOCAL_DIR").unwrap(), StorageBackend::LocalDir);
        assert!(StorageBackend::from_str("s3").is_err());
        assert_eq!(LogStoreKind::from_str("Supabase").unwrap(), LogStoreKind::Supabase);
        assert!(LogStoreKind::from_str("postgres").is_err());
    }
}
