use crate::application::audit::AuditLogger;
use crate::application::ml::{ArtifactLocation, ModelRepository};
use crate::application::pipelines::{ModelCatalog, PipelineContext};
use crate::config::{
    Config, LogStoreKind, MarketDataEnvConfig, MarketDataProvider, StorageBackend,
    StorageEnvConfig,
};
use crate::domain::ports::{AuditLogStore, MarketDataService, ObjectStorage};
use crate::infrastructure::market_data::{
    BinanceMarketDataService, CsvMarketDataService, YahooMarketDataService,
};
use crate::infrastructure::mock::{
    InMemoryAuditLogStore, InMemoryObjectStorage, MockMarketDataService,
};
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::persistence::{Database, SqliteAuditLogStore};
use crate::infrastructure::storage::{LocalDirObjectStorage, SupabaseClient, SupabaseObjectStorage};
use crate::infrastructure::supabase_logs::SupabaseAuditLogStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ServiceFactory;

impl ServiceFactory {
    pub fn create_market_data(config: &MarketDataEnvConfig) -> Arc<dyn MarketDataService> {
        match config.provider {
            MarketDataProvider::Yahoo => {
                Arc::new(YahooMarketDataService::new(config.yahoo_base_url.clone()))
            }
            MarketDataProvider::Binance => {
                Arc::new(BinanceMarketDataService::new(config.binance_base_url.clone()))
            }
            MarketDataProvider::Csv => Arc::new(CsvMarketDataService::new(config.csv_dir.clone())),
            MarketDataProvider::Mock => Arc::new(MockMarketDataService::new()),
        }
    }

    fn supabase_client(config: &StorageEnvConfig) -> SupabaseClient {
        SupabaseClient::new(config.supabase_url.clone(), config.supabase_key.clone())
    }

    pub fn create_object_storage(config: &StorageEnvConfig) -> Arc<dyn ObjectStorage> {
        match config.backend {
            StorageBackend::Supabase => {
                Arc::new(SupabaseObjectStorage::new(Self::supabase_client(config)))
            }
            StorageBackend::LocalDir => Arc::new(LocalDirObjectStorage::new(config.local_dir.clone())),
            StorageBackend::Memory => {
                warn!("In-memory model storage is empty; every model fetch will fail");
                Arc::new(InMemoryObjectStorage::new())
            }
        }
    }

    pub async fn create_audit_store(config: &StorageEnvConfig) -> Result<Arc<dyn AuditLogStore>> {
        Ok(match config.log_store {
            LogStoreKind::Sqlite => {
                let db = Database::new(&config.database_url).await?;
                Arc::new(SqliteAuditLogStore::new(db.pool))
            }
            LogStoreKind::Supabase => Arc::new(SupabaseAuditLogStore::new(Self::supabase_client(config))),
            LogStoreKind::Memory => Arc::new(InMemoryAuditLogStore::new()),
        })
    }

    pub fn create_model_catalog(config: &StorageEnvConfig) -> ModelCatalog {
        let bucket = config.bucket.as_str();
        ModelCatalog {
            regression_btc: ArtifactLocation::new(bucket, config.regression_btc_path.clone()),
            regression_eth: ArtifactLocation::new(bucket, config.regression_eth_path.clone()),
            sarima_btc: ArtifactLocation::new(bucket, config.sarima_btc_path.clone()),
            trend_seasonal_eth: ArtifactLocation::new(
                bucket,
                config.trend_seasonal_eth_path.clone(),
            ),
        }
    }

    /// Wires every service the pipelines need from `config`.
    pub async fn build_context(config: &Config, metrics: Metrics) -> Result<PipelineContext> {
        let market_data = Self::create_market_data(&config.market_data);
        let storage = Self::create_object_storage(&config.storage);
        let repository = match &config.storage.scratch_dir {
            Some(dir) => ModelRepository::new(storage, dir.clone()),
            None => ModelRepository::with_default_scratch(storage),
        };
        let audit = AuditLogger::new(Self::create_audit_store(&config.storage).await?)
            .with_metrics(metrics.clone());

        info!(
            "Services ready: market data={:?}, models={:?} (bucket '{}'), logs={:?}",
            config.market_data.provider,
            config.storage.backend,
            config.storage.bucket,
            config.storage.log_store
        );

        Ok(PipelineContext {
            market_data,
            repository,
            audit,
            metrics,
            models: Self::create_model_catalog(&config.storage),
        })
    }
}
