use crate::application::audit::AuditLogger;
use crate::application::ml::{ArtifactLocation, ModelRepository};
use crate::domain::errors::PipelineError;
use crate::domain::market::{Asset, Interval, LookbackWindow, PriceSeries};
use crate::domain::ports::MarketDataService;
use crate::infrastructure::observability::Metrics;
use std::sync::Arc;
use tracing::info;

/// Storage locations of the serving models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    pub regression_btc: ArtifactLocation,
    pub regression_eth: ArtifactLocation,
    pub sarima_btc: ArtifactLocation,
    pub trend_seasonal_eth: ArtifactLocation,
}

impl ModelCatalog {
    /// Default artifact paths inside `bucket`.
    pub fn in_bucket(bucket: &str) -> Self {
        Self {
            regression_btc: ArtifactLocation::new(bucket, "regression/btc_br_model.json"),
            regression_eth: ArtifactLocation::new(bucket, "regression/eth_br_model.json"),
            sarima_btc: ArtifactLocation::new(bucket, "time_series/btc_sarima_model.json"),
            trend_seasonal_eth: ArtifactLocation::new(bucket, "time_series/eth_prophet_model.json"),
        }
    }

    pub fn regression(&self, asset: Asset) -> &ArtifactLocation {
        match asset {
            Asset::Btc => &self.regression_btc,
            Asset::Eth => &self.regression_eth,
        }
    }
}

/// Shared services handed to both pipelines.
///
/// Holds no per-request state: data and models are fetched on every call.
#[derive(Clone)]
pub struct PipelineContext {
    pub market_data: Arc<dyn MarketDataService>,
    pub repository: ModelRepository,
    pub audit: AuditLogger,
    pub metrics: Metrics,
    pub models: ModelCatalog,
}

impl PipelineContext {
    /// Daily bars of `asset` over `window`.
    pub async fn fetch_series(
        &self,
        asset: Asset,
        window: LookbackWindow,
    ) -> Result<PriceSeries, PipelineError> {
        let symbol = self.market_data.symbol_for(asset);
        info!(
            "Fetching {} data from {} to {} via {}",
            asset,
            window.start,
            window.end,
            self.market_data.name()
        );

        let bars = self
            .market_data
            .get_historical_bars(&symbol, window.start, window.end, Interval::Daily)
            .await
            .map_err(|e| PipelineError::data_unavailable(asset.label(), format!("{:#}", e)))?;

        let series = PriceSeries::new(asset.label(), bars)?;
        info!(
            "Successfully fetched {} {} data ({} to {})",
            series.len(),
            asset,
            series.first_date(),
            series.last_date()
        );
        Ok(series)
    }
}
