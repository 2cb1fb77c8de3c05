//! Next-day point estimates for BTC and ETH from engineered features.
//!
//! Per asset: fetch the 30-day window, engineer features, download the
//! asset's tabular model, predict on the latest row. Assets are processed one
//! after the other and any failure aborts the whole call. Failures are
//! returned as an `{"Error": ...}` payload, never as an `Err`.

use super::context::PipelineContext;
use crate::application::features::engineer_features;
use crate::application::ml::runtime::{self, ModelFamily, ModelInput};
use crate::domain::audit::{STATUS_FAILED, STATUS_OK};
use crate::domain::errors::PipelineError;
use crate::domain::market::{Asset, LookbackWindow};
use crate::domain::prediction::RegressionOutcome;
use chrono::{NaiveDate, Utc};
use std::time::Instant;
use tracing::{error, info};

pub const SYSTEM: &str = "regression";
pub const ACTION: &str = "predict";

pub struct RegressionPipeline {
    ctx: PipelineContext,
}

impl RegressionPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> RegressionOutcome {
        self.run_at(Utc::now().date_naive()).await
    }

    /// Runs the pipeline as if the current UTC date were `today`.
    pub async fn run_at(&self, today: NaiveDate) -> RegressionOutcome {
        info!("Starting regression prediction process for BTC and ETH.");
        let started = Instant::now();

        match self.estimate_all(today).await {
            Ok(estimates) => {
                info!("Regression prediction completed: {:?}", estimates);
                self.ctx
                    .metrics
                    .record_success(SYSTEM, started.elapsed().as_secs_f64());
                self.ctx.audit.log(SYSTEM, ACTION, STATUS_OK).await;
                RegressionOutcome::from_estimates(&estimates)
            }
            Err(e) => {
                error!("Error in regression prediction: {}", e);
                self.ctx
                    .metrics
                    .record_failure(SYSTEM, e.kind(), started.elapsed().as_secs_f64());
                self.ctx.audit.log(SYSTEM, ACTION, STATUS_FAILED).await;
                RegressionOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn estimate_all(&self, today: NaiveDate) -> Result<Vec<(Asset, f64)>, PipelineError> {
        let window = LookbackWindow::regression(today);
        let mut estimates = Vec::with_capacity(Asset::ALL.len());
        for asset in Asset::ALL {
            let estimate = self.estimate(asset, window).await?;
            estimates.push((asset, estimate));
        }
        Ok(estimates)
    }

    async fn estimate(&self, asset: Asset, window: LookbackWindow) -> Result<f64, PipelineError> {
        let series = self.ctx.fetch_series(asset, window).await?;
        let table = engineer_features(&series)?;

        let artifact = self
            .ctx
            .repository
            .fetch_artifact(self.ctx.models.regression(asset))
            .await?;
        let model = runtime::load(&artifact, ModelFamily::Tabular).await?;

        let estimate = model.predict(ModelInput::Features(&table))?.into_point()?;
        info!("{} prediction result: {}", asset, estimate);
        Ok(estimate)
    }
}
