//! 90-day forecasts: SARIMA on BTC log-closes, trend/seasonal model on ETH.
//!
//! Unlike the regression pipeline, failures propagate to the caller.

use super::context::PipelineContext;
use crate::application::ml::runtime::{self, ModelFamily, ModelInput};
use crate::domain::audit::{STATUS_FAILED, STATUS_OK};
use crate::domain::errors::PipelineError;
use crate::domain::market::{Asset, LookbackWindow, PriceSeries};
use crate::domain::prediction::{SeriesPair, TimeSeriesPrediction};
use chrono::{Days, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info};

pub const SYSTEM: &str = "time_series";
pub const ACTION: &str = "forecast";

/// Days forecast past the last observed bar.
pub const FORECAST_HORIZON: usize = 90;

/// `steps` consecutive daily dates starting the day after `last`.
pub fn forecast_dates(last: NaiveDate, steps: usize) -> Vec<NaiveDate> {
    (1..=steps as u64).map(|i| last + Days::new(i)).collect()
}

fn zero_filled(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values
        .into_iter()
        .map(|v| if v.is_finite() { v } else { 0.0 })
        .collect()
}

fn historical_closes(series: &PriceSeries) -> BTreeMap<NaiveDate, f64> {
    series.bars().iter().map(|b| (b.date, b.close)).collect()
}

fn dated(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<BTreeMap<NaiveDate, f64>, PipelineError> {
    if dates.len() != values.len() {
        return Err(PipelineError::prediction(format!(
            "model returned {} values for {} dates",
            values.len(),
            dates.len()
        )));
    }
    Ok(dates.into_iter().zip(values).collect())
}

pub struct TimeSeriesPipeline {
    ctx: PipelineContext,
}

impl TimeSeriesPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> Result<TimeSeriesPrediction, PipelineError> {
        self.run_at(Utc::now().date_naive()).await
    }

    /// Runs the pipeline as if the current UTC date were `today`.
    pub async fn run_at(&self, today: NaiveDate) -> Result<TimeSeriesPrediction, PipelineError> {
        info!("Starting time-series forecast for BTC and ETH.");
        let started = Instant::now();
        let result = self.forecast_all(today).await;

        match &result {
            Ok(_) => {
                self.ctx
                    .metrics
                    .record_success(SYSTEM, started.elapsed().as_secs_f64());
                self.ctx.audit.log(SYSTEM, ACTION, STATUS_OK).await;
            }
            Err(e) => {
                error!("Error in time-series forecast: {}", e);
                self.ctx
                    .metrics
                    .record_failure(SYSTEM, e.kind(), started.elapsed().as_secs_f64());
                self.ctx.audit.log(SYSTEM, ACTION, STATUS_FAILED).await;
            }
        }
        result
    }

    async fn forecast_all(&self, today: NaiveDate) -> Result<TimeSeriesPrediction, PipelineError> {
        let window = LookbackWindow::time_series(today);
        let mut prediction = TimeSeriesPrediction::default();
        prediction.insert(Asset::Btc, self.forecast_btc(window).await?);
        prediction.insert(Asset::Eth, self.forecast_eth(window).await?);
        Ok(prediction)
    }

    async fn forecast_btc(&self, window: LookbackWindow) -> Result<SeriesPair, PipelineError> {
        let series = self.ctx.fetch_series(Asset::Btc, window).await?;
        let log_close = series.log_closes();

        let artifact = self
            .ctx
            .repository
            .fetch_artifact(&self.ctx.models.sarima_btc)
            .await?;
        let model = runtime::load(&artifact, ModelFamily::Sarima).await?;

        let log_forecast = model
            .predict(ModelInput::Continuation {
                history: &log_close,
                steps: FORECAST_HORIZON,
            })?
            .into_series()?;
        let values = zero_filled(log_forecast.into_iter().map(f64::exp));

        info!("BTC: forecast {} days past {}", values.len(), series.last_date());
        Ok(SeriesPair {
            historical: historical_closes(&series),
            forecast: dated(forecast_dates(series.last_date(), FORECAST_HORIZON), values)?,
        })
    }

    async fn forecast_eth(&self, window: LookbackWindow) -> Result<SeriesPair, PipelineError> {
        let series = self.ctx.fetch_series(Asset::Eth, window).await?;

        let artifact = self
            .ctx
            .repository
            .fetch_artifact(&self.ctx.models.trend_seasonal_eth)
            .await?;
        let model = runtime::load(&artifact, ModelFamily::TrendSeasonal).await?;

        let dates = forecast_dates(series.last_date(), FORECAST_HORIZON);
        let values = zero_filled(model.predict(ModelInput::Dates(&dates))?.into_series()?);

        info!("ETH: forecast {} days past {}", values.len(), series.last_date());
        Ok(SeriesPair {
            historical: historical_closes(&series),
            forecast: dated(dates, values)?,
        })
    }
}
