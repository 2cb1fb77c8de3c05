#![allow(dead_code)]

use chrono::NaiveDate;
use farcry::application::audit::AuditLogger;
use farcry::application::features::engineer_features;
use farcry::application::ml::ModelRepository;
use farcry::application::pipelines::{ModelCatalog, PipelineContext};
use farcry::domain::market::PriceSeries;
use farcry::infrastructure::mock::{
    InMemoryAuditLogStore, InMemoryObjectStorage, MockMarketDataService,
};
use farcry::infrastructure::observability::Metrics;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub const BUCKET: &str = "models";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fixed evaluation date so the mock feed is reproducible.
pub fn today() -> NaiveDate {
    date(2024, 6, 15)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Column names the battery produces, in order.
pub fn feature_names() -> Vec<String> {
    let bars = MockMarketDataService::random_walk("BTC-USD", date(2024, 1, 1), date(2024, 1, 30));
    let series = PriceSeries::new("BTC", bars).unwrap();
    engineer_features(&series).unwrap().column_names().to_vec()
}

/// Linear regressor returning `intercept` for any input.
pub fn constant_model(feature_names: &[String], intercept: f64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "feature_names": feature_names,
        "model": {
            "kind": "linear",
            "coefficients": vec![0.0; feature_names.len()],
            "intercept": intercept,
        }
    }))
    .unwrap()
}

/// Linear regressor weighting only the `Close` column.
pub fn close_weighted_model(feature_names: &[String], weight: f64) -> Vec<u8> {
    let coefficients: Vec<f64> = feature_names
        .iter()
        .map(|n| if n == "Close" { weight } else { 0.0 })
        .collect();
    serde_json::to_vec(&json!({
        "feature_names": feature_names,
        "model": {"kind": "linear", "coefficients": coefficients, "intercept": 0.0}
    }))
    .unwrap()
}

/// SARIMA(0,1,0): every forecast repeats the last observed log-close.
pub fn random_walk_sarima() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "order": [0, 1, 0],
        "seasonal_order": [0, 0, 0, 0],
        "constant": 0.0,
        "history": [8.0, 8.1],
    }))
    .unwrap()
}

/// Rising trend with a weekly cycle around 3000.
pub fn weekly_trend_seasonal() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "start": "2022-06-15",
        "t_scale": 730.0,
        "y_scale": 3000.0,
        "k": 0.2,
        "m": 1.0,
        "changepoints_t": [0.5],
        "deltas": [-0.1],
        "seasonalities": [{
            "name": "weekly",
            "period_days": 7.0,
            "fourier_order": 1,
            "coefficients": [0.01, -0.02]
        }]
    }))
    .unwrap()
}

/// Storage holding all four serving models under their default paths.
pub async fn seeded_storage() -> InMemoryObjectStorage {
    let storage = InMemoryObjectStorage::new();
    let catalog = ModelCatalog::in_bucket(BUCKET);
    let names = feature_names();

    storage
        .put(BUCKET, &catalog.regression_btc.path, constant_model(&names, 64_123.456))
        .await;
    storage
        .put(BUCKET, &catalog.regression_eth.path, constant_model(&names, 3_210.987))
        .await;
    storage
        .put(BUCKET, &catalog.sarima_btc.path, random_walk_sarima())
        .await;
    storage
        .put(BUCKET, &catalog.trend_seasonal_eth.path, weekly_trend_seasonal())
        .await;
    storage
}

pub fn context(
    market: MockMarketDataService,
    storage: InMemoryObjectStorage,
    audit: InMemoryAuditLogStore,
    scratch: &Path,
) -> PipelineContext {
    let metrics = Metrics::new().unwrap();
    PipelineContext {
        market_data: Arc::new(market),
        repository: ModelRepository::new(Arc::new(storage), scratch.to_path_buf()),
        audit: AuditLogger::new(Arc::new(audit)).with_metrics(metrics.clone()),
        metrics,
        models: ModelCatalog::in_bucket(BUCKET),
    }
}

/// Entries left in the scratch root once every artifact handle is dropped.
pub fn scratch_entries(scratch: &Path) -> usize {
    std::fs::read_dir(scratch).map(|d| d.count()).unwrap_or(0)
}
