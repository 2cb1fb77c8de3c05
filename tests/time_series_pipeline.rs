mod common;

use chrono::Days;
use common::*;
use farcry::application::pipelines::{ModelCatalog, TimeSeriesPipeline};
use farcry::domain::audit::{STATUS_FAILED, STATUS_OK};
use farcry::domain::errors::PipelineError;
use farcry::domain::market::{Asset, LookbackWindow};
use farcry::domain::prediction::TimeSeriesPrediction;
use farcry::infrastructure::mock::{
    InMemoryAuditLogStore, InMemoryObjectStorage, MockMarketDataService,
};

#[tokio::test]
async fn test_forecasts_ninety_consecutive_days_per_asset() {
    init_tracing();
    let scratch = tempfile::tempdir().unwrap();
    let audit = InMemoryAuditLogStore::new();
    let ctx = context(
        MockMarketDataService::new(),
        seeded_storage().await,
        audit.clone(),
        scratch.path(),
    );

    let prediction = TimeSeriesPipeline::new(ctx).run_at(today()).await.unwrap();

    for asset in Asset::ALL {
        let pair = prediction.get(asset).unwrap();
        let last_historical = *pair.historical.keys().last().unwrap();
        let dates: Vec<_> = pair.forecast.keys().copied().collect();

        assert_eq!(dates.len(), 90);
        assert_eq!(dates[0], last_historical + Days::new(1));
        assert!(dates.windows(2).all(|w| (w[1] - w[0]).num_days() == 1));
        assert!(pair.forecast.values().all(|v| v.is_finite() && *v >= 0.0));
    }

    let entries = audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].system, "time_series");
    assert_eq!(entries[0].action, "forecast");
    assert_eq!(entries[0].code, STATUS_OK);
    assert_eq!(scratch_entries(scratch.path()), 0);
}

#[tokio::test]
async fn test_btc_forecast_continues_fetched_series() {
    let scratch = tempfile::tempdir().unwrap();
    let ctx = context(
        MockMarketDataService::new(),
        seeded_storage().await,
        InMemoryAuditLogStore::new(),
        scratch.path(),
    );

    let prediction = TimeSeriesPipeline::new(ctx).run_at(today()).await.unwrap();
    let btc = prediction.get(Asset::Btc).unwrap();

    let window = LookbackWindow::time_series(today());
    let bars = MockMarketDataService::random_walk("BTC-USD", window.start, window.end);
    let last_close = bars.last().unwrap().close;

    assert_eq!(btc.historical.len(), bars.len());
    // A random-walk SARIMA repeats the last observed close
    assert!(btc
        .forecast
        .values()
        .all(|v| (v - last_close).abs() < 1e-6 * last_close));
}

#[tokio::test]
async fn test_result_round_trips_through_json() {
    let scratch = tempfile::tempdir().unwrap();
    let ctx = context(
        MockMarketDataService::new(),
        seeded_storage().await,
        InMemoryAuditLogStore::new(),
        scratch.path(),
    );

    let prediction = TimeSeriesPipeline::new(ctx).run_at(today()).await.unwrap();
    let text = serde_json::to_string(&prediction).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    let expected_rows = LookbackWindow::time_series(today()).days() as usize;
    for label in ["BTC", "ETH"] {
        assert_eq!(value[label]["forecast"].as_object().unwrap().len(), 90);
        assert_eq!(
            value[label]["historical"].as_object().unwrap().len(),
            expected_rows
        );
    }
    assert!(value["BTC"]["forecast"].get("2024-06-16").is_some());

    let back: TimeSeriesPrediction = serde_json::from_str(&text).unwrap();
    assert_eq!(back, prediction);
}

#[tokio::test]
async fn test_failure_propagates_and_logs_once() {
    let scratch = tempfile::tempdir().unwrap();
    let audit = InMemoryAuditLogStore::new();
    let market = MockMarketDataService::new().without_symbol("ETH-USD");
    let ctx = context(market, seeded_storage().await, audit.clone(), scratch.path());

    let err = TimeSeriesPipeline::new(ctx).run_at(today()).await.unwrap_err();

    assert!(matches!(err, PipelineError::DataUnavailable { ref symbol, .. } if symbol == "ETH"));
    let entries = audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].code, STATUS_FAILED);
}

#[tokio::test]
async fn test_corrupt_sarima_artifact_is_model_load_error() {
    let scratch = tempfile::tempdir().unwrap();
    let storage = seeded_storage().await;
    let catalog = ModelCatalog::in_bucket(BUCKET);
    storage
        .put(BUCKET, &catalog.sarima_btc.path, b"not a model".to_vec())
        .await;
    let ctx = context(
        MockMarketDataService::new(),
        storage,
        InMemoryAuditLogStore::new(),
        scratch.path(),
    );

    let err = TimeSeriesPipeline::new(ctx).run_at(today()).await.unwrap_err();

    assert_eq!(err.kind(), "model_load");
    assert_eq!(scratch_entries(scratch.path()), 0);
}

#[tokio::test]
async fn test_missing_storage_is_artifact_error() {
    let scratch = tempfile::tempdir().unwrap();
    let ctx = context(
        MockMarketDataService::new(),
        InMemoryObjectStorage::new(),
        InMemoryAuditLogStore::new(),
        scratch.path(),
    );

    let err = TimeSeriesPipeline::new(ctx).run_at(today()).await.unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactUnavailable { .. }));
}
