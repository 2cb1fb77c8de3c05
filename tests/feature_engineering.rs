mod common;

use common::date;
use farcry::application::features::{BASE_COLUMNS, DROPPED_COLUMNS, engineer_features};
use farcry::domain::errors::PipelineError;
use farcry::domain::market::{PriceBar, PriceSeries};
use farcry::infrastructure::mock::MockMarketDataService;

fn mock_series(days: u64) -> PriceSeries {
    let start = date(2024, 3, 1);
    let end = start + chrono::Days::new(days - 1);
    PriceSeries::new("BTC", MockMarketDataService::random_walk("BTC-USD", start, end)).unwrap()
}

#[test]
fn test_regression_window_yields_full_finite_table() {
    let series = mock_series(30);
    let table = engineer_features(&series).unwrap();

    assert_eq!(table.len(), 30);
    assert_eq!(table.column_count(), 82);
    assert!(table.rows().iter().flatten().all(|v| v.is_finite()));
    assert_eq!(table.dates(), series.dates().as_slice());
}

#[test]
fn test_group_order() {
    let table = engineer_features(&mock_series(40)).unwrap();
    let names = table.column_names();

    assert_eq!(&names[..6], BASE_COLUMNS.map(String::from).as_slice());
    let first_of = |prefix: &str| names.iter().position(|n| n.starts_with(prefix)).unwrap();
    assert_eq!(first_of("volume_"), 6);
    assert!(first_of("volume_") < first_of("volatility_"));
    assert!(first_of("volatility_") < first_of("trend_"));
    assert!(first_of("trend_") < first_of("momentum_"));
    assert_eq!(names.last().unwrap(), "momentum_kama");
    assert!(DROPPED_COLUMNS.iter().all(|d| !names.iter().any(|n| n == d)));
}

#[test]
fn test_column_names_do_not_depend_on_length() {
    let short = engineer_features(&mock_series(2)).unwrap();
    let long = engineer_features(&mock_series(120)).unwrap();
    assert_eq!(short.column_names(), long.column_names());
}

#[test]
fn test_bollinger_band_brackets_mid_line() {
    let table = engineer_features(&mock_series(60)).unwrap();
    let bbh = table.column("volatility_bbh").unwrap();
    let bbm = table.column("volatility_bbm").unwrap();
    let bbl = table.column("volatility_bbl").unwrap();

    for i in 20..60 {
        assert!(bbl[i] <= bbm[i] && bbm[i] <= bbh[i], "row {}", i);
    }
}

#[test]
fn test_rsi_stays_in_range() {
    let table = engineer_features(&mock_series(90)).unwrap();
    let rsi = table.column("momentum_rsi").unwrap();
    assert!(rsi.iter().all(|v| (0.0..=100.0).contains(v)));
}

#[test]
fn test_single_bar_is_insufficient() {
    let series = PriceSeries::new(
        "ETH",
        vec![PriceBar {
            date: date(2024, 1, 1),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
        }],
    )
    .unwrap();

    let err = engineer_features(&series).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InsufficientData {
            rows: 1,
            required: 2
        }
    ));
}
