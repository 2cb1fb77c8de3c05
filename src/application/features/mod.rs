//! Technical-indicator battery applied to a daily price series.
//!
//! The output table starts with the raw bar columns and continues with the
//! volume, volatility, trend and momentum groups in a fixed order. Warm-up
//! gaps are forward-filled and then replaced by each indicator's neutral
//! value, so a series of two or more valid bars always yields a full table.

mod momentum;
mod others;
mod series;
mod trend;
mod volatility;
mod volume;

use crate::domain::errors::PipelineError;
use crate::domain::features::FeatureTable;
use crate::domain::market::{PriceBar, PriceSeries};
use tracing::{debug, info, warn};

/// Raw bar columns at the head of every table.
pub const BASE_COLUMNS: [&str; 6] = ["Open", "High", "Low", "Close", "Volume", "Adj Close"];

/// Return columns computed with the battery but never fed to a model.
pub const DROPPED_COLUMNS: [&str; 3] = ["others_dr", "others_dlr", "others_cr"];

/// Minimum number of bars the battery accepts.
pub const MIN_ROWS: usize = 2;

/// One computed indicator column.
pub(crate) struct Indicator {
    name: &'static str,
    values: Vec<f64>,
    neutral: f64,
}

impl Indicator {
    fn new(name: &'static str, values: Vec<f64>) -> Self {
        Self::with_neutral(name, values, 0.0)
    }

    fn with_neutral(name: &'static str, values: Vec<f64>, neutral: f64) -> Self {
        Self {
            name,
            values,
            neutral,
        }
    }
}

/// Column view of a price series, plus the `ta` items fed to the streaming
/// indicators that need a whole bar. A bar `ta` rejects even with the
/// close-only fallback has no item.
pub(crate) struct Ohlcv {
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    items: Vec<Option<ta::DataItem>>,
}

impl Ohlcv {
    fn from_series(series: &PriceSeries) -> Self {
        let items = series
            .bars()
            .iter()
            .map(|bar| data_item(series.symbol(), bar))
            .collect();

        Self {
            open: series.opens(),
            high: series.highs(),
            low: series.lows(),
            close: series.closes(),
            volume: series.volumes(),
            items,
        }
    }

    fn len(&self) -> usize {
        self.close.len()
    }

    /// (high + low + close) / 3
    fn typical_price(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| (self.high[i] + self.low[i] + self.close[i]) / 3.0)
            .collect()
    }
}

fn data_item(symbol: &str, bar: &PriceBar) -> Option<ta::DataItem> {
    ta::DataItem::builder()
        .open(bar.open)
        .high(bar.high)
        .low(bar.low)
        .close(bar.close)
        .volume(bar.volume)
        .build()
        .or_else(|e| {
            warn!(
                "Failed to build DataItem for {} on {}: {:?}. Using close price as fallback. H:{}, L:{}",
                symbol, bar.date, e, bar.high, bar.low
            );
            ta::DataItem::builder()
                .open(bar.close)
                .high(bar.close)
                .low(bar.close)
                .close(bar.close)
                .volume(0.0)
                .build()
        })
        .map_err(|e| {
            warn!(
                "Skipping unusable bar for {} on {}: {:?}. Close: {}",
                symbol, bar.date, e, bar.close
            )
        })
        .ok()
}

/// Computes the indicator battery for `series`.
///
/// Fails with `InsufficientData` when fewer than two bars are available,
/// either on input or after rows holding non-finite values are dropped.
pub fn engineer_features(series: &PriceSeries) -> Result<FeatureTable, PipelineError> {
    if series.len() < MIN_ROWS {
        return Err(PipelineError::InsufficientData {
            rows: series.len(),
            required: MIN_ROWS,
        });
    }

    let input = Ohlcv::from_series(series);

    let mut columns: Vec<(String, Vec<f64>)> = vec![
        (BASE_COLUMNS[0].to_string(), input.open.clone()),
        (BASE_COLUMNS[1].to_string(), input.high.clone()),
        (BASE_COLUMNS[2].to_string(), input.low.clone()),
        (BASE_COLUMNS[3].to_string(), input.close.clone()),
        (BASE_COLUMNS[4].to_string(), input.volume.clone()),
        (BASE_COLUMNS[5].to_string(), input.close.clone()),
    ];

    let groups = [
        volume::compute(&input),
        volatility::compute(&input),
        trend::compute(&input),
        momentum::compute(&input),
        others::compute(&input),
    ];
    for indicator in groups.into_iter().flatten() {
        let mut values = indicator.values;
        series::fill_gaps(&mut values, indicator.neutral);
        columns.push((indicator.name.to_string(), values));
    }

    let table = FeatureTable::from_columns(series.dates(), columns)?
        .drop_columns(&DROPPED_COLUMNS)
        .drop_incomplete_rows();

    let dropped = series.len() - table.len();
    if dropped > 0 {
        debug!(
            "{}: dropped {} row(s) holding non-finite values",
            series.symbol(),
            dropped
        );
    }

    if table.len() < MIN_ROWS {
        return Err(PipelineError::InsufficientData {
            rows: table.len(),
            required: MIN_ROWS,
        });
    }

    info!(
        "{}: engineered {} feature columns over {} rows",
        series.symbol(),
        table.column_count(),
        table.len()
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn series(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.3;
                PriceBar {
                    date: start + Days::new(i as u64),
                    open: close - 0.5,
                    high: close + 1.5,
                    low: close - 1.5,
                    close,
                    volume: 1_000.0 + (i % 7) as f64 * 50.0,
                }
            })
            .collect();
        PriceSeries::new("BTC-USD", bars).unwrap()
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let err = engineer_features(&series(1)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData {
                rows: 1,
                required: 2
            }
        ));
    }

    #[test]
    fn test_two_rows_yield_full_table() {
        let table = engineer_features(&series(2)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_count(), 82);
        assert!(table.rows().iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_column_order_and_dropped_columns() {
        let table = engineer_features(&series(60)).unwrap();
        let names = table.column_names();

        assert_eq!(&names[..6], &BASE_COLUMNS.map(String::from));
        assert_eq!(names[6], "volume_adi");
        assert_eq!(names[names.len() - 1], "momentum_kama");
        for dropped in DROPPED_COLUMNS {
            assert!(table.column_index(dropped).is_none());
        }
    }

    #[test]
    fn test_warmup_uses_neutral_values() {
        let table = engineer_features(&series(5)).unwrap();
        // RSI needs 14 bars: the whole column is the neutral 50
        assert_eq!(table.column("momentum_rsi").unwrap(), vec![50.0; 5]);
        assert_eq!(table.column("trend_macd").unwrap(), vec![0.0; 5]);
    }

    #[test]
    fn test_bar_with_missing_close_is_dropped() {
        let mut bars = series(30).bars().to_vec();
        bars[10].close = f64::NAN;
        let gapped = PriceSeries::new("BTC-USD", bars.clone()).unwrap();

        let table = engineer_features(&gapped).unwrap();

        assert_eq!(table.len(), 29);
        assert!(!table.dates().contains(&bars[10].date));
        assert!(table.rows().iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_missing_open_and_missing_close_drop_alike() {
        let mut no_open = series(30).bars().to_vec();
        no_open[10].open = f64::NAN;
        let mut no_close = series(30).bars().to_vec();
        no_close[10].close = f64::NAN;

        let a = engineer_features(&PriceSeries::new("BTC-USD", no_open).unwrap()).unwrap();
        let b = engineer_features(&PriceSeries::new("BTC-USD", no_close).unwrap()).unwrap();
        assert_eq!(a.dates(), b.dates());
    }

    #[test]
    fn test_too_few_rows_after_dropping_incomplete_ones() {
        let mut bars = series(2).bars().to_vec();
        bars[1].close = f64::NAN;

        let err = engineer_features(&PriceSeries::new("BTC-USD", bars).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData {
                rows: 1,
                required: 2
            }
        ));
    }

    #[test]
    fn test_bollinger_band_is_population_band_over_twenty_closes() {
        let input = series(30);
        let table = engineer_features(&input).unwrap();
        let window = &input.closes()[10..30];
        let mean = window.iter().sum::<f64>() / 20.0;
        let sd = (window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / 20.0).sqrt();

        let bbm = table.column("volatility_bbm").unwrap();
        let bbh = table.column("volatility_bbh").unwrap();
        assert!((bbm[29] - mean).abs() < 1e-9);
        assert!((bbh[29] - (mean + 2.0 * sd)).abs() < 1e-9);
        // Warm-up rows fall back to the neutral value
        assert_eq!(bbm[18], 0.0);
    }

    #[test]
    fn test_adj_close_mirrors_close() {
        let table = engineer_features(&series(30)).unwrap();
        assert_eq!(table.column("Adj Close"), table.column("Close"));
    }
}
