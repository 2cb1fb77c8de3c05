//! Offline feed reading `<dir>/<SYMBOL>.csv` files.
//!
//! Expects a `Date,Open,High,Low,Close,Volume` header as written by common
//! chart exports; extra columns such as `Adj Close` are ignored.

use crate::domain::market::{Interval, PriceBar};
use crate::domain::ports::MarketDataService;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct CsvBar {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
}

impl CsvBar {
    fn into_bar(self) -> Option<PriceBar> {
        Some(PriceBar {
            date: self.date,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume?,
        })
    }
}

pub struct CsvMarketDataService {
    dir: PathBuf,
}

impl CsvMarketDataService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        let path = self.dir.join(format!("{}.csv", symbol));
        let mut rdr = csv::Reader::from_path(&path)
            .with_context(|| format!("Failed to open price file {:?}", path))?;

        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<CsvBar>().enumerate() {
            match result {
                Ok(row) if row.date >= start && row.date <= end => {
                    if let Some(bar) = row.into_bar() {
                        bars.push(bar);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping malformed row {} in {:?}: {}", line + 2, path, e),
            }
        }
        Ok(bars)
    }
}

#[async_trait]
impl MarketDataService for CsvMarketDataService {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let bars = self.read_bars(symbol, start, end)?;
        info!("CsvMarketDataService: Loaded {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_reads_window_and_skips_incomplete_rows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ETH-USD.csv"),
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-01,1,2,0.5,1.5,1.5,100\n\
             2024-01-02,1.5,2.5,1,2,2,\n\
             2024-01-03,2,3,1.5,2.5,2.5,300\n\
             2024-01-04,2.5,3.5,2,3,3,400\n",
        )
        .unwrap();

        let feed = CsvMarketDataService::new(dir.path());
        let bars = feed
            .get_historical_bars("ETH-USD", d(2024, 1, 1), d(2024, 1, 3), Interval::Daily)
            .await
            .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].date, d(2024, 1, 3));
        assert_eq!(bars[1].volume, 300.0);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let feed = CsvMarketDataService::new(dir.path());
        assert!(
            feed.get_historical_bars("BTC-USD", d(2024, 1, 1), d(2024, 1, 3), Interval::Daily)
                .await
                .is_err()
        );
    }
}
