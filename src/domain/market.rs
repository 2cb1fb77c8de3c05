use crate::domain::errors::PipelineError;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Assets served by the prediction endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Asset {
    Btc,
    Eth,
}

impl Asset {
    /// Fixed processing order of the pipelines.
    pub const ALL: [Asset; 2] = [Asset::Btc, Asset::Eth];

    /// Label used in API payloads ("BTC").
    pub fn label(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
        }
    }

    /// Yahoo Finance ticker ("BTC-USD").
    pub fn yahoo_symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC-USD",
            Asset::Eth => "ETH-USD",
        }
    }

    /// Binance spot pair ("BTCUSDT").
    pub fn binance_symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTCUSDT",
            Asset::Eth => "ETHUSDT",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Asset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BTC" | "BTC-USD" | "BTCUSDT" => Ok(Asset::Btc),
            "ETH" | "ETH-USD" | "ETHUSDT" => Ok(Asset::Eth),
            _ => anyhow::bail!("Unknown asset: {}. Must be 'BTC' or 'ETH'", s),
        }
    }
}

/// Bar interval requested from the feed. Only daily bars are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    #[default]
    Daily,
}

impl Interval {
    pub fn yahoo_code(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
        }
    }

    pub fn binance_code(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
        }
    }
}

/// One daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Date-ordered daily history of one asset.
///
/// Dates are strictly increasing and the series is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Sorts bars by date and collapses duplicate dates, keeping the last bar
    /// seen for a date (feeds sometimes repeat the live bar).
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Result<Self, PipelineError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(PipelineError::data_unavailable(
                &symbol,
                "feed returned no rows for the requested window",
            ));
        }

        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Ok(Self {
            symbol,
            bars: deduped,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Natural log of the close price, in date order.
    pub fn log_closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close.ln()).collect()
    }
}

/// Inclusive date range requested from the market-data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LookbackWindow {
    /// Days of history used by the regression pipeline, ending yesterday.
    pub const REGRESSION_DAYS: u64 = 29;
    /// Days of history used by the time-series pipeline, ending today.
    pub const TIME_SERIES_DAYS: u64 = 730;

    /// 29-day lookback ending yesterday. Today's bar is still forming and is
    /// excluded.
    pub fn regression(today: NaiveDate) -> Self {
        let yesterday = today - Days::new(1);
        Self {
            start: yesterday - Days::new(Self::REGRESSION_DAYS),
            end: yesterday,
        }
    }

    /// 730-day lookback ending today.
    pub fn time_series(today: NaiveDate) -> Self {
        Self {
            start: today - Days::new(Self::TIME_SERIES_DAYS),
            end: today,
        }
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: NaiveDate, close: f64) -> PriceBar {
        PriceBar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_empty_series_is_data_unavailable() {
        let err = PriceSeries::new("BTC-USD", vec![]).unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
        assert!(err.to_string().contains("BTC-USD"));
    }

    #[test]
    fn test_series_is_sorted_and_deduplicated() {
        let series = PriceSeries::new(
            "ETH-USD",
            vec![
                bar(d(2024, 3, 2), 2.0),
                bar(d(2024, 3, 1), 1.0),
                bar(d(2024, 3, 2), 3.0),
            ],
        )
        .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), d(2024, 3, 1));
        assert_eq!(series.closes(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_regression_window_ends_yesterday() {
        let window = LookbackWindow::regression(d(2024, 5, 31));
        assert_eq!(window.end, d(2024, 5, 30));
        assert_eq!(window.start, d(2024, 5, 1));
        assert_eq!(window.days(), 30);
    }

    #[test]
    fn test_time_series_window_ends_today() {
        let window = LookbackWindow::time_series(d(2024, 5, 31));
        assert_eq!(window.end, d(2024, 5, 31));
        assert_eq!(window.days(), 731);
    }

    #[test]
    fn test_asset_parsing() {
        assert_eq!("btc".parse::<Asset>().unwrap(), Asset::Btc);
        assert_eq!("ETH-USD".parse::<Asset>().unwrap(), Asset::Eth);
        assert!("DOGE".parse::<Asset>().is_err());
    }
}
