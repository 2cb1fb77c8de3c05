//! Yahoo Finance chart API
//!
//! Daily bars come from `/v8/finance/chart/{symbol}`. Rows with a null
//! price or volume are skipped.

use crate::domain::market::{Interval, PriceBar};
use crate::domain::ports::MarketDataService;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

/// Parses a chart response body into bars dated within `[start, end]`.
fn parse_chart(symbol: &str, body: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
    let response: ChartResponse =
        serde_json::from_str(body).context("Failed to parse Yahoo chart response")?;

    if let Some(err) = response.chart.error {
        anyhow::bail!("Yahoo chart error for {}: {} ({})", symbol, err.description, err.code);
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut skipped = 0usize;
    let bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
            if date < start || date > end {
                return None;
            }
            let bar = (|| {
                Some(PriceBar {
                    date,
                    open: at(&quote.open, i)?,
                    high: at(&quote.high, i)?,
                    low: at(&quote.low, i)?,
                    close: at(&quote.close, i)?,
                    volume: at(&quote.volume, i)?,
                })
            })();
            if bar.is_none() {
                skipped += 1;
            }
            bar
        })
        .collect();

    if skipped > 0 {
        debug!("Yahoo: skipped {} incomplete rows for {}", skipped, symbol);
    }
    Ok(bars)
}

pub struct YahooMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
}

impl YahooMarketDataService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for YahooMarketDataService {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl MarketDataService for YahooMarketDataService {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive
        let period2 = (end + Days::new(1)).and_time(NaiveTime::MIN).and_utc().timestamp();

        let url = build_url_with_query(
            &format!("{}/v8/finance/chart/{}", self.base_url, symbol),
            &[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", interval.yahoo_code().to_string()),
                ("events", "history".to_string()),
            ],
        )?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch chart from Yahoo Finance")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read Yahoo response")?;
        if !status.is_success() && !body.contains("\"chart\"") {
            anyhow::bail!("Yahoo chart fetch failed ({}): {}", status, body);
        }

        let bars = parse_chart(symbol, &body, start, end)?;
        info!("YahooMarketDataService: Fetched {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const BODY: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1717200000, 1717286400, 1717372800],
                "indicators": {"quote": [{
                    "open":   [67500.0, null, 67700.0],
                    "high":   [68000.0, 68100.0, 68200.0],
                    "low":    [67000.0, 67100.0, 67200.0],
                    "close":  [67800.0, 67900.0, 68000.0],
                    "volume": [1.5e10, 1.6e10, 1.7e10]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_skips_rows_with_nulls() {
        let bars = parse_chart("BTC-USD", BODY, d(2024, 6, 1), d(2024, 6, 3)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2024, 6, 1));
        assert_eq!(bars[1].date, d(2024, 6, 3));
        assert_eq!(bars[1].close, 68000.0);
    }

    #[test]
    fn test_parse_filters_to_window() {
        let bars = parse_chart("BTC-USD", BODY, d(2024, 6, 3), d(2024, 6, 30)).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn test_parse_reports_chart_error() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let err = parse_chart("XYZ-USD", body, d(2024, 1, 1), d(2024, 1, 2)).unwrap_err();
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn test_parse_empty_result() {
        let body = r#"{"chart": {"result": [], "error": null}}"#;
        assert!(parse_chart("BTC-USD", body, d(2024, 1, 1), d(2024, 1, 2)).unwrap().is_empty());
    }
}
