//! Binance spot klines
//!
//! Public endpoint, no API key required for market data.

use crate::domain::market::{Asset, Interval, PriceBar};
use crate::domain::ports::MarketDataService;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest_middleware::ClientWithMiddleware;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance caps one klines request at 1000 rows.
const KLINES_LIMIT: usize = 1000;

/// Binance klines format: [open_time, open, high, low, close, volume, ...]
fn parse_klines(klines: Vec<serde_json::Value>) -> Vec<PriceBar> {
    klines
        .into_iter()
        .filter_map(|k| {
            let arr = k.as_array()?;
            if arr.len() < 6 {
                return None;
            }

            let timestamp = arr[0].as_i64()?;
            let date = DateTime::from_timestamp_millis(timestamp)?.date_naive();

            let open = arr[1].as_str()?.parse::<f64>().ok()?;
            let high = arr[2].as_str()?.parse::<f64>().ok()?;
            let low = arr[3].as_str()?.parse::<f64>().ok()?;
            let close = arr[4].as_str()?.parse::<f64>().ok()?;
            let volume = arr[5].as_str()?.parse::<f64>().ok()?;

            Some(PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            })
        })
        .collect()
}

pub struct BinanceMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
}

impl BinanceMarketDataService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for BinanceMarketDataService {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl MarketDataService for BinanceMarketDataService {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let end_ms = (end + Days::new(1)).and_time(NaiveTime::MIN).and_utc().timestamp_millis() - 1;
        let mut cursor = start;
        let mut bars = Vec::new();

        while cursor <= end {
            let start_ms = cursor.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
            let url_with_query = build_url_with_query(
                &url,
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.binance_code().to_string()),
                    ("startTime", start_ms.to_string()),
                    ("endTime", end_ms.to_string()),
                    ("limit", KLINES_LIMIT.to_string()),
                ],
            )?;

            let response = self
                .client
                .get(&url_with_query)
                .send()
                .await
                .context("Failed to fetch klines from Binance")?;

            if !response.status().is_success() {
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("Binance klines fetch failed: {}", error_text);
            }

            let klines: Vec<serde_json::Value> = response
                .json()
                .await
                .context("Failed to parse Binance klines response")?;
            let page_len = klines.len();
            let page = parse_klines(klines);

            let Some(last) = page.last().map(|b| b.date) else {
                break;
            };
            bars.extend(page);
            if page_len < KLINES_LIMIT {
                break;
            }
            cursor = last + Days::new(1);
        }

        info!(
            "BinanceMarketDataService: Fetched {} bars for {}",
            bars.len(),
            symbol
        );
        Ok(bars)
    }

    fn name(&self) -> &str {
        "binance"
    }

    fn symbol_for(&self, asset: Asset) -> String {
        asset.binance_symbol().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_klines() {
        let klines = vec![
            json!([1717200000000i64, "67500.1", "68000.0", "67000.0", "67800.5", "1234.5", 1717286399999i64]),
            json!([1717286400000i64, "bad", "68000.0", "67000.0", "67800.5", "1234.5"]),
            json!([1717372800000i64, "1"]),
        ];
        let bars = parse_klines(klines);

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(bars[0].close, 67800.5);
        assert_eq!(bars[0].volume, 1234.5);
    }

    #[test]
    fn test_symbol_mapping() {
        let service = BinanceMarketDataService::default();
        assert_eq!(service.symbol_for(Asset::Eth), "ETHUSDT");
    }
}
