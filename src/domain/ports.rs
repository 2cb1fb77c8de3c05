use crate::domain::audit::LogEntry;
use crate::domain::market::{Asset, Interval, PriceBar};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of daily OHLCV history.
#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Bars for `symbol` dated within `[start, end]`, both ends inclusive.
    /// An empty vector means the feed has nothing for the window.
    async fn get_historical_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>>;

    /// Provider name for logs and metrics.
    fn name(&self) -> &str;

    /// Ticker this provider uses for `asset`.
    fn symbol_for(&self, asset: Asset) -> String {
        asset.yahoo_symbol().to_string()
    }
}

/// Remote object storage holding serialized model artifacts.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>>;
}

/// Append-only store behind the audit log.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn insert(&self, entry: &LogEntry) -> Result<()>;

    /// All entries, oldest first.
    async fn select_all(&self) -> Result<Vec<LogEntry>>;
}
