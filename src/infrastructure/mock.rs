//! In-memory adapters for demo mode and tests.

use crate::domain::audit::LogEntry;
use crate::domain::market::{Interval, PriceBar};
use crate::domain::ports::{AuditLogStore, MarketDataService, ObjectStorage};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Deterministic random-walk daily bars.
///
/// The walk for a symbol is seeded from the symbol and the start date, so
/// the same request always yields the same bars.
#[derive(Clone, Default)]
pub struct MockMarketDataService {
    empty_symbols: HashSet<String>,
    failing_symbols: HashSet<String>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockMarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns no rows for `symbol`.
    pub fn without_symbol(mut self, symbol: &str) -> Self {
        self.empty_symbols.insert(symbol.to_string());
        self
    }

    /// Fails every request for `symbol`.
    pub fn failing_symbol(mut self, symbol: &str) -> Self {
        self.failing_symbols.insert(symbol.to_string());
        self
    }

    /// Symbols requested so far, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    fn start_price(symbol: &str) -> f64 {
        if symbol.starts_with("BTC") {
            60_000.0
        } else if symbol.starts_with("ETH") {
            3_000.0
        } else {
            100.0
        }
    }

    pub fn random_walk(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        let seed = symbol
            .bytes()
            .fold(17u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
            ^ (start - NaiveDate::default()).num_days() as u64;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut bars = Vec::new();
        let mut close = Self::start_price(symbol);
        let mut date = start;
        while date <= end {
            let open = close;
            close = (open * (1.0 + rng.random_range(-0.03..0.03))).max(0.01);
            let high = open.max(close) * (1.0 + rng.random_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.random_range(0.0..0.01));
            let volume = rng.random_range(1.0e9..5.0e9);
            bars.push(PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
            date = date + Days::new(1);
        }
        bars
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        self.calls.write().await.push(symbol.to_string());

        if self.failing_symbols.contains(symbol) {
            anyhow::bail!("Mock feed unavailable for {}", symbol);
        }
        if self.empty_symbols.contains(symbol) {
            return Ok(Vec::new());
        }

        let bars = Self::random_walk(symbol, start, end);
        debug!("MockMarketDataService: {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Object storage backed by a map of `(bucket, path)` to bytes.
#[derive(Clone, Default)]
pub struct InMemoryObjectStorage {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, bucket: &str, path: &str, bytes: Vec<u8>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), path.to_string()), bytes);
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Object not found: {}/{}", bucket, path))
    }
}

/// Audit store keeping entries in memory, oldest first.
#[derive(Clone, Default)]
pub struct InMemoryAuditLogStore {
    entries: Arc<RwLock<Vec<LogEntry>>>,
}

impl InMemoryAuditLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn insert(&self, entry: &LogEntry) -> Result<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<LogEntry>> {
        Ok(self.entries().await)
    }
}

/// Audit store whose every call fails, for exercising the swallow path.
pub struct FailingAuditLogStore;

#[async_trait]
impl AuditLogStore for FailingAuditLogStore {
    async fn insert(&self, _entry: &LogEntry) -> Result<()> {
        anyhow::bail!("audit store unavailable")
    }

    async fn select_all(&self) -> Result<Vec<LogEntry>> {
        anyhow::bail!("audit store unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_random_walk_is_deterministic_and_valid() {
        let feed = MockMarketDataService::new();
        let a = feed
            .get_historical_bars("BTC-USD", d(2024, 1, 1), d(2024, 1, 30), Interval::Daily)
            .await
            .unwrap();
        let b = feed
            .get_historical_bars("BTC-USD", d(2024, 1, 1), d(2024, 1, 30), Interval::Daily)
            .await
            .unwrap();

        assert_eq!(a.len(), 30);
        assert_eq!(a, b);
        assert!(a.iter().all(|bar| bar.low <= bar.open.min(bar.close)
            && bar.high >= bar.open.max(bar.close)
            && bar.close > 0.0));
        assert_eq!(feed.calls().await, vec!["BTC-USD", "BTC-USD"]);
    }

    #[tokio::test]
    async fn test_empty_and_failing_symbols() {
        let feed = MockMarketDataService::new()
            .without_symbol("ETH-USD")
            .failing_symbol("BTC-USD");

        let eth = feed
            .get_historical_bars("ETH-USD", d(2024, 1, 1), d(2024, 1, 5), Interval::Daily)
            .await
            .unwrap();
        assert!(eth.is_empty());
        assert!(
            feed.get_historical_bars("BTC-USD", d(2024, 1, 1), d(2024, 1, 5), Interval::Daily)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_object_storage_roundtrip() {
        let storage = InMemoryObjectStorage::new();
        storage.put("models", "a/b.json", b"{}".to_vec()).await;

        assert_eq!(storage.download("models", "a/b.json").await.unwrap(), b"{}");
        assert!(storage.download("models", "a/c.json").await.is_err());
    }
}
