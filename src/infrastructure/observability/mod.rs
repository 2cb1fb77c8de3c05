//! Pull-based observability for Farcry
//!
//! Metrics are kept in a Prometheus registry and scraped from `GET /metrics`.

pub mod metrics;

pub use metrics::Metrics;
