//! Prometheus metrics definitions for Farcry
//!
//! All metrics use the `farcry_` prefix.

use prometheus::{
    Counter, CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

/// Prometheus metrics for the prediction service
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Pipeline invocations by pipeline and outcome
    pub pipeline_runs_total: CounterVec,
    /// Pipeline failures by pipeline and error kind
    pub pipeline_errors_total: CounterVec,
    /// End-to-end pipeline latency in seconds
    pub pipeline_latency_seconds: HistogramVec,
    /// Audit log writes that failed and were dropped
    pub audit_write_failures_total: Counter,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let pipeline_runs_total = CounterVec::new(
            Opts::new(
                "farcry_pipeline_runs_total",
                "Total pipeline invocations by outcome",
            ),
            &["pipeline", "outcome"],
        )?;
        registry.register(Box::new(pipeline_runs_total.clone()))?;

        let pipeline_errors_total = CounterVec::new(
            Opts::new(
                "farcry_pipeline_errors_total",
                "Total pipeline failures by error kind",
            ),
            &["pipeline", "kind"],
        )?;
        registry.register(Box::new(pipeline_errors_total.clone()))?;

        let pipeline_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "farcry_pipeline_latency_seconds",
                "Pipeline latency in seconds",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["pipeline"],
        )?;
        registry.register(Box::new(pipeline_latency_seconds.clone()))?;

        let audit_write_failures_total = Counter::with_opts(Opts::new(
            "farcry_audit_write_failures_total",
            "Audit log writes that failed",
        ))?;
        registry.register(Box::new(audit_write_failures_total.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "farcry_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            pipeline_runs_total,
            pipeline_errors_total,
            pipeline_latency_seconds,
            audit_write_failures_total,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Record a successful pipeline run
    pub fn record_success(&self, pipeline: &str, latency: f64) {
        self.pipeline_runs_total
            .with_label_values(&[pipeline, "success"])
            .inc();
        self.pipeline_latency_seconds
            .with_label_values(&[pipeline])
            .observe(latency);
    }

    /// Record a failed pipeline run
    pub fn record_failure(&self, pipeline: &str, kind: &str, latency: f64) {
        self.pipeline_runs_total
            .with_label_values(&[pipeline, "failure"])
            .inc();
        self.pipeline_errors_total
            .with_label_values(&[pipeline, kind])
            .inc();
        self.pipeline_latency_seconds
            .with_label_values(&[pipeline])
            .observe(latency);
    }

    pub fn inc_audit_failures(&self) {
        self.audit_write_failures_total.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.uptime_seconds.set(1.0);
        assert!(metrics.render().contains("farcry_"));
    }

    #[test]
    fn test_pipeline_outcomes() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.record_success("regression", 0.4);
        metrics.record_failure("regression", "data_unavailable", 0.1);

        let output = metrics.render();
        assert!(output.contains(r#"farcry_pipeline_runs_total{outcome="success",pipeline="regression"} 1"#));
        assert!(output.contains(r#"kind="data_unavailable""#));
        assert!(output.contains("farcry_pipeline_latency_seconds_count{pipeline=\"regression\"} 2"));
    }

    #[test]
    fn test_audit_failure_counter() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_audit_failures();
        assert!(metrics.render().contains("farcry_audit_write_failures_total 1"));
    }
}
