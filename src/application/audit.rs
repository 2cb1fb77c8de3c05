use crate::domain::audit::LogEntry;
use crate::domain::ports::AuditLogStore;
use crate::infrastructure::observability::Metrics;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Best-effort audit trail of pipeline invocations.
///
/// Writing an entry never fails from the caller's point of view: store errors
/// are reported through tracing and the audit failure counter, then dropped.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn AuditLogStore>,
    metrics: Option<Metrics>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Records one invocation outcome, stamped with the current UTC time.
    pub async fn log(&self, system: &str, action: &str, status_code: i64) {
        let entry = LogEntry::new(Utc::now(), system, action, status_code);
        match self.store.insert(&entry).await {
            Ok(()) => debug!("Audit: {} {} -> {}", system, action, status_code),
            Err(e) => {
                warn!(
                    "Failed to write audit entry ({} {} {}): {:#}",
                    system, action, status_code, e
                );
                if let Some(metrics) = &self.metrics {
                    metrics.inc_audit_failures();
                }
            }
        }
    }

    /// All stored entries, or `None` when the store cannot be read.
    pub async fn recent(&self) -> Option<Vec<LogEntry>> {
        match self.store.select_all().await {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!("Failed to read audit log: {:#}", e);
                None
            }
        }
    }
}
