//! Audit log stored in the Supabase `logs` table through PostgREST.

use crate::domain::audit::LogEntry;
use crate::domain::ports::AuditLogStore;
use crate::infrastructure::core::http_client_factory::build_url_with_query;
use crate::infrastructure::storage::SupabaseClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

const LOGS_TABLE: &str = "rest/v1/logs";
const LOG_COLUMNS: &str = "datetime,system,action,code";

pub struct SupabaseAuditLogStore {
    client: SupabaseClient,
}

impl SupabaseAuditLogStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditLogStore for SupabaseAuditLogStore {
    async fn insert(&self, entry: &LogEntry) -> Result<()> {
        let response = self
            .client
            .post(&self.client.endpoint(LOGS_TABLE))
            .header("Prefer", "return=minimal")
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(entry).context("Failed to serialize log row")?)
            .send()
            .await
            .context("Failed to insert Supabase log row")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Supabase log insert failed ({}): {}", status, error_text);
        }
        debug!("SupabaseAuditLogStore: inserted {} {}", entry.system, entry.action);
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<LogEntry>> {
        let url = build_url_with_query(
            &self.client.endpoint(LOGS_TABLE),
            &[("select", LOG_COLUMNS), ("order", "datetime.asc")],
        )?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to select Supabase log rows")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Supabase log select failed ({}): {}", status, error_text);
        }

        response
            .json::<Vec<LogEntry>>()
            .await
            .context("Failed to parse Supabase log rows")
    }
}
