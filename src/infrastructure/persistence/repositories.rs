use crate::domain::audit::LogEntry;
use crate::domain::ports::AuditLogStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::debug;

pub struct SqliteAuditLogStore {
    pool: SqlitePool,
}

impl SqliteAuditLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogStore for SqliteAuditLogStore {
    async fn insert(&self, entry: &LogEntry) -> Result<()> {
        sqlx::query("INSERT INTO logs (datetime, system, action, code) VALUES (?, ?, ?, ?)")
            .bind(&entry.datetime)
            .bind(&entry.system)
            .bind(&entry.action)
            .bind(entry.code)
            .execute(&self.pool)
            .await
            .context("Failed to insert log entry")?;

        debug!("Persisted log entry {} {} {}", entry.system, entry.action, entry.code);
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query("SELECT datetime, system, action, code FROM logs ORDER BY rowid ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to select log entries")?;

        rows.into_iter()
            .map(|row| -> Result<LogEntry> {
                Ok(LogEntry {
                    datetime: row.try_get("datetime")?,
                    system: row.try_get("system")?,
                    action: row.try_get("action")?,
                    code: row.try_get("code")?,
                })
            })
            .collect()
    }
}
