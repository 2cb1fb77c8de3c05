use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout of the `datetime` column.
pub const LOG_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const STATUS_OK: i64 = 200;
pub const STATUS_FAILED: i64 = 500;

/// One row of the append-only audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub datetime: String,
    pub system: String,
    pub action: String,
    pub code: i64,
}

impl LogEntry {
    pub fn new(at: DateTime<Utc>, system: &str, action: &str, code: i64) -> Self {
        Self {
            datetime: at.format(LOG_DATETIME_FORMAT).to_string(),
            system: system.to_string(),
            action: action.to_string(),
            code,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.code >= STATUS_FAILED
    }
}
