pub mod sheets;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

/// One row of the reservation audit log.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditEntry {
    pub display_name: String,
    pub user_id: String,
    pub slot: String,
    pub submitted_at: String,
}

impl AuditEntry {
    pub fn new(display_name: &str, user_id: &str, slot: &str, submitted_at: NaiveDateTime) -> Self {
        Self {
            display_name: display_name.to_string(),
            user_id: user_id.to_string(),
            slot: slot.to_string(),
            submitted_at: submitted_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    pub fn to_row(&self) -> Vec<&str> {
        vec![
            self.display_name.as_str(),
            self.user_id.as_str(),
            self.slot.as_str(),
            self.submitted_at.as_str(),
        ]
    }
}

#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn log_reservation(&self, entry: &AuditEntry) -> anyhow::Result<()>;
}

/// Used when no spreadsheet is configured.
pub struct NoopAuditLogger;

#[async_trait]
impl AuditLogger for NoopAuditLogger {
    async fn log_reservation(&self, entry: &AuditEntry) -> anyhow::Result<()> {
        tracing::debug!(slot = %entry.slot, "audit log disabled, skipping");
        Ok(())
    }
}
