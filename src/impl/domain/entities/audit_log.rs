use chrono::{DateTime, Utc};

use super::ids::{AuditLogId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Approve,
    Reject,
    Resolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEntityType {
    Budget,
    Department,
    Project,
    Vendor,
    Transaction,
    Anomaly,
}

#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    pub id: AuditLogId,
    pub action: AuditAction,
    pub entity_type: AuditEntityType,
    /// Stringified id of the affected record.
    pub entity_id: String,
    pub entity_name: String,
    pub user_id: UserId,
    pub old_data: Option<String>,
    pub new_data: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// --

impl AuditLogEntry {
    pub(crate) fn new(
        action: AuditAction,
        entity_type: AuditEntityType,
        entity_id: impl ToString,
        entity_name: impl Into<String>,
        user_id: UserId,
    ) -> Self {
        Self {
            id: AuditLogId::generate(),
            action,
            entity_type,
            entity_id: entity_id.to_string(),
            entity_name: entity_name.into(),
            user_id,
            old_data: None,
            new_data: None,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn with_change(mut self, old_data: Option<String>, new_data: Option<String>) -> Self {
        self.old_data = old_data;
        self.new_data = new_data;
        self
    }
}
