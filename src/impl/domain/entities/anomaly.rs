use chrono::{DateTime, Utc};

use super::ids::{AnomalyId, BudgetId, TransactionId, UserId, VendorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnomalyType {
    BudgetOverrun,
    UnusualSpending,
    DuplicateTransaction,
    SuspiciousActivity,
    VendorAnomaly,
}

/// Ordered from least to most severe, so `Ord` can be used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnomalyStatus {
    Active,
    Investigating,
    Resolved,
    FalsePositive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedBy {
    System,
    Ai,
    User,
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyData {
    pub threshold: f64,
    pub actual_value: f64,
    pub expected_value: f64,
    pub deviation: f64,
    pub transaction_ids: Vec<TransactionId>,
    pub vendor_ids: Vec<VendorId>,
}

#[derive(Debug, Clone)]
pub struct Anomaly {
    pub id: AnomalyId,
    pub budget_id: BudgetId,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub detected_at: DateTime<Utc>,
    pub detected_by: DetectedBy,
    pub status: AnomalyStatus,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<UserId>,
    pub resolution: Option<String>,
    pub data: AnomalyData,
}

// --

impl Anomaly {
    pub(crate) fn detected(
        budget_id: BudgetId,
        anomaly_type: AnomalyType,
        severity: Severity,
        title: String,
        description: String,
        data: AnomalyData,
    ) -> Self {
        Self {
            id: AnomalyId::generate(),
            budget_id,
            anomaly_type,
            severity,
            title,
            description,
            detected_at: Utc::now(),
            detected_by: DetectedBy::System,
            status: AnomalyStatus::Active,
            resolved_at: None,
            resolved_by: None,
            resolution: None,
            data,
        }
    }

    /// Active and investigating anomalies still need human attention.
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            AnomalyStatus::Active | AnomalyStatus::Investigating
        )
    }
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyType::BudgetOverrun => write!(f, "budget_overrun"),
            AnomalyType::UnusualSpending => write!(f, "unusual_spending"),
            AnomalyType::DuplicateTransaction => write!(f, "duplicate_transaction"),
            AnomalyType::SuspiciousActivity => write!(f, "suspicious_activity"),
            AnomalyType::VendorAnomaly => write!(f, "vendor_anomaly"),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::fmt::Display for AnomalyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyStatus::Active => write!(f, "active"),
            AnomalyStatus::Investigating => write!(f, "investigating"),
            AnomalyStatus::Resolved => write!(f, "resolved"),
            AnomalyStatus::FalsePositive => write!(f, "false_positive"),
        }
    }
}
