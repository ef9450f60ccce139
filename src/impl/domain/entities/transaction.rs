use chrono::{DateTime, Utc};
use fractic_server_error::ServerError;

use crate::{domain::logic::utils::sha256_hex, errors::NonPositiveAmount};

use super::{
    anomaly::Anomaly,
    ids::{BudgetId, DepartmentId, ProjectId, TransactionId, UserId, VendorId},
    ledger::StoreOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct Receipt {
    pub url: String,
    pub public_id: Option<String>,
    pub filename: Option<String>,
    pub mimetype: Option<String>,
    pub size: Option<u64>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ApprovalComment {
    pub comment: String,
    pub commented_by: UserId,
    pub commented_at: DateTime<Utc>,
}

/// Where the most recent ledger record of this transaction was sealed.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReference {
    pub ledger_id: String,
    pub block_hash: String,
    pub block_index: u64,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub amount: f64,
    pub budget_id: BudgetId,
    pub vendor_id: Option<VendorId>,
    pub project_id: Option<ProjectId>,
    pub department_id: Option<DepartmentId>,
    pub status: TransactionStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub receipt: Option<Receipt>,
    pub transaction_hash: String,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_comments: Vec<ApprovalComment>,
    /// None if the ledger was unavailable when the transaction was recorded.
    pub ledger: Option<LedgerReference>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub budget_id: BudgetId,
    pub vendor_id: Option<VendorId>,
    pub project_id: Option<ProjectId>,
    pub department_id: Option<DepartmentId>,
    pub created_by: UserId,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub receipt: Option<Receipt>,
    /// Defaults to now. Set when importing historical records.
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of a submission or decision: the stored transaction, what happened
/// when it was written to the ledger, and any anomalies the write surfaced.
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub transaction: Transaction,
    pub ledger: StoreOutcome,
    pub anomalies: Vec<Anomaly>,
}

// --

impl Transaction {
    /// Builds a pending transaction from a submission. Fails if the amount is
    /// not strictly positive.
    pub fn pending(spec: NewTransaction) -> Result<Self, ServerError> {
        spec.validate_amount()?;
        let created_at = spec.created_at.unwrap_or_else(Utc::now);
        let transaction_hash = sha256_hex(format!(
            "{}-{}-{}",
            spec.description,
            spec.amount,
            created_at.timestamp_millis()
        ));
        Ok(Self {
            id: TransactionId::generate(),
            description: spec.description,
            amount: spec.amount,
            budget_id: spec.budget_id,
            vendor_id: spec.vendor_id,
            project_id: spec.project_id,
            department_id: spec.department_id,
            status: TransactionStatus::Pending,
            created_by: spec.created_by,
            created_at,
            category: spec.category,
            notes: spec.notes,
            receipt: spec.receipt,
            transaction_hash,
            approved_by: None,
            approved_at: None,
            approval_comments: Vec::new(),
            ledger: None,
        })
    }

    pub fn is_approved(&self) -> bool {
        self.status == TransactionStatus::Approved
    }
}

impl NewTransaction {
    pub(crate) fn validate_amount(&self) -> Result<(), ServerError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(NonPositiveAmount::new(self.amount));
        }
        Ok(())
    }

    pub fn new(
        budget_id: BudgetId,
        description: impl Into<String>,
        amount: f64,
        created_by: UserId,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            budget_id,
            vendor_id: None,
            project_id: None,
            department_id: None,
            created_by,
            category: None,
            notes: None,
            receipt: None,
            created_at: None,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Approved => write!(f, "approved"),
            TransactionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_rejects_non_positive_amount() {
        let spec = NewTransaction::new(BudgetId::generate(), "Cement", 0.0, UserId::generate());
        assert!(Transaction::pending(spec).is_err());

        let spec = NewTransaction::new(BudgetId::generate(), "Cement", -5.0, UserId::generate());
        assert!(Transaction::pending(spec).is_err());
    }

    #[test]
    fn test_pending_fingerprints_submission() {
        let spec = NewTransaction::new(BudgetId::generate(), "Cement", 1200.0, UserId::generate());
        let tx = Transaction::pending(spec).unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.transaction_hash.len(), 64);
        assert!(tx.ledger.is_none());
    }
}
