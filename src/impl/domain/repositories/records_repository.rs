use async_trait::async_trait;
use fractic_server_error::ServerError;

use crate::entities::{
    Anomaly, AnomalyId, AuditLogEntry, Budget, BudgetId, Department, DepartmentId, Project,
    ProjectId, Transaction, TransactionId, Vendor, VendorId,
};

#[async_trait]
pub trait BudgetRepository: Send + Sync {
    async fn get_budget(&self, id: &BudgetId) -> Result<Option<Budget>, ServerError>;
    async fn save_budget(&self, budget: Budget) -> Result<(), ServerError>;
    async fn list_budgets(&self) -> Result<Vec<Budget>, ServerError>;

    async fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>, ServerError>;
    async fn save_department(&self, department: Department) -> Result<(), ServerError>;
    async fn departments_for_budget(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Vec<Department>, ServerError>;

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, ServerError>;
    async fn save_project(&self, project: Project) -> Result<(), ServerError>;
    async fn projects_for_department(
        &self,
        department_id: &DepartmentId,
    ) -> Result<Vec<Project>, ServerError>;

    async fn get_vendor(&self, id: &VendorId) -> Result<Option<Vendor>, ServerError>;
    async fn save_vendor(&self, vendor: Vendor) -> Result<(), ServerError>;
    async fn vendors_for_project(&self, project_id: &ProjectId)
        -> Result<Vec<Vendor>, ServerError>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn get_transaction(&self, id: &TransactionId)
        -> Result<Option<Transaction>, ServerError>;
    async fn save_transaction(&self, transaction: Transaction) -> Result<(), ServerError>;

    /// Newest first (by creation time, then by insertion order), at most
    /// `limit` entries.
    async fn recent_transactions(
        &self,
        budget_id: &BudgetId,
        limit: usize,
    ) -> Result<Vec<Transaction>, ServerError>;

    async fn transactions_for_budget(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Vec<Transaction>, ServerError>;
}

#[async_trait]
pub trait AnomalyRepository: Send + Sync {
    async fn get_anomaly(&self, id: &AnomalyId) -> Result<Option<Anomaly>, ServerError>;
    async fn save_anomaly(&self, anomaly: Anomaly) -> Result<(), ServerError>;
    async fn anomalies_for_budget(&self, budget_id: &BudgetId)
        -> Result<Vec<Anomaly>, ServerError>;
}

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append_audit_entry(&self, entry: AuditLogEntry) -> Result<(), ServerError>;
    async fn audit_entries_for(&self, entity_id: &str) -> Result<Vec<AuditLogEntry>, ServerError>;
}

/// Everything the library persists. Backed by an external document store in
/// production; see `InMemoryRecordsRepository` for the reference
/// implementation.
pub trait RecordsRepository:
    BudgetRepository + TransactionRepository + AnomalyRepository + AuditLogRepository
{
}

impl<T> RecordsRepository for T where
    T: BudgetRepository + TransactionRepository + AnomalyRepository + AuditLogRepository
{
}
