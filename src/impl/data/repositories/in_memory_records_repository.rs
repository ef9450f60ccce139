use std::collections::HashMap;

use async_trait::async_trait;
use fractic_server_error::ServerError;
use tokio::sync::RwLock;

use crate::{
    domain::repositories::records_repository::{
        AnomalyRepository, AuditLogRepository, BudgetRepository, TransactionRepository,
    },
    entities::{
        Anomaly, AnomalyId, AuditLogEntry, Budget, BudgetId, Department, DepartmentId, Project,
        ProjectId, Transaction, TransactionId, Vendor, VendorId,
    },
};

#[derive(Default)]
struct Store {
    budgets: HashMap<BudgetId, Budget>,
    departments: HashMap<DepartmentId, Department>,
    projects: HashMap<ProjectId, Project>,
    vendors: HashMap<VendorId, Vendor>,
    // Kept in insertion order; recency queries depend on it for tie-breaking.
    transactions: Vec<Transaction>,
    anomalies: Vec<Anomaly>,
    audit_log: Vec<AuditLogEntry>,
}

/// Process-local store. Useful for tests and single-process deployments; all
/// records are lost when it is dropped.
#[derive(Default)]
pub struct InMemoryRecordsRepository {
    store: RwLock<Store>,
}

impl InMemoryRecordsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Oldest first.
fn sorted_by_creation<T, K: Ord>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut v: Vec<T> = items.collect();
    v.sort_by_key(key);
    v
}

#[async_trait]
impl BudgetRepository for InMemoryRecordsRepository {
    async fn get_budget(&self, id: &BudgetId) -> Result<Option<Budget>, ServerError> {
        Ok(self.store.read().await.budgets.get(id).cloned())
    }

    async fn save_budget(&self, budget: Budget) -> Result<(), ServerError> {
        self.store.write().await.budgets.insert(budget.id, budget);
        Ok(())
    }

    async fn list_budgets(&self) -> Result<Vec<Budget>, ServerError> {
        let store = self.store.read().await;
        Ok(sorted_by_creation(store.budgets.values().cloned(), |b| b.created_at))
    }

    async fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>, ServerError> {
        Ok(self.store.read().await.departments.get(id).cloned())
    }

    async fn save_department(&self, department: Department) -> Result<(), ServerError> {
        self.store
            .write()
            .await
            .departments
            .insert(department.id, department);
        Ok(())
    }

    async fn departments_for_budget(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Vec<Department>, ServerError> {
        let store = self.store.read().await;
        Ok(sorted_by_creation(
            store
                .departments
                .values()
                .filter(|d| &d.budget_id == budget_id)
                .cloned(),
            |d| d.created_at,
        ))
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, ServerError> {
        Ok(self.store.read().await.projects.get(id).cloned())
    }

    async fn save_project(&self, project: Project) -> Result<(), ServerError> {
        self.store.write().await.projects.insert(project.id, project);
        Ok(())
    }

    async fn projects_for_department(
        &self,
        department_id: &DepartmentId,
    ) -> Result<Vec<Project>, ServerError> {
        let store = self.store.read().await;
        Ok(sorted_by_creation(
            store
                .projects
                .values()
                .filter(|p| &p.department_id == department_id)
                .cloned(),
            |p| p.created_at,
        ))
    }

    async fn get_vendor(&self, id: &VendorId) -> Result<Option<Vendor>, ServerError> {
        Ok(self.store.read().await.vendors.get(id).cloned())
    }

    async fn save_vendor(&self, vendor: Vendor) -> Result<(), ServerError> {
        self.store.write().await.vendors.insert(vendor.id, vendor);
        Ok(())
    }

    async fn vendors_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<Vendor>, ServerError> {
        let store = self.store.read().await;
        Ok(sorted_by_creation(
            store
                .vendors
                .values()
                .filter(|v| &v.project_id == project_id)
                .cloned(),
            |v| v.created_at,
        ))
    }
}

#[async_trait]
impl TransactionRepository for InMemoryRecordsRepository {
    async fn get_transaction(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, ServerError> {
        let store = self.store.read().await;
        Ok(store.transactions.iter().find(|t| &t.id == id).cloned())
    }

    async fn save_transaction(&self, transaction: Transaction) -> Result<(), ServerError> {
        let mut store = self.store.write().await;
        match store.transactions.iter_mut().find(|t| t.id == transaction.id) {
            Some(existing) => *existing = transaction,
            None => store.transactions.push(transaction),
        }
        Ok(())
    }

    async fn recent_transactions(
        &self,
        budget_id: &BudgetId,
        limit: usize,
    ) -> Result<Vec<Transaction>, ServerError> {
        let store = self.store.read().await;
        // Reverse insertion order first so the stable sort breaks timestamp
        // ties in favour of the latest insert.
        let mut v: Vec<Transaction> = store
            .transactions
            .iter()
            .rev()
            .filter(|t| &t.budget_id == budget_id)
            .cloned()
            .collect();
        v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        v.truncate(limit);
        Ok(v)
    }

    async fn transactions_for_budget(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Vec<Transaction>, ServerError> {
        let store = self.store.read().await;
        Ok(store
            .transactions
            .iter()
            .filter(|t| &t.budget_id == budget_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AnomalyRepository for InMemoryRecordsRepository {
    async fn get_anomaly(&self, id: &AnomalyId) -> Result<Option<Anomaly>, ServerError> {
        let store = self.store.read().await;
        Ok(store.anomalies.iter().find(|a| &a.id == id).cloned())
    }

    async fn save_anomaly(&self, anomaly: Anomaly) -> Result<(), ServerError> {
        let mut store = self.store.write().await;
        match store.anomalies.iter_mut().find(|a| a.id == anomaly.id) {
            Some(existing) => *existing = anomaly,
            None => store.anomalies.push(anomaly),
        }
        Ok(())
    }

    async fn anomalies_for_budget(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Vec<Anomaly>, ServerError> {
        let store = self.store.read().await;
        Ok(store
            .anomalies
            .iter()
            .filter(|a| &a.budget_id == budget_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryRecordsRepository {
    async fn append_audit_entry(&self, entry: AuditLogEntry) -> Result<(), ServerError> {
        self.store.write().await.audit_log.push(entry);
        Ok(())
    }

    async fn audit_entries_for(&self, entity_id: &str) -> Result<Vec<AuditLogEntry>, ServerError> {
        let store = self.store.read().await;
        Ok(store
            .audit_log
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect())
    }
}
