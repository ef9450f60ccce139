use std::sync::Arc;

use fractic_server_error::ServerError;
use tokio::sync::Mutex;

use crate::{
    domain::repositories::records_repository::RecordsRepository,
    entities::{
        AuditAction, AuditEntityType, AuditLogEntry, Budget, BudgetId, BudgetSummary, Department,
        DepartmentBreakdown, NewBudget, NewDepartment, NewProject, NewVendor, Project,
        Transaction, UserId, Vendor,
    },
    errors::{
        AllocationExceedsBudget, BudgetNotFound, DepartmentNotFound, NonPositiveAllocation,
        ProjectNotFound,
    },
};

/// Tolerance for float noise when comparing allocation sums.
const ALLOCATION_EPSILON: f64 = 1e-6;

/// Fails if `requested` does not fit in what is left of `parent_total` after
/// the `existing` sibling allocations.
pub(crate) fn check_allocation(
    parent: &str,
    parent_total: f64,
    existing: impl IntoIterator<Item = f64>,
    requested: f64,
) -> Result<(), ServerError> {
    let allocated: f64 = existing.into_iter().sum();
    let available = parent_total - allocated;
    if requested > available + ALLOCATION_EPSILON {
        return Err(AllocationExceedsBudget::new(parent, requested, available));
    }
    Ok(())
}

fn approved_total<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    filter: impl Fn(&Transaction) -> bool,
) -> f64 {
    transactions
        .into_iter()
        .filter(|t| t.is_approved() && filter(t))
        .map(|t| t.amount)
        .sum()
}

fn positive(name: &str, amount: f64) -> Result<(), ServerError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(NonPositiveAllocation::new(name, amount));
    }
    Ok(())
}

/// Keeps `spent`/`remaining` of budgets and their sub-allocations in line with
/// the approved transactions.
///
/// Totals are always recomputed from the full transaction set; nothing is
/// updated incrementally. Recomputes and allocation checks are serialised
/// through a single lock, so two concurrent writers cannot overwrite each
/// other's result with a stale total.
pub(crate) struct BudgetAggregator<R: RecordsRepository> {
    repository: Arc<R>,
    lock: Mutex<()>,
}

impl<R: RecordsRepository> BudgetAggregator<R> {
    pub(crate) fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            lock: Mutex::new(()),
        }
    }

    pub(crate) async fn create_budget(&self, spec: NewBudget) -> Result<Budget, ServerError> {
        positive(&spec.name, spec.total_budget)?;
        let budget = Budget::new(spec);
        self.repository.save_budget(budget.clone()).await?;
        self.audit_create(AuditEntityType::Budget, budget.id, &budget.name, budget.created_by)
            .await?;
        Ok(budget)
    }

    pub(crate) async fn create_department(
        &self,
        spec: NewDepartment,
    ) -> Result<Department, ServerError> {
        positive(&spec.name, spec.budget)?;
        let _guard = self.lock.lock().await;
        let budget = self
            .repository
            .get_budget(&spec.budget_id)
            .await?
            .ok_or_else(|| BudgetNotFound::new(&spec.budget_id))?;
        let siblings = self.repository.departments_for_budget(&budget.id).await?;
        check_allocation(
            &budget.name,
            budget.total_budget,
            siblings.iter().map(|d| d.budget),
            spec.budget,
        )?;

        let department = Department::new(spec);
        self.repository.save_department(department.clone()).await?;
        self.audit_create(AuditEntityType::Department, department.id, &department.name, department.created_by)
            .await?;
        Ok(department)
    }

    pub(crate) async fn create_project(&self, spec: NewProject) -> Result<Project, ServerError> {
        positive(&spec.name, spec.budget)?;
        let _guard = self.lock.lock().await;
        let department = self
            .repository
            .get_department(&spec.department_id)
            .await?
            .ok_or_else(|| DepartmentNotFound::new(&spec.department_id))?;
        let siblings = self
            .repository
            .projects_for_department(&department.id)
            .await?;
        check_allocation(
            &department.name,
            department.budget,
            siblings.iter().map(|p| p.budget),
            spec.budget,
        )?;

        let project = Project::new(spec);
        self.repository.save_project(project.clone()).await?;
        self.audit_create(AuditEntityType::Project, project.id, &project.name, project.created_by)
            .await?;
        Ok(project)
    }

    pub(crate) async fn create_vendor(&self, spec: NewVendor) -> Result<Vendor, ServerError> {
        positive(&spec.name, spec.allocated_amount)?;
        let _guard = self.lock.lock().await;
        let project = self
            .repository
            .get_project(&spec.project_id)
            .await?
            .ok_or_else(|| ProjectNotFound::new(&spec.project_id))?;
        let siblings = self.repository.vendors_for_project(&project.id).await?;
        check_allocation(
            &project.name,
            project.budget,
            siblings.iter().map(|v| v.allocated_amount),
            spec.allocated_amount,
        )?;

        let vendor = Vendor::new(spec);
        self.repository.save_vendor(vendor.clone()).await?;
        self.audit_create(AuditEntityType::Vendor, vendor.id, &vendor.name, vendor.created_by)
            .await?;
        Ok(vendor)
    }

    async fn audit_create(
        &self,
        entity_type: AuditEntityType,
        entity_id: impl ToString,
        name: &str,
        user_id: UserId,
    ) -> Result<(), ServerError> {
        self.repository
            .append_audit_entry(AuditLogEntry::new(
                AuditAction::Create,
                entity_type,
                entity_id,
                name,
                user_id,
            ))
            .await
    }

    /// Recomputes spent/remaining for the budget and every department, project
    /// and vendor below it. Records are only written when a value changed.
    pub(crate) async fn reconcile_budget(&self, budget_id: &BudgetId) -> Result<Budget, ServerError> {
        let _guard = self.lock.lock().await;
        let mut budget = self
            .repository
            .get_budget(budget_id)
            .await?
            .ok_or_else(|| BudgetNotFound::new(budget_id))?;
        let transactions = self.repository.transactions_for_budget(budget_id).await?;

        let spent = approved_total(&transactions, |_| true);
        if budget.spent != spent || budget.remaining != budget.total_budget - spent {
            tracing::debug!(
                %budget_id,
                previous = budget.spent,
                recomputed = spent,
                "reconciling budget spend"
            );
            budget.spent = spent;
            budget.remaining = budget.total_budget - spent;
            self.repository.save_budget(budget.clone()).await?;
        }

        for mut department in self.repository.departments_for_budget(budget_id).await? {
            let spent = approved_total(&transactions, |t| t.department_id == Some(department.id));
            if department.spent != spent {
                department.spent = spent;
                department.remaining = department.budget - spent;
                self.repository.save_department(department.clone()).await?;
            }

            for mut project in self
                .repository
                .projects_for_department(&department.id)
                .await?
            {
                let spent = approved_total(&transactions, |t| t.project_id == Some(project.id));
                if project.spent != spent {
                    project.spent = spent;
                    project.remaining = project.budget - spent;
                    self.repository.save_project(project.clone()).await?;
                }

                for mut vendor in self.repository.vendors_for_project(&project.id).await? {
                    let spent = approved_total(&transactions, |t| t.vendor_id == Some(vendor.id));
                    if vendor.spent != spent {
                        vendor.spent = spent;
                        vendor.remaining = vendor.allocated_amount - spent;
                        self.repository.save_vendor(vendor).await?;
                    }
                }
            }
        }

        Ok(budget)
    }

    pub(crate) async fn budget_summary(
        &self,
        budget_id: &BudgetId,
    ) -> Result<BudgetSummary, ServerError> {
        let budget = self.reconcile_budget(budget_id).await?;
        let departments = self.repository.departments_for_budget(budget_id).await?;
        let allocated: f64 = departments.iter().map(|d| d.budget).sum();
        Ok(BudgetSummary {
            budget_id: budget.id,
            name: budget.name.clone(),
            currency: budget.currency,
            total_budget: budget.total_budget,
            spent: budget.spent,
            remaining: budget.remaining,
            utilization: budget.spent_ratio().unwrap_or(0.0),
            unallocated: budget.total_budget - allocated,
            departments: departments.iter().map(DepartmentBreakdown::of).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use iso_currency::Currency;

    use super::*;
    use crate::{
        data::repositories::in_memory_records_repository::InMemoryRecordsRepository,
        domain::repositories::records_repository::{
            AuditLogRepository as _, BudgetRepository as _, TransactionRepository as _,
        },
        entities::{BudgetStatus, NewTransaction, TransactionStatus, UserId},
    };

    fn new_budget(total: f64) -> NewBudget {
        NewBudget {
            name: "District Health 2025".to_string(),
            department: Some("Health".to_string()),
            state: Some("Kerala".to_string()),
            country: Some("India".to_string()),
            fiscal_year: Some("2025-26".to_string()),
            currency: Currency::INR,
            total_budget: total,
            status: BudgetStatus::Approved,
            created_by: UserId::generate(),
            expenses: vec![],
        }
    }

    fn new_department(budget_id: BudgetId, name: &str, amount: f64) -> NewDepartment {
        NewDepartment {
            budget_id,
            name: name.to_string(),
            budget: amount,
            created_by: UserId::generate(),
        }
    }

    #[test]
    fn test_check_allocation() {
        assert!(check_allocation("Roads", 1000.0, vec![400.0, 300.0], 300.0).is_ok());
        assert!(check_allocation("Roads", 1000.0, vec![400.0, 300.0], 300.01).is_err());
        assert!(check_allocation("Roads", 0.3, vec![0.1, 0.1], 0.1).is_ok());
    }

    #[tokio::test]
    async fn test_department_allocation_headroom() {
        let repo = Arc::new(InMemoryRecordsRepository::new());
        let aggregator = BudgetAggregator::new(repo.clone());
        let budget = aggregator.create_budget(new_budget(100_000.0)).await.unwrap();

        aggregator
            .create_department(new_department(budget.id, "Clinics", 60_000.0))
            .await
            .unwrap();
        aggregator
            .create_department(new_department(budget.id, "Ambulances", 40_000.0))
            .await
            .unwrap();
        assert!(aggregator
            .create_department(new_department(budget.id, "Outreach", 1.0))
            .await
            .is_err());
        assert!(aggregator
            .create_department(new_department(BudgetId::generate(), "Orphan", 1.0))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_project_and_vendor_allocation_headroom() {
        let repo = Arc::new(InMemoryRecordsRepository::new());
        let aggregator = BudgetAggregator::new(repo.clone());
        let budget = aggregator.create_budget(new_budget(100_000.0)).await.unwrap();
        let department = aggregator
            .create_department(new_department(budget.id, "Clinics", 50_000.0))
            .await
            .unwrap();

        let project = aggregator
            .create_project(NewProject {
                department_id: department.id,
                name: "Rural clinic refit".to_string(),
                description: None,
                budget: 30_000.0,
                start_date: None,
                end_date: None,
                created_by: UserId::generate(),
            })
            .await
            .unwrap();
        let over = aggregator
            .create_project(NewProject {
                department_id: department.id,
                name: "Second refit".to_string(),
                description: None,
                budget: 20_001.0,
                start_date: None,
                end_date: None,
                created_by: UserId::generate(),
            })
            .await;
        assert!(over.is_err());

        let vendor_spec = |amount: f64| NewVendor {
            project_id: project.id,
            name: "MedSupply Ltd".to_string(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
            allocated_amount: amount,
            created_by: UserId::generate(),
        };
        aggregator.create_vendor(vendor_spec(30_000.0)).await.unwrap();
        assert!(aggregator.create_vendor(vendor_spec(1.0)).await.is_err());
        assert!(aggregator.create_vendor(vendor_spec(0.0)).await.is_err());
    }

    #[tokio::test]
    async fn test_creates_are_audited() {
        let repo = Arc::new(InMemoryRecordsRepository::new());
        let aggregator = BudgetAggregator::new(repo.clone());
        let budget = aggregator.create_budget(new_budget(100_000.0)).await.unwrap();
        let department = aggregator
            .create_department(new_department(budget.id, "Clinics", 50_000.0))
            .await
            .unwrap();
        let project = aggregator
            .create_project(NewProject {
                department_id: department.id,
                name: "Rural clinic refit".to_string(),
                description: None,
                budget: 30_000.0,
                start_date: None,
                end_date: None,
                created_by: UserId::generate(),
            })
            .await
            .unwrap();
        let vendor = aggregator
            .create_vendor(NewVendor {
                project_id: project.id,
                name: "MedSupply Ltd".to_string(),
                contact_person: None,
                email: None,
                phone: None,
                address: None,
                allocated_amount: 10_000.0,
                created_by: UserId::generate(),
            })
            .await
            .unwrap();

        let cases = [
            (budget.id.to_string(), AuditEntityType::Budget, budget.created_by),
            (department.id.to_string(), AuditEntityType::Department, department.created_by),
            (project.id.to_string(), AuditEntityType::Project, project.created_by),
            (vendor.id.to_string(), AuditEntityType::Vendor, vendor.created_by),
        ];
        for (entity_id, entity_type, user_id) in cases {
            let entries = repo.audit_entries_for(&entity_id).await.unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].action, AuditAction::Create);
            assert_eq!(entries[0].entity_type, entity_type);
            assert_eq!(entries[0].user_id, user_id);
        }

        // A rejected allocation leaves no trail.
        let rejected = new_department(budget.id, "Outreach", 60_000.0);
        assert!(aggregator.create_department(rejected).await.is_err());
        let all_for_budget = repo.audit_entries_for(&budget.id.to_string()).await.unwrap();
        assert_eq!(all_for_budget.len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_counts_only_approved_transactions() {
        let repo = Arc::new(InMemoryRecordsRepository::new());
        let aggregator = BudgetAggregator::new(repo.clone());
        let budget = aggregator.create_budget(new_budget(10_000.0)).await.unwrap();
        let department = aggregator
            .create_department(new_department(budget.id, "Clinics", 5_000.0))
            .await
            .unwrap();

        for (amount, status) in [
            (1_000.0, TransactionStatus::Approved),
            (2_500.0, TransactionStatus::Approved),
            (4_000.0, TransactionStatus::Pending),
            (3_000.0, TransactionStatus::Rejected),
        ] {
            let mut spec = NewTransaction::new(budget.id, "Supplies", amount, UserId::generate());
            spec.department_id = Some(department.id);
            let mut tx = Transaction::pending(spec).unwrap();
            tx.status = status;
            repo.save_transaction(tx).await.unwrap();
        }

        let reconciled = aggregator.reconcile_budget(&budget.id).await.unwrap();
        assert_eq!(reconciled.spent, 3_500.0);
        assert_eq!(reconciled.remaining, 6_500.0);

        let stored = repo.get_budget(&budget.id).await.unwrap().unwrap();
        assert_eq!(stored.spent, 3_500.0);

        let department = repo.get_department(&department.id).await.unwrap().unwrap();
        assert_eq!(department.spent, 3_500.0);
        assert_eq!(department.remaining, 1_500.0);

        let summary = aggregator.budget_summary(&budget.id).await.unwrap();
        assert_eq!(summary.utilization, 0.35);
        assert_eq!(summary.unallocated, 5_000.0);
        assert_eq!(summary.departments.len(), 1);
    }
}
