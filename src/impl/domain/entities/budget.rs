use chrono::{DateTime, Utc};
use iso_currency::Currency;

use super::{
    allocation::Department,
    ids::{BudgetId, DepartmentId, UserId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Ongoing,
    Finished,
}

/// Line item listed on a published budget (informational only; does not
/// contribute to `spent`).
#[derive(Debug, Clone)]
pub struct BudgetExpense {
    pub description: String,
    pub amount: f64,
    pub allocated_to: String,
}

#[derive(Debug, Clone)]
pub struct Budget {
    pub id: BudgetId,
    pub name: String,
    pub department: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub fiscal_year: Option<String>,
    pub currency: Currency,
    pub total_budget: f64,
    /// Derived from approved transactions. Only the aggregation logic writes
    /// this field.
    pub spent: f64,
    pub remaining: f64,
    pub status: BudgetStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub expenses: Vec<BudgetExpense>,
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub name: String,
    pub department: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub fiscal_year: Option<String>,
    pub currency: Currency,
    pub total_budget: f64,
    pub status: BudgetStatus,
    pub created_by: UserId,
    pub expenses: Vec<BudgetExpense>,
}

#[derive(Debug, Clone)]
pub struct DepartmentBreakdown {
    pub department_id: DepartmentId,
    pub name: String,
    pub allocated: f64,
    pub spent: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone)]
pub struct BudgetSummary {
    pub budget_id: BudgetId,
    pub name: String,
    pub currency: Currency,
    pub total_budget: f64,
    pub spent: f64,
    pub remaining: f64,
    /// spent / total_budget (0 when nothing was allocated).
    pub utilization: f64,
    pub unallocated: f64,
    pub departments: Vec<DepartmentBreakdown>,
}

// --

impl Budget {
    pub fn new(spec: NewBudget) -> Self {
        Self {
            id: BudgetId::generate(),
            name: spec.name,
            department: spec.department,
            state: spec.state,
            country: spec.country,
            fiscal_year: spec.fiscal_year,
            currency: spec.currency,
            total_budget: spec.total_budget,
            spent: 0.0,
            remaining: spec.total_budget,
            status: spec.status,
            created_by: spec.created_by,
            created_at: Utc::now(),
            expenses: spec.expenses,
        }
    }

    pub fn spent_ratio(&self) -> Option<f64> {
        if self.total_budget > 0.0 {
            Some(self.spent / self.total_budget)
        } else {
            None
        }
    }
}

impl DepartmentBreakdown {
    pub(crate) fn of(department: &Department) -> Self {
        Self {
            department_id: department.id,
            name: department.name.clone(),
            allocated: department.budget,
            spent: department.spent,
            remaining: department.remaining,
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetStatus::Draft => write!(f, "draft"),
            BudgetStatus::Pending => write!(f, "pending"),
            BudgetStatus::Approved => write!(f, "approved"),
            BudgetStatus::Rejected => write!(f, "rejected"),
            BudgetStatus::Ongoing => write!(f, "ongoing"),
            BudgetStatus::Finished => write!(f, "finished"),
        }
    }
}
