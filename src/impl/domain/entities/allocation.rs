use chrono::{DateTime, Utc};

use super::ids::{BudgetId, DepartmentId, ProjectId, UserId, VendorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentStatus {
    Active,
    Inactive,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    Planning,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorStatus {
    Active,
    Inactive,
    Blacklisted,
}

/// Sub-allocation of a budget.
#[derive(Debug, Clone)]
pub struct Department {
    pub id: DepartmentId,
    pub budget_id: BudgetId,
    pub name: String,
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
    pub status: DepartmentStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Sub-allocation of a department.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: ProjectId,
    pub department_id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
    pub status: ProjectStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Sub-allocation of a project.
#[derive(Debug, Clone)]
pub struct Vendor {
    pub id: VendorId,
    pub project_id: ProjectId,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub allocated_amount: f64,
    pub spent: f64,
    pub remaining: f64,
    pub status: VendorStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub budget_id: BudgetId,
    pub name: String,
    pub budget: f64,
    pub created_by: UserId,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub department_id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub budget: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_by: UserId,
}

#[derive(Debug, Clone)]
pub struct NewVendor {
    pub project_id: ProjectId,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub allocated_amount: f64,
    pub created_by: UserId,
}

// --

impl Department {
    pub fn new(spec: NewDepartment) -> Self {
        Self {
            id: DepartmentId::generate(),
            budget_id: spec.budget_id,
            name: spec.name,
            budget: spec.budget,
            spent: 0.0,
            remaining: spec.budget,
            status: DepartmentStatus::Active,
            created_by: spec.created_by,
            created_at: Utc::now(),
        }
    }
}

impl Project {
    pub fn new(spec: NewProject) -> Self {
        Self {
            id: ProjectId::generate(),
            department_id: spec.department_id,
            name: spec.name,
            description: spec.description,
            budget: spec.budget,
            spent: 0.0,
            remaining: spec.budget,
            status: ProjectStatus::Planning,
            start_date: spec.start_date,
            end_date: spec.end_date,
            created_by: spec.created_by,
            created_at: Utc::now(),
        }
    }
}

impl Vendor {
    pub fn new(spec: NewVendor) -> Self {
        Self {
            id: VendorId::generate(),
            project_id: spec.project_id,
            name: spec.name,
            contact_person: spec.contact_person,
            email: spec.email,
            phone: spec.phone,
            address: spec.address,
            allocated_amount: spec.allocated_amount,
            spent: 0.0,
            remaining: spec.allocated_amount,
            status: VendorStatus::Active,
            created_by: spec.created_by,
            created_at: Utc::now(),
        }
    }
}
