use fractic_server_error::{define_client_error, define_internal_error};

use crate::entities::{AnomalyId, BudgetId, DepartmentId, ProjectId, TransactionId, VendorId};

// IO-related.
define_client_error!(ReadError, "Error reading file.");
define_internal_error!(WriteError, "Error writing file.");

// Parsing-related.
define_client_error!(InvalidCsv, "Invalid CSV format.");
define_client_error!(InvalidCsvContent, "Invalid CSV content: {details}.", { details: &str });
define_client_error!(InvalidRon, "Invalid {ron_type} (invalid RON format).", { ron_type: &str });
define_client_error!(InvalidIsoDate, "Invalid ISO date: {date}.", { date: &str });
define_client_error!(InvalidAmount, "Invalid amount: '{value}'.", { value: &str });
define_client_error!(
    InvalidSearchQuery,
    "Search query '{query}' could not be compiled.",
    { query: &str }
);

// Records.
define_client_error!(BudgetNotFound, "Budget '{id}' not found.", { id: &BudgetId });
define_client_error!(DepartmentNotFound, "Department '{id}' not found.", { id: &DepartmentId });
define_client_error!(ProjectNotFound, "Project '{id}' not found.", { id: &ProjectId });
define_client_error!(VendorNotFound, "Vendor '{id}' not found.", { id: &VendorId });
define_client_error!(
    TransactionNotFound,
    "Transaction '{id}' not found.",
    { id: &TransactionId }
);
define_client_error!(AnomalyNotFound, "Anomaly '{id}' not found.", { id: &AnomalyId });

// Transaction workflow.
define_client_error!(
    NonPositiveAmount,
    "Transaction amount must be positive (got {amount}).",
    { amount: f64 }
);
define_client_error!(
    InvalidStatusTransition,
    "Transaction '{id}' cannot move from '{from}' to '{to}'; only pending transactions can be decided.",
    { id: &TransactionId, from: &str, to: &str }
);
define_client_error!(
    ForeignAllocation,
    "{kind} '{id}' does not belong to {parent}.",
    { kind: &str, id: &str, parent: &str }
);
define_client_error!(
    NonPositiveAllocation,
    "Allocation for '{name}' must be positive (got {amount}).",
    { name: &str, amount: f64 }
);

// Aggregation-related.
define_client_error!(
    AllocationExceedsBudget,
    "Requested allocation of {requested} exceeds the remaining headroom of '{parent}'. Available: {available}.",
    { parent: &str, requested: f64, available: f64 }
);

// Ledger-related.
define_client_error!(
    InvalidDifficulty,
    "Ledger difficulty {difficulty} is out of range (max 64 hex digits).",
    { difficulty: usize }
);
define_internal_error!(
    LedgerSerializationFailed,
    "Failed to serialize ledger {what}.",
    { what: &str }
);
define_client_error!(
    LedgerIntegrityViolation,
    "Ledger failed integrity check: {details}.",
    { details: &str }
);
