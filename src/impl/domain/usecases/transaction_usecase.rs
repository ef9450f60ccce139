use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fractic_server_error::ServerError;
use tokio::sync::Mutex;

use crate::{
    data::datasources::transactions_csv_datasource::{
        TransactionsCsvDatasource as _, TransactionsCsvDatasourceImpl,
    },
    domain::{
        logic::{
            aggregation::BudgetAggregator, anomaly_detector::AnomalyDetector,
            fuzzy_search::FuzzyMatcher, ledger_recorder::LedgerRecorder,
        },
        repositories::records_repository::RecordsRepository,
    },
    entities::{
        ApprovalComment, AuditAction, AuditEntityType, AuditLogEntry, BudgetId, LedgerReference,
        NewTransaction, StoreOutcome, Transaction, TransactionId, TransactionOutcome,
        TransactionStatus, UserId,
    },
    errors::{
        BudgetNotFound, DepartmentNotFound, ForeignAllocation, InvalidStatusTransition,
        ProjectNotFound, TransactionNotFound, VendorNotFound,
    },
};

#[async_trait]
pub trait TransactionUsecase: Send + Sync {
    async fn submit_transaction(
        &self,
        spec: NewTransaction,
    ) -> Result<TransactionOutcome, ServerError>;

    async fn approve_transaction(
        &self,
        id: &TransactionId,
        approver: UserId,
        comment: Option<String>,
    ) -> Result<TransactionOutcome, ServerError>;

    async fn reject_transaction(
        &self,
        id: &TransactionId,
        approver: UserId,
        comment: Option<String>,
    ) -> Result<TransactionOutcome, ServerError>;

    async fn import_transactions_csv(
        &self,
        csv: &str,
        budget_id: BudgetId,
        created_by: UserId,
    ) -> Result<Vec<TransactionOutcome>, ServerError>;

    async fn search_transactions(
        &self,
        budget_id: &BudgetId,
        query: &str,
    ) -> Result<Vec<Transaction>, ServerError>;
}

pub(crate) struct TransactionUsecaseImpl<R: RecordsRepository> {
    repository: Arc<R>,
    recorder: Arc<LedgerRecorder>,
    aggregator: Arc<BudgetAggregator<R>>,
    detector: Arc<AnomalyDetector<R>>,
    csv_datasource: TransactionsCsvDatasourceImpl,
    // Held while a pending transaction is being decided, so two concurrent
    // decisions cannot both observe it as pending.
    decision_lock: Mutex<()>,
}

impl<R: RecordsRepository> TransactionUsecaseImpl<R> {
    pub(crate) fn new(
        repository: Arc<R>,
        recorder: Arc<LedgerRecorder>,
        aggregator: Arc<BudgetAggregator<R>>,
        detector: Arc<AnomalyDetector<R>>,
    ) -> Self {
        Self {
            repository,
            recorder,
            aggregator,
            detector,
            csv_datasource: TransactionsCsvDatasourceImpl::new(),
            decision_lock: Mutex::new(()),
        }
    }

    /// Every referenced allocation must exist and sit under the transaction's
    /// budget: department in the budget, project in the department, vendor in
    /// the project. When an intermediate level is omitted the chain is
    /// followed upwards instead.
    async fn validate_references(&self, spec: &NewTransaction) -> Result<(), ServerError> {
        if self.repository.get_budget(&spec.budget_id).await?.is_none() {
            return Err(BudgetNotFound::new(&spec.budget_id));
        }

        let mut project_id = spec.project_id;
        if let Some(id) = &spec.vendor_id {
            let vendor = self
                .repository
                .get_vendor(id)
                .await?
                .ok_or_else(|| VendorNotFound::new(id))?;
            match project_id {
                Some(p) if p != vendor.project_id => {
                    return Err(ForeignAllocation::new(
                        "Vendor",
                        &id.to_string(),
                        &format!("project '{}'", p),
                    ));
                }
                _ => project_id = Some(vendor.project_id),
            }
        }

        let mut department_id = spec.department_id;
        if let Some(id) = &project_id {
            let project = self
                .repository
                .get_project(id)
                .await?
                .ok_or_else(|| ProjectNotFound::new(id))?;
            match department_id {
                Some(d) if d != project.department_id => {
                    return Err(ForeignAllocation::new(
                        "Project",
                        &id.to_string(),
                        &format!("department '{}'", d),
                    ));
                }
                _ => department_id = Some(project.department_id),
            }
        }

        if let Some(id) = &department_id {
            let department = self
                .repository
                .get_department(id)
                .await?
                .ok_or_else(|| DepartmentNotFound::new(id))?;
            if department.budget_id != spec.budget_id {
                return Err(ForeignAllocation::new(
                    "Department",
                    &id.to_string(),
                    &format!("budget '{}'", spec.budget_id),
                ));
            }
        }
        Ok(())
    }

    /// Writes the current state of the transaction to the ledger and keeps a
    /// reference to the sealed block. Ledger failures are logged and otherwise
    /// ignored: the transaction is already persisted.
    async fn record_in_ledger(
        &self,
        transaction: &mut Transaction,
    ) -> Result<StoreOutcome, ServerError> {
        let outcome = self.recorder.store_transaction(transaction).await;
        match &outcome {
            StoreOutcome::Stored(stored) => {
                transaction.ledger = Some(LedgerReference {
                    ledger_id: stored.transaction_id.clone(),
                    block_hash: stored.block_hash.clone(),
                    block_index: stored.block_index,
                });
                self.repository.save_transaction(transaction.clone()).await?;
            }
            StoreOutcome::Failed { error } => {
                tracing::warn!(
                    transaction_id = %transaction.id,
                    "transaction saved without ledger record: {}",
                    error
                );
            }
        }
        Ok(outcome)
    }

    async fn decide(
        &self,
        id: &TransactionId,
        approver: UserId,
        comment: Option<String>,
        decision: TransactionStatus,
    ) -> Result<TransactionOutcome, ServerError> {
        let mut transaction = {
            let _guard = self.decision_lock.lock().await;
            let mut transaction = self
                .repository
                .get_transaction(id)
                .await?
                .ok_or_else(|| TransactionNotFound::new(id))?;
            if transaction.status != TransactionStatus::Pending {
                return Err(InvalidStatusTransition::new(
                    id,
                    &transaction.status.to_string(),
                    &decision.to_string(),
                ));
            }

            let now = Utc::now();
            transaction.status = decision;
            transaction.approved_by = Some(approver);
            transaction.approved_at = Some(now);
            if let Some(comment) = comment {
                transaction.approval_comments.push(ApprovalComment {
                    comment,
                    commented_by: approver,
                    commented_at: now,
                });
            }
            self.repository.save_transaction(transaction.clone()).await?;
            transaction
        };

        let ledger = self.record_in_ledger(&mut transaction).await?;
        let action = match decision {
            TransactionStatus::Approved => AuditAction::Approve,
            _ => AuditAction::Reject,
        };
        self.repository
            .append_audit_entry(
                AuditLogEntry::new(
                    action,
                    AuditEntityType::Transaction,
                    id,
                    &transaction.description,
                    approver,
                )
                .with_change(
                    Some(TransactionStatus::Pending.to_string()),
                    Some(decision.to_string()),
                ),
            )
            .await?;
        tracing::info!(transaction_id = %id, status = %decision, "transaction decided");

        // Only an approval changes spend; the transaction itself was already
        // checked for spikes and duplicates when it was submitted.
        self.aggregator
            .reconcile_budget(&transaction.budget_id)
            .await?;
        let anomalies = match decision {
            TransactionStatus::Approved => self
                .detector
                .detect_overrun_escalation(&transaction.budget_id)
                .await
                .into_iter()
                .collect(),
            _ => Vec::new(),
        };
        Ok(TransactionOutcome {
            transaction,
            ledger,
            anomalies,
        })
    }
}

#[async_trait]
impl<R: RecordsRepository + 'static> TransactionUsecase for TransactionUsecaseImpl<R> {
    async fn submit_transaction(
        &self,
        spec: NewTransaction,
    ) -> Result<TransactionOutcome, ServerError> {
        self.validate_references(&spec).await?;
        let mut transaction = Transaction::pending(spec)?;
        self.repository.save_transaction(transaction.clone()).await?;

        let ledger = self.record_in_ledger(&mut transaction).await?;
        self.repository
            .append_audit_entry(AuditLogEntry::new(
                AuditAction::Create,
                AuditEntityType::Transaction,
                transaction.id,
                &transaction.description,
                transaction.created_by,
            ))
            .await?;
        tracing::info!(
            transaction_id = %transaction.id,
            budget_id = %transaction.budget_id,
            amount = transaction.amount,
            "transaction submitted"
        );

        self.aggregator
            .reconcile_budget(&transaction.budget_id)
            .await?;
        let anomalies = self.detector.detect_for_submission(&transaction).await;
        Ok(TransactionOutcome {
            transaction,
            ledger,
            anomalies,
        })
    }

    async fn approve_transaction(
        &self,
        id: &TransactionId,
        approver: UserId,
        comment: Option<String>,
    ) -> Result<TransactionOutcome, ServerError> {
        self.decide(id, approver, comment, TransactionStatus::Approved)
            .await
    }

    async fn reject_transaction(
        &self,
        id: &TransactionId,
        approver: UserId,
        comment: Option<String>,
    ) -> Result<TransactionOutcome, ServerError> {
        self.decide(id, approver, comment, TransactionStatus::Rejected)
            .await
    }

    /// Every row is parsed and validated before anything is submitted, so a
    /// file with a bad row imports nothing.
    async fn import_transactions_csv(
        &self,
        csv: &str,
        budget_id: BudgetId,
        created_by: UserId,
    ) -> Result<Vec<TransactionOutcome>, ServerError> {
        let specs = self
            .csv_datasource
            .from_string(csv, budget_id, created_by)?;
        for spec in &specs {
            spec.validate_amount()?;
            self.validate_references(spec).await?;
        }
        let mut outcomes = Vec::with_capacity(specs.len());
        for spec in specs {
            outcomes.push(self.submit_transaction(spec).await?);
        }
        Ok(outcomes)
    }

    async fn search_transactions(
        &self,
        budget_id: &BudgetId,
        query: &str,
    ) -> Result<Vec<Transaction>, ServerError> {
        let matcher = FuzzyMatcher::new(query)?;
        let mut matches: Vec<Transaction> = self
            .repository
            .transactions_for_budget(budget_id)
            .await?
            .into_iter()
            .filter(|t| {
                matcher.is_match(&t.description)
                    || t.category.as_deref().is_some_and(|c| matcher.is_match(c))
                    || t.notes.as_deref().is_some_and(|n| matcher.is_match(n))
            })
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }
}
