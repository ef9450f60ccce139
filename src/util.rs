use std::sync::Arc;

use fractic_server_error::ServerError;

use crate::{
    data::{
        datasources::{
            config_ron_datasource::ConfigRonDatasource,
            ledger_snapshot_datasource::LedgerSnapshotDatasource,
        },
        repositories::in_memory_records_repository::InMemoryRecordsRepository,
    },
    domain::{
        logic::{
            aggregation::BudgetAggregator, anomaly_detector::AnomalyDetector,
            ledger_recorder::LedgerRecorder,
        },
        repositories::records_repository::RecordsRepository,
        usecases::{
            anomaly_usecase::{AnomalyUsecase as _, AnomalyUsecaseImpl},
            transaction_usecase::{TransactionUsecase as _, TransactionUsecaseImpl},
        },
    },
    entities::{
        Anomaly, AnomalyId, AuditLogEntry, Budget, BudgetId, BudgetSummary, Config,
        ConfirmedRecord, Department, LedgerStats, NewBudget, NewDepartment, NewProject,
        NewTransaction, NewVendor, Project, Transaction, TransactionId, TransactionOutcome,
        UserId, Vendor,
    },
    errors::ReadError,
    presentation::report_printer::ReportPrinter,
};

pub type Report = String;

/// Entry point of the library: budgets and their allocations, the transaction
/// workflow, anomaly review and the audit ledger, on top of any
/// `RecordsRepository`.
pub struct BudgetAuditUtil<R: RecordsRepository + 'static> {
    repository: Arc<R>,
    aggregator: Arc<BudgetAggregator<R>>,
    recorder: Arc<LedgerRecorder>,
    anomaly_usecase: AnomalyUsecaseImpl<R>,
    transaction_usecase: TransactionUsecaseImpl<R>,
    snapshot_datasource: LedgerSnapshotDatasource,
    printer: ReportPrinter,
}

impl BudgetAuditUtil<InMemoryRecordsRepository> {
    /// Instance backed by the in-memory repository. Useful for tests, demos
    /// and one-off audits of imported data.
    pub fn in_memory(config: Config) -> Result<Self, ServerError> {
        Self::new(Arc::new(InMemoryRecordsRepository::new()), config)
    }
}

impl<R: RecordsRepository + 'static> BudgetAuditUtil<R> {
    pub fn new(repository: Arc<R>, config: Config) -> Result<Self, ServerError> {
        let recorder = Arc::new(LedgerRecorder::new(config.ledger)?);
        let aggregator = Arc::new(BudgetAggregator::new(repository.clone()));
        let detector = Arc::new(AnomalyDetector::new(repository.clone(), config.detection));
        Ok(Self {
            anomaly_usecase: AnomalyUsecaseImpl::new(repository.clone(), detector.clone()),
            transaction_usecase: TransactionUsecaseImpl::new(
                repository.clone(),
                recorder.clone(),
                aggregator.clone(),
                detector,
            ),
            repository,
            aggregator,
            recorder,
            snapshot_datasource: LedgerSnapshotDatasource::new(),
            printer: ReportPrinter::new(),
        })
    }

    /// Same as `new`, with the configuration given as RON. Omitted fields
    /// take their default values.
    pub fn with_ron_config(repository: Arc<R>, config_ron: &str) -> Result<Self, ServerError> {
        let config = ConfigRonDatasource::new().from_string(config_ron)?;
        Self::new(repository, config)
    }

    pub async fn with_config_file<P>(repository: Arc<R>, path: P) -> Result<Self, ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        let config = ConfigRonDatasource::new().from_file(path).await?;
        Self::new(repository, config)
    }

    // Budgets & allocations.
    // ---

    pub async fn create_budget(&self, spec: NewBudget) -> Result<Budget, ServerError> {
        self.aggregator.create_budget(spec).await
    }

    pub async fn create_department(&self, spec: NewDepartment) -> Result<Department, ServerError> {
        self.aggregator.create_department(spec).await
    }

    pub async fn create_project(&self, spec: NewProject) -> Result<Project, ServerError> {
        self.aggregator.create_project(spec).await
    }

    pub async fn create_vendor(&self, spec: NewVendor) -> Result<Vendor, ServerError> {
        self.aggregator.create_vendor(spec).await
    }

    /// Budget with `spent` and `remaining` recomputed from approved
    /// transactions.
    pub async fn get_budget(&self, id: &BudgetId) -> Result<Budget, ServerError> {
        self.aggregator.reconcile_budget(id).await
    }

    pub async fn list_budgets(&self) -> Result<Vec<Budget>, ServerError> {
        self.repository.list_budgets().await
    }

    pub async fn budget_summary(&self, id: &BudgetId) -> Result<BudgetSummary, ServerError> {
        self.aggregator.budget_summary(id).await
    }

    // Transactions.
    // ---

    pub async fn submit_transaction(
        &self,
        spec: NewTransaction,
    ) -> Result<TransactionOutcome, ServerError> {
        self.transaction_usecase.submit_transaction(spec).await
    }

    pub async fn approve_transaction(
        &self,
        id: &TransactionId,
        approver: UserId,
        comment: Option<String>,
    ) -> Result<TransactionOutcome, ServerError> {
        self.transaction_usecase
            .approve_transaction(id, approver, comment)
            .await
    }

    pub async fn reject_transaction(
        &self,
        id: &TransactionId,
        approver: UserId,
        comment: Option<String>,
    ) -> Result<TransactionOutcome, ServerError> {
        self.transaction_usecase
            .reject_transaction(id, approver, comment)
            .await
    }

    pub async fn get_transaction(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, ServerError> {
        self.repository.get_transaction(id).await
    }

    pub async fn import_transactions_csv(
        &self,
        csv: &str,
        budget_id: BudgetId,
        created_by: UserId,
    ) -> Result<Vec<TransactionOutcome>, ServerError> {
        self.transaction_usecase
            .import_transactions_csv(csv, budget_id, created_by)
            .await
    }

    pub async fn import_transactions_csv_file<P>(
        &self,
        path: P,
        budget_id: BudgetId,
        created_by: UserId,
    ) -> Result<Vec<TransactionOutcome>, ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        let csv = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ReadError::with_debug(&e))?;
        self.import_transactions_csv(&csv, budget_id, created_by)
            .await
    }

    pub async fn search_transactions(
        &self,
        budget_id: &BudgetId,
        query: &str,
    ) -> Result<Vec<Transaction>, ServerError> {
        self.transaction_usecase
            .search_transactions(budget_id, query)
            .await
    }

    // Anomalies.
    // ---

    pub async fn run_anomaly_detection(&self, budget_id: &BudgetId) -> Vec<Anomaly> {
        self.anomaly_usecase.run_anomaly_detection(budget_id).await
    }

    /// Runs detection over every known budget.
    pub async fn run_anomaly_detection_all(
        &self,
    ) -> Result<Vec<(BudgetId, Vec<Anomaly>)>, ServerError> {
        let budget_ids = self
            .repository
            .list_budgets()
            .await?
            .into_iter()
            .map(|b| b.id)
            .collect();
        Ok(self.anomaly_usecase.run_for_budgets(budget_ids).await)
    }

    pub async fn get_active_anomalies(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Vec<Anomaly>, ServerError> {
        self.anomaly_usecase.get_active_anomalies(budget_id).await
    }

    pub async fn resolve_anomaly(
        &self,
        id: &AnomalyId,
        resolved_by: UserId,
        resolution: &str,
    ) -> Result<Anomaly, ServerError> {
        self.anomaly_usecase
            .resolve_anomaly(id, resolved_by, resolution)
            .await
    }

    pub async fn mark_investigating(
        &self,
        id: &AnomalyId,
        user: UserId,
    ) -> Result<Anomaly, ServerError> {
        self.anomaly_usecase.mark_investigating(id, user).await
    }

    pub async fn mark_false_positive(
        &self,
        id: &AnomalyId,
        user: UserId,
        note: &str,
    ) -> Result<Anomaly, ServerError> {
        self.anomaly_usecase
            .mark_false_positive(id, user, note)
            .await
    }

    // Ledger & audit trail.
    // ---

    pub async fn is_ledger_valid(&self) -> bool {
        self.recorder.is_chain_valid().await
    }

    pub async fn ledger_stats(&self) -> LedgerStats {
        self.recorder.stats().await
    }

    pub async fn get_ledger_record(&self, ledger_id: &str) -> Option<ConfirmedRecord> {
        self.recorder.get_transaction(ledger_id).await
    }

    pub async fn get_ledger_balance(&self, address: &str) -> f64 {
        self.recorder.get_balance(address).await
    }

    pub async fn audit_trail(&self, entity_id: &str) -> Result<Vec<AuditLogEntry>, ServerError> {
        self.repository.audit_entries_for(entity_id).await
    }

    pub async fn export_ledger(&self) -> Result<String, ServerError> {
        self.snapshot_datasource
            .to_string(&self.recorder.snapshot().await)
    }

    /// Replaces the ledger with a previously exported one. The snapshot is
    /// rejected if any block fails verification.
    pub async fn import_ledger(&self, snapshot: &str) -> Result<(), ServerError> {
        let chain = self.snapshot_datasource.from_string(snapshot)?;
        self.recorder.restore(chain).await
    }

    pub async fn save_ledger<P>(&self, path: P) -> Result<(), ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        self.snapshot_datasource
            .to_file(path, &self.recorder.snapshot().await)
            .await
    }

    pub async fn load_ledger<P>(&self, path: P) -> Result<(), ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        let chain = self.snapshot_datasource.from_file(path).await?;
        self.recorder.restore(chain).await?;
        tracing::info!("ledger restored from snapshot");
        Ok(())
    }

    // Reports.
    // ---

    pub async fn transparency_report(&self, budget_id: &BudgetId) -> Result<Report, ServerError> {
        let summary = self.aggregator.budget_summary(budget_id).await?;
        let anomalies = self.anomaly_usecase.get_active_anomalies(budget_id).await?;
        let stats = self.recorder.stats().await;
        Ok(self.printer.print_report(&summary, &anomalies, &stats))
    }
}
