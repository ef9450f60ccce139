use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fractic_server_error::ServerError;
use futures::{stream, StreamExt as _};

use crate::{
    domain::{
        logic::anomaly_detector::AnomalyDetector,
        repositories::records_repository::RecordsRepository,
    },
    entities::{
        Anomaly, AnomalyId, AnomalyStatus, AuditAction, AuditEntityType, AuditLogEntry, BudgetId,
        UserId,
    },
    errors::AnomalyNotFound,
};

/// How many budgets are scanned concurrently by `run_for_budgets`.
const DETECTION_CONCURRENCY: usize = 4;

#[async_trait]
pub trait AnomalyUsecase: Send + Sync {
    async fn run_anomaly_detection(&self, budget_id: &BudgetId) -> Vec<Anomaly>;

    async fn run_for_budgets(&self, budget_ids: Vec<BudgetId>) -> Vec<(BudgetId, Vec<Anomaly>)>;

    async fn get_active_anomalies(&self, budget_id: &BudgetId) -> Result<Vec<Anomaly>, ServerError>;

    async fn resolve_anomaly(
        &self,
        id: &AnomalyId,
        resolved_by: UserId,
        resolution: &str,
    ) -> Result<Anomaly, ServerError>;

    async fn mark_investigating(&self, id: &AnomalyId, user: UserId)
        -> Result<Anomaly, ServerError>;

    async fn mark_false_positive(
        &self,
        id: &AnomalyId,
        user: UserId,
        note: &str,
    ) -> Result<Anomaly, ServerError>;
}

pub(crate) struct AnomalyUsecaseImpl<R: RecordsRepository> {
    repository: Arc<R>,
    detector: Arc<AnomalyDetector<R>>,
}

impl<R: RecordsRepository> AnomalyUsecaseImpl<R> {
    pub(crate) fn new(repository: Arc<R>, detector: Arc<AnomalyDetector<R>>) -> Self {
        Self {
            repository,
            detector,
        }
    }

    async fn update_status(
        &self,
        id: &AnomalyId,
        user: UserId,
        status: AnomalyStatus,
        note: Option<&str>,
    ) -> Result<Anomaly, ServerError> {
        let mut anomaly = self
            .repository
            .get_anomaly(id)
            .await?
            .ok_or_else(|| AnomalyNotFound::new(id))?;
        let previous = anomaly.status;

        anomaly.status = status;
        if matches!(status, AnomalyStatus::Resolved | AnomalyStatus::FalsePositive) {
            anomaly.resolved_at = Some(Utc::now());
            anomaly.resolved_by = Some(user);
            anomaly.resolution = note.map(Into::into);
        }
        self.repository.save_anomaly(anomaly.clone()).await?;

        let action = match status {
            AnomalyStatus::Resolved | AnomalyStatus::FalsePositive => AuditAction::Resolve,
            AnomalyStatus::Active | AnomalyStatus::Investigating => AuditAction::Update,
        };
        self.repository
            .append_audit_entry(
                AuditLogEntry::new(action, AuditEntityType::Anomaly, id, &anomaly.title, user)
                    .with_change(Some(previous.to_string()), Some(status.to_string())),
            )
            .await?;
        tracing::info!(anomaly_id = %id, from = %previous, to = %status, "anomaly status updated");
        Ok(anomaly)
    }
}

#[async_trait]
impl<R: RecordsRepository + 'static> AnomalyUsecase for AnomalyUsecaseImpl<R> {
    async fn run_anomaly_detection(&self, budget_id: &BudgetId) -> Vec<Anomaly> {
        self.detector.run_anomaly_detection(budget_id).await
    }

    async fn run_for_budgets(&self, budget_ids: Vec<BudgetId>) -> Vec<(BudgetId, Vec<Anomaly>)> {
        stream::iter(budget_ids)
            .map(|budget_id| async move {
                let anomalies = self.detector.run_anomaly_detection(&budget_id).await;
                (budget_id, anomalies)
            })
            .buffered(DETECTION_CONCURRENCY)
            .collect()
            .await
    }

    /// Open anomalies, most severe first, newest first within a severity.
    async fn get_active_anomalies(&self, budget_id: &BudgetId) -> Result<Vec<Anomaly>, ServerError> {
        let mut anomalies: Vec<Anomaly> = self
            .repository
            .anomalies_for_budget(budget_id)
            .await?
            .into_iter()
            .filter(Anomaly::is_open)
            .collect();
        anomalies.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.detected_at.cmp(&a.detected_at))
        });
        Ok(anomalies)
    }

    async fn resolve_anomaly(
        &self,
        id: &AnomalyId,
        resolved_by: UserId,
        resolution: &str,
    ) -> Result<Anomaly, ServerError> {
        self.update_status(id, resolved_by, AnomalyStatus::Resolved, Some(resolution))
            .await
    }

    async fn mark_investigating(
        &self,
        id: &AnomalyId,
        user: UserId,
    ) -> Result<Anomaly, ServerError> {
        self.update_status(id, user, AnomalyStatus::Investigating, None)
            .await
    }

    async fn mark_false_positive(
        &self,
        id: &AnomalyId,
        user: UserId,
        note: &str,
    ) -> Result<Anomaly, ServerError> {
        self.update_status(id, user, AnomalyStatus::FalsePositive, Some(note))
            .await
    }
}
