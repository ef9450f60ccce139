use std::{collections::HashMap, sync::Arc};

use fractic_server_error::ServerError;

use crate::{
    domain::repositories::records_repository::RecordsRepository,
    entities::{
        Anomaly, AnomalyData, AnomalyType, Budget, BudgetId, DetectionConfig, Severity,
        Transaction, TransactionId, VendorId,
    },
    presentation::anomaly_fmt,
};

use super::similarity::{transaction_similarity, SimilarityInput};

/// Rule-based detection of irregular budget activity.
///
/// Detection is advisory: every public operation swallows its own errors (they
/// are logged) and reports "nothing found" instead, so callers can run it
/// inline on a write path without it ever failing the write.
pub(crate) struct AnomalyDetector<R: RecordsRepository> {
    repository: Arc<R>,
    config: DetectionConfig,
}

pub(crate) fn overrun_severity(spent_ratio: f64, config: &DetectionConfig) -> Option<Severity> {
    if spent_ratio >= config.overrun_critical_ratio {
        Some(Severity::Critical)
    } else if spent_ratio >= config.overrun_high_ratio {
        Some(Severity::High)
    } else if spent_ratio >= config.overrun_threshold {
        Some(Severity::Medium)
    } else {
        None
    }
}

pub(crate) fn unusual_spending_severity(
    recent_amount: f64,
    average: f64,
    config: &DetectionConfig,
) -> Option<Severity> {
    if recent_amount >= average * config.unusual_spending_critical_multiplier {
        Some(Severity::Critical)
    } else if recent_amount >= average * config.unusual_spending_multiplier {
        Some(Severity::High)
    } else {
        None
    }
}

pub(crate) fn duplicate_severity(similarity: f64, config: &DetectionConfig) -> Option<Severity> {
    if similarity >= config.duplicate_high_similarity {
        Some(Severity::High)
    } else if similarity >= config.duplicate_threshold {
        Some(Severity::Medium)
    } else {
        None
    }
}

impl<R: RecordsRepository> AnomalyDetector<R> {
    pub(crate) fn new(repository: Arc<R>, config: DetectionConfig) -> Self {
        Self { repository, config }
    }

    pub(crate) async fn detect_budget_overrun(&self, budget_id: &BudgetId) -> Option<Anomaly> {
        self.try_detect_budget_overrun(budget_id)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(%budget_id, "error detecting budget overrun: {:?}", e);
                None
            })
    }

    pub(crate) async fn detect_unusual_spending(&self, budget_id: &BudgetId) -> Option<Anomaly> {
        self.try_detect_unusual_spending(budget_id, None)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(%budget_id, "error detecting unusual spending: {:?}", e);
                None
            })
    }

    pub(crate) async fn detect_duplicate_transactions(&self, budget_id: &BudgetId) -> Vec<Anomaly> {
        self.try_detect_duplicate_transactions(budget_id, None)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(%budget_id, "error detecting duplicate transactions: {:?}", e);
                Vec::new()
            })
    }

    /// Runs every detector in turn. A failing detector does not prevent the
    /// others from running.
    pub(crate) async fn run_anomaly_detection(&self, budget_id: &BudgetId) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        anomalies.extend(self.detect_budget_overrun(budget_id).await);
        anomalies.extend(self.detect_unusual_spending(budget_id).await);
        anomalies.extend(self.detect_duplicate_transactions(budget_id).await);
        if !anomalies.is_empty() {
            tracing::info!(%budget_id, count = anomalies.len(), "anomalies detected");
        }
        anomalies
    }

    /// Checks a freshly submitted transaction: whether it is a spending spike
    /// and which transactions in the window it duplicates. Spikes and pairs
    /// that do not involve it were reported when their own transaction was
    /// submitted, so they are skipped.
    pub(crate) async fn detect_for_submission(&self, transaction: &Transaction) -> Vec<Anomaly> {
        let budget_id = &transaction.budget_id;
        let focus = Some(&transaction.id);
        let mut anomalies = Vec::new();
        match self.try_detect_unusual_spending(budget_id, focus).await {
            Ok(anomaly) => anomalies.extend(anomaly),
            Err(e) => {
                tracing::error!(%budget_id, "error detecting unusual spending: {:?}", e);
            }
        }
        match self.try_detect_duplicate_transactions(budget_id, focus).await {
            Ok(duplicates) => anomalies.extend(duplicates),
            Err(e) => {
                tracing::error!(%budget_id, "error detecting duplicate transactions: {:?}", e);
            }
        }
        if !anomalies.is_empty() {
            tracing::info!(
                %budget_id,
                transaction_id = %transaction.id,
                count = anomalies.len(),
                "anomalies detected on submission"
            );
        }
        anomalies
    }

    /// Overrun check after approved spend changed. Reports only when the
    /// budget entered a severity band that no open overrun anomaly covers yet.
    pub(crate) async fn detect_overrun_escalation(&self, budget_id: &BudgetId) -> Option<Anomaly> {
        self.try_detect_overrun_escalation(budget_id)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(%budget_id, "error detecting budget overrun: {:?}", e);
                None
            })
    }

    async fn try_detect_overrun_escalation(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Option<Anomaly>, ServerError> {
        let Some(budget) = self.repository.get_budget(budget_id).await? else {
            return Ok(None);
        };
        let Some(anomaly) = self.overrun_anomaly(&budget) else {
            return Ok(None);
        };
        let already_open = self
            .repository
            .anomalies_for_budget(budget_id)
            .await?
            .iter()
            .any(|a| {
                a.is_open()
                    && a.anomaly_type == AnomalyType::BudgetOverrun
                    && a.severity >= anomaly.severity
            });
        if already_open {
            return Ok(None);
        }
        self.repository.save_anomaly(anomaly.clone()).await?;
        Ok(Some(anomaly))
    }

    fn overrun_anomaly(&self, budget: &Budget) -> Option<Anomaly> {
        let spent_ratio = budget.spent_ratio()?;
        let severity = overrun_severity(spent_ratio, &self.config)?;
        Some(Anomaly::detected(
            budget.id,
            AnomalyType::BudgetOverrun,
            severity,
            anomaly_fmt::overrun_title(&budget.name),
            anomaly_fmt::overrun_description(spent_ratio),
            AnomalyData {
                threshold: self.config.overrun_threshold,
                actual_value: spent_ratio,
                expected_value: self.config.overrun_threshold,
                deviation: spent_ratio - self.config.overrun_threshold,
                ..Default::default()
            },
        ))
    }

    async fn try_detect_budget_overrun(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Option<Anomaly>, ServerError> {
        let Some(budget) = self.repository.get_budget(budget_id).await? else {
            return Ok(None);
        };
        let Some(anomaly) = self.overrun_anomaly(&budget) else {
            return Ok(None);
        };
        self.repository.save_anomaly(anomaly.clone()).await?;
        Ok(Some(anomaly))
    }

    /// With `focus` set, only a spike on that transaction is reported.
    async fn try_detect_unusual_spending(
        &self,
        budget_id: &BudgetId,
        focus: Option<&TransactionId>,
    ) -> Result<Option<Anomaly>, ServerError> {
        let window = self
            .repository
            .recent_transactions(budget_id, self.config.unusual_spending_window)
            .await?;
        if window.len() < self.config.unusual_spending_min_history {
            return Ok(None);
        }
        let Some(most_recent) = window.first() else {
            return Ok(None);
        };
        if focus.is_some_and(|id| *id != most_recent.id) {
            return Ok(None);
        }

        let average = window.iter().map(|t| t.amount).sum::<f64>() / window.len() as f64;
        if average <= 0.0 {
            return Ok(None);
        }
        let recent_amount = most_recent.amount;
        let Some(severity) = unusual_spending_severity(recent_amount, average, &self.config)
        else {
            return Ok(None);
        };

        let currency = self
            .repository
            .get_budget(budget_id)
            .await?
            .map(|b| b.currency)
            .unwrap_or(iso_currency::Currency::INR);
        let anomaly = Anomaly::detected(
            *budget_id,
            AnomalyType::UnusualSpending,
            severity,
            anomaly_fmt::unusual_spending_title(recent_amount, currency),
            anomaly_fmt::unusual_spending_description(recent_amount, average, currency),
            AnomalyData {
                threshold: self.config.unusual_spending_multiplier,
                actual_value: recent_amount,
                expected_value: average,
                deviation: recent_amount - average,
                transaction_ids: vec![most_recent.id],
                ..Default::default()
            },
        );
        self.repository.save_anomaly(anomaly.clone()).await?;
        Ok(Some(anomaly))
    }

    /// With `focus` set, only pairs involving that transaction are scored.
    async fn try_detect_duplicate_transactions(
        &self,
        budget_id: &BudgetId,
        focus: Option<&TransactionId>,
    ) -> Result<Vec<Anomaly>, ServerError> {
        let window = self
            .repository
            .recent_transactions(budget_id, self.config.duplicate_window)
            .await?;
        let vendor_names = self.vendor_names(&window).await?;
        let inputs: Vec<SimilarityInput<'_>> = window
            .iter()
            .map(|t| SimilarityInput {
                amount: t.amount,
                description: &t.description,
                vendor: t
                    .vendor_id
                    .and_then(|id| vendor_names.get(&id))
                    .map_or("", String::as_str),
            })
            .collect();

        let mut anomalies = Vec::new();
        'scan: for i in 0..window.len() {
            for j in (i + 1)..window.len() {
                if focus.is_some_and(|id| *id != window[i].id && *id != window[j].id) {
                    continue;
                }
                let similarity = transaction_similarity(&inputs[i], &inputs[j], &self.config);
                let Some(severity) = duplicate_severity(similarity, &self.config) else {
                    continue;
                };
                let (first, second) = (&window[i], &window[j]);
                let anomaly = Anomaly::detected(
                    *budget_id,
                    AnomalyType::DuplicateTransaction,
                    severity,
                    anomaly_fmt::duplicate_title(),
                    anomaly_fmt::duplicate_description(
                        similarity,
                        &first.description,
                        &second.description,
                    ),
                    AnomalyData {
                        threshold: self.config.duplicate_threshold,
                        actual_value: similarity,
                        expected_value: 0.5,
                        deviation: similarity - self.config.duplicate_threshold,
                        transaction_ids: vec![first.id, second.id],
                        vendor_ids: first.vendor_id.into_iter().chain(second.vendor_id).collect(),
                    },
                );
                self.repository.save_anomaly(anomaly.clone()).await?;
                anomalies.push(anomaly);
                if self.config.stop_at_first_duplicate {
                    break 'scan;
                }
            }
        }
        Ok(anomalies)
    }

    /// Vendor display names for the vendors referenced in `transactions`.
    /// Unknown vendors fall back to their id.
    async fn vendor_names(
        &self,
        transactions: &[Transaction],
    ) -> Result<HashMap<VendorId, String>, ServerError> {
        let mut names = HashMap::new();
        for vendor_id in transactions.iter().filter_map(|t| t.vendor_id) {
            if names.contains_key(&vendor_id) {
                continue;
            }
            let name = self
                .repository
                .get_vendor(&vendor_id)
                .await?
                .map_or_else(|| vendor_id.to_string(), |v| v.name);
            names.insert(vendor_id, name);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use iso_currency::Currency;

    use super::*;
    use crate::{
        data::repositories::in_memory_records_repository::InMemoryRecordsRepository,
        domain::repositories::records_repository::{
            AnomalyRepository as _, BudgetRepository as _, TransactionRepository as _,
        },
        entities::{
            Budget, BudgetStatus, NewBudget, NewTransaction, NewVendor, ProjectId, UserId, Vendor,
        },
    };

    fn budget(total: f64, spent: f64) -> Budget {
        let mut b = Budget::new(NewBudget {
            name: "Municipal Roads 2025".to_string(),
            department: None,
            state: None,
            country: Some("India".to_string()),
            fiscal_year: Some("2025-26".to_string()),
            currency: Currency::INR,
            total_budget: total,
            status: BudgetStatus::Ongoing,
            created_by: UserId::generate(),
            expenses: vec![],
        });
        b.spent = spent;
        b.remaining = total - spent;
        b
    }

    async fn setup(total: f64, spent: f64) -> (Arc<InMemoryRecordsRepository>, BudgetId) {
        let repo = Arc::new(InMemoryRecordsRepository::new());
        let b = budget(total, spent);
        let id = b.id;
        repo.save_budget(b).await.unwrap();
        (repo, id)
    }

    /// Inserts transactions oldest first; the last amount is the most recent.
    async fn insert_history(
        repo: &InMemoryRecordsRepository,
        budget_id: BudgetId,
        entries: &[(&str, f64, Option<VendorId>)],
    ) -> Vec<Transaction> {
        let start = Utc::now() - Duration::hours(entries.len() as i64);
        let mut inserted = Vec::new();
        for (i, (description, amount, vendor_id)) in entries.iter().enumerate() {
            let mut spec = NewTransaction::new(budget_id, *description, *amount, UserId::generate());
            spec.vendor_id = *vendor_id;
            spec.created_at = Some(start + Duration::hours(i as i64));
            let tx = Transaction::pending(spec).unwrap();
            repo.save_transaction(tx.clone()).await.unwrap();
            inserted.push(tx);
        }
        inserted
    }

    async fn vendor(repo: &InMemoryRecordsRepository, name: &str) -> VendorId {
        let v = Vendor::new(NewVendor {
            project_id: ProjectId::generate(),
            name: name.to_string(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
            allocated_amount: 10_000.0,
            created_by: UserId::generate(),
        });
        let id = v.id;
        repo.save_vendor(v).await.unwrap();
        id
    }

    #[test]
    fn test_overrun_severity_boundaries() {
        let config = DetectionConfig::default();
        assert_eq!(overrun_severity(0.79, &config), None);
        assert_eq!(overrun_severity(0.8, &config), Some(Severity::Medium));
        assert_eq!(overrun_severity(0.85, &config), Some(Severity::Medium));
        assert_eq!(overrun_severity(0.9, &config), Some(Severity::High));
        assert_eq!(overrun_severity(0.94, &config), Some(Severity::High));
        assert_eq!(overrun_severity(0.95, &config), Some(Severity::Critical));
        assert_eq!(overrun_severity(1.2, &config), Some(Severity::Critical));
    }

    #[test]
    fn test_unusual_spending_severity() {
        let config = DetectionConfig::default();
        assert_eq!(unusual_spending_severity(3999.0, 2000.0, &config), None);
        assert_eq!(
            unusual_spending_severity(5000.0, 2000.0, &config),
            Some(Severity::High)
        );
        assert_eq!(
            unusual_spending_severity(6000.0, 2000.0, &config),
            Some(Severity::Critical)
        );
    }

    #[test]
    fn test_duplicate_severity_boundaries() {
        let config = DetectionConfig::default();
        assert_eq!(duplicate_severity(0.9499, &config), None);
        assert_eq!(duplicate_severity(0.95, &config), Some(Severity::Medium));
        assert_eq!(duplicate_severity(0.97, &config), Some(Severity::Medium));
        assert_eq!(duplicate_severity(0.9799, &config), Some(Severity::Medium));
        assert_eq!(duplicate_severity(0.98, &config), Some(Severity::High));
        assert_eq!(duplicate_severity(1.0, &config), Some(Severity::High));
    }

    #[tokio::test]
    async fn test_budget_overrun_medium_at_85_percent() {
        let (repo, budget_id) = setup(100_000.0, 85_000.0).await;
        let detector = AnomalyDetector::new(repo.clone(), DetectionConfig::default());

        let anomaly = detector.detect_budget_overrun(&budget_id).await.unwrap();
        assert_eq!(anomaly.anomaly_type, AnomalyType::BudgetOverrun);
        assert_eq!(anomaly.severity, Severity::Medium);
        assert!((anomaly.data.actual_value - 0.85).abs() < 1e-12);
        assert!((anomaly.data.deviation - 0.05).abs() < 1e-12);
        assert_eq!(anomaly.title, "Budget Overrun Alert - Municipal Roads 2025");
        assert_eq!(repo.anomalies_for_budget(&budget_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_budget_overrun_is_not_deduplicated() {
        let (repo, budget_id) = setup(100_000.0, 96_000.0).await;
        let detector = AnomalyDetector::new(repo.clone(), DetectionConfig::default());

        let first = detector.detect_budget_overrun(&budget_id).await.unwrap();
        let second = detector.detect_budget_overrun(&budget_id).await.unwrap();
        assert_eq!(first.severity, Severity::Critical);
        assert_ne!(first.id, second.id);
        assert_eq!(repo.anomalies_for_budget(&budget_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_budget_overrun_below_threshold_or_missing() {
        let (repo, budget_id) = setup(100_000.0, 50_000.0).await;
        let detector = AnomalyDetector::new(repo.clone(), DetectionConfig::default());
        assert!(detector.detect_budget_overrun(&budget_id).await.is_none());
        assert!(detector
            .detect_budget_overrun(&BudgetId::generate())
            .await
            .is_none());
        assert!(repo.anomalies_for_budget(&budget_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unusual_spending_needs_three_transactions() {
        let (repo, budget_id) = setup(100_000.0, 0.0).await;
        insert_history(&repo, budget_id, &[("Cement", 100.0, None), ("Steel", 9000.0, None)])
            .await;
        let detector = AnomalyDetector::new(repo.clone(), DetectionConfig::default());

        assert!(detector.detect_unusual_spending(&budget_id).await.is_none());
        assert!(repo.anomalies_for_budget(&budget_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unusual_spending_flags_recent_spike() {
        let (repo, budget_id) = setup(100_000.0, 0.0).await;
        let history = insert_history(
            &repo,
            budget_id,
            &[
                ("Cement", 1000.0, None),
                ("Sand", 1000.0, None),
                ("Gravel", 1000.0, None),
                ("Excavator rental", 5000.0, None),
            ],
        )
        .await;
        let detector = AnomalyDetector::new(repo.clone(), DetectionConfig::default());

        let anomaly = detector.detect_unusual_spending(&budget_id).await.unwrap();
        assert_eq!(anomaly.anomaly_type, AnomalyType::UnusualSpending);
        assert_eq!(anomaly.severity, Severity::High);
        assert_eq!(anomaly.data.expected_value, 2000.0);
        assert_eq!(anomaly.data.actual_value, 5000.0);
        assert_eq!(anomaly.data.deviation, 3000.0);
        assert_eq!(anomaly.data.transaction_ids, vec![history[3].id]);
    }

    #[tokio::test]
    async fn test_unusual_spending_ignores_spike_outside_latest() {
        let (repo, budget_id) = setup(100_000.0, 0.0).await;
        insert_history(
            &repo,
            budget_id,
            &[
                ("Excavator rental", 5000.0, None),
                ("Cement", 1000.0, None),
                ("Sand", 1000.0, None),
            ],
        )
        .await;
        let detector = AnomalyDetector::new(repo, DetectionConfig::default());
        assert!(detector.detect_unusual_spending(&budget_id).await.is_none());
    }

    #[tokio::test]
    async fn test_identical_transactions_flagged_high() {
        let (repo, budget_id) = setup(100_000.0, 0.0).await;
        let vendor_id = vendor(&repo, "Sharma Constructions").await;
        let history = insert_history(
            &repo,
            budget_id,
            &[
                ("Bridge railing paint", 1800.0, Some(vendor_id)),
                ("Bridge railing paint", 1800.0, Some(vendor_id)),
            ],
        )
        .await;
        let detector = AnomalyDetector::new(repo, DetectionConfig::default());

        let anomalies = detector.detect_duplicate_transactions(&budget_id).await;
        assert_eq!(anomalies.len(), 1);
        let anomaly = &anomalies[0];
        assert_eq!(anomaly.anomaly_type, AnomalyType::DuplicateTransaction);
        assert_eq!(anomaly.severity, Severity::High);
        assert!((anomaly.data.actual_value - 1.0).abs() < 1e-9);
        // Newest first.
        assert_eq!(anomaly.data.transaction_ids, vec![history[1].id, history[0].id]);
        assert_eq!(anomaly.data.vendor_ids, vec![vendor_id, vendor_id]);
    }

    #[tokio::test]
    async fn test_duplicates_without_vendor_are_not_flagged() {
        let (repo, budget_id) = setup(100_000.0, 0.0).await;
        insert_history(
            &repo,
            budget_id,
            &[("Office chairs", 700.0, None), ("Office chairs", 700.0, None)],
        )
        .await;
        let detector = AnomalyDetector::new(repo, DetectionConfig::default());
        assert!(detector.detect_duplicate_transactions(&budget_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_scan_reports_every_pair_unless_configured() {
        let (repo, budget_id) = setup(100_000.0, 0.0).await;
        let a = vendor(&repo, "Sharma Constructions").await;
        let b = vendor(&repo, "Patel Electricals").await;
        insert_history(
            &repo,
            budget_id,
            &[
                ("Bridge railing paint", 1800.0, Some(a)),
                ("Streetlight bulbs", 450.0, Some(b)),
                ("Bridge railing paint", 1800.0, Some(a)),
                ("Streetlight bulbs", 450.0, Some(b)),
            ],
        )
        .await;

        let all = AnomalyDetector::new(repo.clone(), DetectionConfig::default())
            .detect_duplicate_transactions(&budget_id)
            .await;
        assert_eq!(all.len(), 2);

        let first_only = AnomalyDetector::new(
            repo,
            DetectionConfig {
                stop_at_first_duplicate: true,
                ..DetectionConfig::default()
            },
        )
        .detect_duplicate_transactions(&budget_id)
        .await;
        assert_eq!(first_only.len(), 1);
        assert_eq!(first_only[0].description, all[0].description);
    }

    #[tokio::test]
    async fn test_run_anomaly_detection_collects_all_detectors() {
        let (repo, budget_id) = setup(10_000.0, 9_700.0).await;
        let vendor_id = vendor(&repo, "Sharma Constructions").await;
        insert_history(
            &repo,
            budget_id,
            &[
                ("Cement", 100.0, None),
                ("Sand", 100.0, None),
                ("Gravel", 100.0, None),
                ("Bridge railing paint", 1800.0, Some(vendor_id)),
                ("Bridge railing paint", 1800.0, Some(vendor_id)),
            ],
        )
        .await;
        let detector = AnomalyDetector::new(repo.clone(), DetectionConfig::default());

        // Average 780, latest 1,800.
        let anomalies = detector.run_anomaly_detection(&budget_id).await;
        let types: Vec<_> = anomalies.iter().map(|a| a.anomaly_type).collect();
        assert_eq!(
            types,
            vec![
                AnomalyType::BudgetOverrun,
                AnomalyType::UnusualSpending,
                AnomalyType::DuplicateTransaction
            ]
        );
        assert_eq!(repo.anomalies_for_budget(&budget_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_near_duplicate_flagged_medium() {
        let (repo, budget_id) = setup(100_000.0, 0.0).await;
        let vendor_id = vendor(&repo, "Sharma Constructions").await;
        insert_history(
            &repo,
            budget_id,
            &[
                ("Bridge railing paint", 1000.0, Some(vendor_id)),
                ("Bridge railing paint", 1060.0, Some(vendor_id)),
            ],
        )
        .await;
        let detector = AnomalyDetector::new(repo, DetectionConfig::default());

        // 0.4 * (1 - 60 / 1060) + 0.4 + 0.2 ~= 0.977
        let anomalies = detector.detect_duplicate_transactions(&budget_id).await;
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].severity, Severity::Medium);
        assert!((anomalies[0].data.actual_value - 0.977_358).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_submission_check_only_reports_new_transaction() {
        let (repo, budget_id) = setup(100_000.0, 0.0).await;
        let vendor_id = vendor(&repo, "Sharma Constructions").await;
        let history = insert_history(
            &repo,
            budget_id,
            &[
                ("Bridge railing paint", 1800.0, Some(vendor_id)),
                ("Bridge railing paint", 1800.0, Some(vendor_id)),
                ("Cement", 100.0, None),
            ],
        )
        .await;
        let detector = AnomalyDetector::new(repo.clone(), DetectionConfig::default());

        // The older pair does not involve the cement purchase.
        assert!(detector.detect_for_submission(&history[2]).await.is_empty());
        assert!(repo.anomalies_for_budget(&budget_id).await.unwrap().is_empty());

        let mut spec =
            NewTransaction::new(budget_id, "Bridge railing paint", 1800.0, UserId::generate());
        spec.vendor_id = Some(vendor_id);
        let repeat = Transaction::pending(spec).unwrap();
        repo.save_transaction(repeat.clone()).await.unwrap();

        let anomalies = detector.detect_for_submission(&repeat).await;
        assert_eq!(anomalies.len(), 2);
        assert!(anomalies
            .iter()
            .all(|a| a.data.transaction_ids.contains(&repeat.id)));
    }

    #[tokio::test]
    async fn test_overrun_escalation_reports_each_band_once() {
        let (repo, budget_id) = setup(100_000.0, 85_000.0).await;
        let detector = AnomalyDetector::new(repo.clone(), DetectionConfig::default());

        let medium = detector.detect_overrun_escalation(&budget_id).await.unwrap();
        assert_eq!(medium.severity, Severity::Medium);
        assert!(detector.detect_overrun_escalation(&budget_id).await.is_none());

        let mut b = repo.get_budget(&budget_id).await.unwrap().unwrap();
        b.spent = 96_000.0;
        b.remaining = 4_000.0;
        repo.save_budget(b).await.unwrap();

        let critical = detector.detect_overrun_escalation(&budget_id).await.unwrap();
        assert_eq!(critical.severity, Severity::Critical);
        assert!(detector.detect_overrun_escalation(&budget_id).await.is_none());
        assert_eq!(repo.anomalies_for_budget(&budget_id).await.unwrap().len(), 2);
    }
}
