//! Report persistence gateway: upsert-by-visit over a `ReportStore`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ReportRecord;
use crate::domain::ports::ReportStore;
use crate::services::prompt_contract::NEXT_ACTION_LABEL;

/// A saved report and whether an existing row was updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub record: ReportRecord,
    pub updated: bool,
}

pub struct ReportGateway<S: ReportStore + ?Sized> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: ReportStore + ?Sized> ReportGateway<S> {
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Save the report for a visit.
    ///
    /// Updates the visit's latest report in place when one exists, otherwise
    /// inserts a new one. Regenerating never grows the row count.
    pub async fn save(&self, visit_id: Uuid, report_text: &str, origin: &str) -> DomainResult<SavedReport> {
        let existing = self.bounded(self.store.find_latest_report(visit_id)).await?;

        let (record, updated) = match existing {
            Some(mut record) => {
                record.report_text = report_text.to_string();
                record.origin = origin.to_string();
                record.updated_at = Utc::now();
                (record, true)
            }
            None => (ReportRecord::new(visit_id, report_text, origin), false),
        };

        let record = self
            .bounded(self.store.upsert_report(&record))
            .await
            .map_err(|e| DomainError::PersistenceFailed(e.to_string()))?;

        tracing::info!(%visit_id, report_id = %record.id, updated, "report saved");
        Ok(SavedReport { record, updated })
    }

    /// The authoritative report of a visit.
    pub async fn latest(&self, visit_id: Uuid) -> DomainResult<Option<ReportRecord>> {
        self.bounded(self.store.find_latest_report(visit_id)).await
    }

    async fn bounded<T>(&self, call: impl std::future::Future<Output = DomainResult<T>>) -> DomainResult<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| DomainError::StoreTimeout(self.timeout.as_secs()))?
    }
}

/// Persisted form: the report followed by the labelled next action, unless the
/// report already carries that label.
pub fn combine_report_text(report: &str, next_action: &str) -> String {
    if report.contains(NEXT_ACTION_LABEL) {
        report.to_string()
    } else {
        format!("{report}\n\n---\n{NEXT_ACTION_LABEL}：{next_action}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryReports {
        rows: Mutex<Vec<ReportRecord>>,
    }

    #[async_trait]
    impl ReportStore for MemoryReports {
        async fn find_latest_report(&self, visit_id: Uuid) -> DomainResult<Option<ReportRecord>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|r| r.visit_id == visit_id)
                .max_by_key(|r| r.created_at)
                .cloned())
        }

        async fn upsert_report(&self, record: &ReportRecord) -> DomainResult<ReportRecord> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|r| r.id == record.id) {
                Some(row) => *row = record.clone(),
                None => rows.push(record.clone()),
            }
            Ok(record.clone())
        }
    }

    #[tokio::test]
    async fn test_save_twice_keeps_one_row_with_latest_text() {
        let store = Arc::new(MemoryReports::default());
        let gateway = ReportGateway::new(store.clone(), Duration::from_secs(5));
        let visit_id = Uuid::new_v4();

        let first = gateway.save(visit_id, "最初", "model-a").await.unwrap();
        let second = gateway.save(visit_id, "二回目", "model-b").await.unwrap();

        assert!(!first.updated);
        assert!(second.updated);
        assert_eq!(first.record.id, second.record.id);
        assert_eq!(store.rows.lock().unwrap().len(), 1);

        let latest = gateway.latest(visit_id).await.unwrap().unwrap();
        assert_eq!(latest.report_text, "二回目");
        assert_eq!(latest.origin, "model-b");
    }

    #[test]
    fn test_combine_report_text() {
        assert_eq!(
            combine_report_text("本文", "深呼吸を5回"),
            "本文\n\n---\n次回までの1アクション：深呼吸を5回\n"
        );
        let labelled = "本文\n次回までの1アクション：深呼吸を5回";
        assert_eq!(combine_report_text(labelled, "別の行動"), labelled);
    }
}
