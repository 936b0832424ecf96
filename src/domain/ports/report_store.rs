//! Report store port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::ReportRecord;

/// Persistence for generated reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// The most recent report attached to a visit.
    async fn find_latest_report(&self, visit_id: Uuid) -> DomainResult<Option<ReportRecord>>;

    /// Insert the record, or update it in place when a row with the same ID exists.
    async fn upsert_report(&self, record: &ReportRecord) -> DomainResult<ReportRecord>;
}
