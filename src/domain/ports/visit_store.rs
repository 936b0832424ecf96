//! Visit store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::VisitRecord;

/// Read access to recorded visits.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Get a visit by ID, with its measurement and self-report rows.
    async fn get_visit(&self, id: Uuid) -> DomainResult<Option<VisitRecord>>;

    /// Most recent visits of a customer, ordered by ordering key descending
    /// (ties broken by calendar date descending).
    async fn get_latest_visits(&self, customer_id: Uuid, limit: u32) -> DomainResult<Vec<VisitRecord>>;

    /// Visits of a customer whose ordering key is strictly less than `ordering_key`,
    /// most recent first.
    async fn get_visits_before(
        &self,
        customer_id: Uuid,
        ordering_key: DateTime<Utc>,
        limit: u32,
    ) -> DomainResult<Vec<VisitRecord>>;
}
