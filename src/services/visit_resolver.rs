//! Visit resolver: determines the current visit and the one immediately before it.
//!
//! Store failures never abort a report request. They are logged and the
//! resolver returns whatever it had resolved so far, possibly nothing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::NormalizedVisit;
use crate::domain::ports::VisitStore;
use crate::services::visit_normalizer::VisitNormalizer;

/// Current and previous visit, both normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub current: Option<NormalizedVisit>,
    pub previous: Option<NormalizedVisit>,
}

pub struct VisitResolver<S: VisitStore + ?Sized> {
    store: Arc<S>,
    normalizer: VisitNormalizer,
    timeout: Duration,
}

impl<S: VisitStore + ?Sized> VisitResolver<S> {
    pub fn new(store: Arc<S>, normalizer: VisitNormalizer, timeout: Duration) -> Self {
        Self { store, normalizer, timeout }
    }

    /// Resolve by visit when a visit ID is given, otherwise by customer.
    pub async fn resolve(&self, customer_id: Option<Uuid>, visit_id: Option<Uuid>) -> Resolution {
        match (visit_id, customer_id) {
            (Some(visit_id), customer_id) => self.resolve_by_visit(visit_id, customer_id).await,
            (None, Some(customer_id)) => self.resolve_by_customer(customer_id).await,
            (None, None) => {
                tracing::debug!("no customer or visit given, skipping resolution");
                Resolution::default()
            }
        }
    }

    /// The two most recent visits of a customer: current then previous.
    pub async fn resolve_by_customer(&self, customer_id: Uuid) -> Resolution {
        let visits = match self.bounded(self.store.get_latest_visits(customer_id, 2)).await {
            Ok(visits) => visits,
            Err(e) => {
                tracing::warn!(%customer_id, error = %e, "failed to load latest visits");
                return Resolution::default();
            }
        };

        let mut visits = visits.iter();
        let resolution = Resolution {
            current: self.normalizer.normalize(visits.next()),
            previous: self.normalizer.normalize(visits.next()),
        };
        tracing::debug!(
            %customer_id,
            has_current = resolution.current.is_some(),
            has_previous = resolution.previous.is_some(),
            "resolved visits by customer"
        );
        resolution
    }

    /// The given visit, and the latest visit of its customer strictly before it.
    ///
    /// "Previous" is relative to the requested visit, not to the customer's
    /// most recent one, so regenerating an old report keeps the right baseline.
    pub async fn resolve_by_visit(&self, visit_id: Uuid, customer_id: Option<Uuid>) -> Resolution {
        let record = match self.bounded(self.store.get_visit(visit_id)).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(error = %DomainError::VisitNotFound(visit_id), "visit resolution failed");
                return Resolution::default();
            }
            Err(e) => {
                tracing::warn!(%visit_id, error = %e, "failed to load visit");
                return Resolution::default();
            }
        };

        if let Some(requested) = customer_id {
            if requested != record.customer_id {
                tracing::warn!(
                    %visit_id,
                    %requested,
                    owner = %record.customer_id,
                    "visit belongs to another customer, using the visit's owner"
                );
            }
        }

        let current = self.normalizer.normalize(Some(&record));
        let previous = match self
            .bounded(self.store.get_visits_before(record.customer_id, record.created_at, 1))
            .await
        {
            Ok(visits) => self.normalizer.normalize(visits.first()),
            Err(e) => {
                tracing::warn!(%visit_id, error = %e, "failed to load previous visit");
                None
            }
        };

        tracing::debug!(%visit_id, has_previous = previous.is_some(), "resolved visits by visit");
        Resolution { current, previous }
    }

    async fn bounded<T>(&self, call: impl Future<Output = DomainResult<T>>) -> DomainResult<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| DomainError::StoreTimeout(self.timeout.as_secs()))?
    }
}
