//! Domain errors for the report pipeline.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur while resolving visits, generating or saving reports.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Visit not found: {0}")]
    VisitNotFound(Uuid),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Generation timed out after {0}s")]
    GenerationTimeout(u64),

    #[error("Store call timed out after {0}s")]
    StoreTimeout(u64),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether this error came from the text-generation backend (counted against the retry budget).
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Self::GenerationFailed(_) | Self::GenerationTimeout(_))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
