//! SQLite database adapters for visits and reports.

pub mod connection;
pub mod migrations;
pub mod report_repository;
pub mod visit_repository;

pub use connection::{create_pool, create_test_pool, database_url, verify_connection, ConnectionError, PoolConfig};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use report_repository::SqliteReportRepository;
pub use visit_repository::SqliteVisitRepository;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Parse a UUID string from a SQLite row field.
pub fn parse_uuid(s: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Fixed-width RFC3339 in UTC, so text order is chronological order.
pub fn format_datetime(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

/// Open (creating if needed) the database and bring the schema up to date.
pub async fn initialize_database(database_url: &str, config: Option<PoolConfig>) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, config).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_datetime_is_fixed_width() {
        let whole = Utc.timestamp_opt(1_750_000_000, 0).unwrap();
        let fractional = Utc.timestamp_opt(1_750_000_000, 123_456_789).unwrap();

        assert_eq!(format_datetime(&whole).len(), format_datetime(&fractional).len());
        assert!(format_datetime(&whole) < format_datetime(&fractional));
        assert_eq!(parse_datetime(&format_datetime(&whole)).unwrap(), whole);
    }

    #[test]
    fn test_parse_errors_are_serialization_errors() {
        assert!(matches!(parse_uuid("nope"), Err(DomainError::SerializationError(_))));
        assert!(matches!(parse_datetime("yesterday"), Err(DomainError::SerializationError(_))));
    }
}
