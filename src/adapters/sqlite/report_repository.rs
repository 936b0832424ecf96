//! SQLite implementation of the ReportStore.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ReportRecord;
use crate::domain::ports::ReportStore;

#[derive(Clone)]
pub struct SqliteReportRepository {
    pool: SqlitePool,
}

impl SqliteReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of report rows attached to a visit.
    pub async fn count_for_visit(&self, visit_id: Uuid) -> DomainResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reports WHERE visit_id = ?")
            .bind(visit_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ReportStore for SqliteReportRepository {
    async fn find_latest_report(&self, visit_id: Uuid) -> DomainResult<Option<ReportRecord>> {
        let row: Option<ReportRow> = sqlx::query_as(
            r#"SELECT id, visit_id, report_text, origin, created_at, updated_at
               FROM reports WHERE visit_id = ?
               ORDER BY created_at DESC, updated_at DESC LIMIT 1"#,
        )
        .bind(visit_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn upsert_report(&self, record: &ReportRecord) -> DomainResult<ReportRecord> {
        sqlx::query(
            r#"INSERT INTO reports (id, visit_id, report_text, origin, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   report_text = excluded.report_text,
                   origin = excluded.origin,
                   updated_at = excluded.updated_at"#,
        )
        .bind(record.id.to_string())
        .bind(record.visit_id.to_string())
        .bind(&record.report_text)
        .bind(&record.origin)
        .bind(format_datetime(&record.created_at))
        .bind(format_datetime(&record.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(record.clone())
    }
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: String,
    visit_id: String,
    report_text: String,
    origin: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ReportRow> for ReportRecord {
    type Error = DomainError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(ReportRecord {
            id: parse_uuid(&row.id)?,
            visit_id: parse_uuid(&row.visit_id)?,
            report_text: row.report_text,
            origin: row.origin,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
