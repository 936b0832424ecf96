//! SQLite implementation of the VisitStore.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{MeasurementRow, SelfReportRow, VisitRecord};
use crate::domain::ports::VisitStore;

const VISIT_COLUMNS: &str = "id, customer_id, visit_date, created_at, menu, staff, notes";

#[derive(Clone)]
pub struct SqliteVisitRepository {
    pool: SqlitePool,
}

impl SqliteVisitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a visit together with its phase rows. Row order is preserved.
    pub async fn record_visit(&self, visit: &VisitRecord) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO visits (id, customer_id, visit_date, created_at, menu, staff, notes)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(visit.id.to_string())
        .bind(visit.customer_id.to_string())
        .bind(visit.visit_date.format("%Y-%m-%d").to_string())
        .bind(format_datetime(&visit.created_at))
        .bind(&visit.menu)
        .bind(&visit.staff)
        .bind(&visit.notes)
        .execute(&mut *tx)
        .await?;

        for row in &visit.measurements {
            sqlx::query(
                "INSERT INTO measurements (visit_id, phase, rmssd, sdnn, heart_rate) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(visit.id.to_string())
            .bind(&row.phase)
            .bind(to_column(&row.rmssd)?)
            .bind(to_column(&row.sdnn)?)
            .bind(to_column(&row.heart_rate)?)
            .execute(&mut *tx)
            .await?;
        }

        for row in &visit.self_reports {
            sqlx::query(
                r#"INSERT INTO self_reports (visit_id, phase, sleep_quality, stress, body_heaviness, bedtime, alcohol, caffeine, exercise)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(visit.id.to_string())
            .bind(&row.phase)
            .bind(to_column(&row.sleep_quality)?)
            .bind(to_column(&row.stress)?)
            .bind(to_column(&row.body_heaviness)?)
            .bind(to_column(&normalize_bedtime(&row.bedtime))?)
            .bind(to_column(&row.alcohol)?)
            .bind(to_column(&row.caffeine)?)
            .bind(to_column(&row.exercise)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(visit_id = %visit.id, customer_id = %visit.customer_id, "visit recorded");
        Ok(())
    }

    async fn load(&self, row: VisitRow) -> DomainResult<VisitRecord> {
        let mut visit = VisitRecord::try_from(row)?;
        let id = visit.id.to_string();

        let measurements: Vec<MeasurementDbRow> = sqlx::query_as(
            "SELECT phase, rmssd, sdnn, heart_rate FROM measurements WHERE visit_id = ? ORDER BY seq",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let self_reports: Vec<SelfReportDbRow> = sqlx::query_as(
            r#"SELECT phase, sleep_quality, stress, body_heaviness, bedtime, alcohol, caffeine, exercise
               FROM self_reports WHERE visit_id = ? ORDER BY seq"#,
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        visit.measurements = measurements.into_iter().map(TryInto::try_into).collect::<DomainResult<_>>()?;
        visit.self_reports = self_reports.into_iter().map(TryInto::try_into).collect::<DomainResult<_>>()?;
        Ok(visit)
    }

    async fn load_all(&self, rows: Vec<VisitRow>) -> DomainResult<Vec<VisitRecord>> {
        let mut visits = Vec::with_capacity(rows.len());
        for row in rows {
            visits.push(self.load(row).await?);
        }
        Ok(visits)
    }
}

#[async_trait]
impl VisitStore for SqliteVisitRepository {
    async fn get_visit(&self, id: Uuid) -> DomainResult<Option<VisitRecord>> {
        let row: Option<VisitRow> = sqlx::query_as(&format!("SELECT {VISIT_COLUMNS} FROM visits WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_latest_visits(&self, customer_id: Uuid, limit: u32) -> DomainResult<Vec<VisitRecord>> {
        let rows: Vec<VisitRow> = sqlx::query_as(&format!(
            "SELECT {VISIT_COLUMNS} FROM visits WHERE customer_id = ? ORDER BY created_at DESC, visit_date DESC LIMIT ?"
        ))
        .bind(customer_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        self.load_all(rows).await
    }

    async fn get_visits_before(
        &self,
        customer_id: Uuid,
        ordering_key_limit: DateTime<Utc>,
        limit: u32,
    ) -> DomainResult<Vec<VisitRecord>> {
        let rows: Vec<VisitRow> = sqlx::query_as(&format!(
            r#"SELECT {VISIT_COLUMNS} FROM visits
               WHERE customer_id = ? AND created_at < ?
               ORDER BY created_at DESC, visit_date DESC LIMIT ?"#
        ))
        .bind(customer_id.to_string())
        .bind(format_datetime(&ordering_key_limit))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        self.load_all(rows).await
    }
}

fn to_column(value: &Value) -> DomainResult<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(value)?))
}

fn from_column(column: Option<String>) -> DomainResult<Value> {
    match column {
        Some(text) => Ok(serde_json::from_str(&text)?),
        None => Ok(Value::Null),
    }
}

/// `HH:MM` bedtimes are stored as `HH:MM:SS`; anything else is kept as given.
fn normalize_bedtime(value: &Value) -> Value {
    match value {
        Value::String(s) => match NaiveTime::parse_from_str(s.trim(), "%H:%M") {
            Ok(time) => Value::String(time.format("%H:%M:%S").to_string()),
            Err(_) => value.clone(),
        },
        _ => value.clone(),
    }
}

#[derive(sqlx::FromRow)]
struct VisitRow {
    id: String,
    customer_id: String,
    visit_date: String,
    created_at: String,
    menu: Option<String>,
    staff: Option<String>,
    notes: Option<String>,
}

impl TryFrom<VisitRow> for VisitRecord {
    type Error = DomainError;

    fn try_from(row: VisitRow) -> Result<Self, Self::Error> {
        let visit_date = NaiveDate::parse_from_str(&row.visit_date, "%Y-%m-%d")
            .map_err(|e| DomainError::SerializationError(format!("Invalid visit date {}: {e}", row.visit_date)))?;

        Ok(VisitRecord {
            id: parse_uuid(&row.id)?,
            customer_id: parse_uuid(&row.customer_id)?,
            visit_date,
            created_at: parse_datetime(&row.created_at)?,
            menu: row.menu,
            staff: row.staff,
            notes: row.notes,
            measurements: Vec::new(),
            self_reports: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct MeasurementDbRow {
    phase: String,
    rmssd: Option<String>,
    sdnn: Option<String>,
    heart_rate: Option<String>,
}

impl TryFrom<MeasurementDbRow> for MeasurementRow {
    type Error = DomainError;

    fn try_from(row: MeasurementDbRow) -> Result<Self, Self::Error> {
        Ok(MeasurementRow {
            phase: row.phase,
            rmssd: from_column(row.rmssd)?,
            sdnn: from_column(row.sdnn)?,
            heart_rate: from_column(row.heart_rate)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SelfReportDbRow {
    phase: String,
    sleep_quality: Option<String>,
    stress: Option<String>,
    body_heaviness: Option<String>,
    bedtime: Option<String>,
    alcohol: Option<String>,
    caffeine: Option<String>,
    exercise: Option<String>,
}

impl TryFrom<SelfReportDbRow> for SelfReportRow {
    type Error = DomainError;

    fn try_from(row: SelfReportDbRow) -> Result<Self, Self::Error> {
        Ok(SelfReportRow {
            phase: row.phase,
            sleep_quality: from_column(row.sleep_quality)?,
            stress: from_column(row.stress)?,
            body_heaviness: from_column(row.body_heaviness)?,
            bedtime: from_column(row.bedtime)?,
            alcohol: from_column(row.alcohol)?,
            caffeine: from_column(row.caffeine)?,
            exercise: from_column(row.exercise)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::Phase;
    use chrono::TimeZone;
    use serde_json::json;

    async fn setup() -> SqliteVisitRepository {
        SqliteVisitRepository::new(create_migrated_test_pool().await.unwrap())
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_750_000_000 + secs, 0).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_record_and_get_visit_keeps_rows_in_order() {
        let repo = setup().await;
        let visit = VisitRecord::new(Uuid::new_v4(), date("2025-06-01"))
            .with_menu("ヘッドスパ60分")
            .with_measurement(MeasurementRow::new(Phase::Before, Some(20.0), Some(30.0), Some(72.0)))
            .with_measurement(MeasurementRow::new(Phase::After, Some(35.5), None, Some(65.0)))
            .with_self_report(
                SelfReportRow::scores(Phase::Before, Some(4), Some(7), Some(6))
                    .with_lifestyle(Some("23:30"), Some(false), Some(true), None),
            );

        repo.record_visit(&visit).await.unwrap();
        let loaded = repo.get_visit(visit.id).await.unwrap().unwrap();

        assert_eq!(loaded.menu.as_deref(), Some("ヘッドスパ60分"));
        assert_eq!(loaded.measurements.len(), 2);
        assert_eq!(loaded.measurements[0].phase, "before");
        assert_eq!(loaded.measurements[1].rmssd, json!(35.5));
        assert!(loaded.measurements[1].sdnn.is_null());
        assert_eq!(loaded.self_reports[0].bedtime, json!("23:30:00"));
        assert_eq!(loaded.self_reports[0].caffeine, json!(true));
        assert!(loaded.self_reports[0].exercise.is_null());
    }

    #[tokio::test]
    async fn test_raw_values_survive_unchanged() {
        let repo = setup().await;
        let mut row = MeasurementRow::new(Phase::Before, None, None, None);
        row.rmssd = json!("42");
        let visit = VisitRecord::new(Uuid::new_v4(), date("2025-06-01")).with_measurement(row);

        repo.record_visit(&visit).await.unwrap();
        let loaded = repo.get_visit(visit.id).await.unwrap().unwrap();
        assert_eq!(loaded.measurements[0].rmssd, json!("42"));
    }

    #[tokio::test]
    async fn test_get_missing_visit() {
        let repo = setup().await;
        assert!(repo.get_visit(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_visits_order_by_created_at_then_date() {
        let repo = setup().await;
        let customer = Uuid::new_v4();
        let v1 = VisitRecord::new(customer, date("2025-06-01")).with_created_at(at(100));
        let v2 = VisitRecord::new(customer, date("2025-06-10")).with_created_at(at(200));
        let v3 = VisitRecord::new(customer, date("2025-06-20")).with_created_at(at(300));
        let other = VisitRecord::new(Uuid::new_v4(), date("2025-07-01")).with_created_at(at(400));
        for v in [&v2, &v3, &v1, &other] {
            repo.record_visit(v).await.unwrap();
        }

        let latest = repo.get_latest_visits(customer, 2).await.unwrap();
        assert_eq!(latest.iter().map(|v| v.id).collect::<Vec<_>>(), vec![v3.id, v2.id]);

        let before = repo.get_visits_before(customer, v2.created_at, 1).await.unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].id, v1.id);

        assert!(repo.get_visits_before(customer, v1.created_at, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_instant_breaks_tie_on_visit_date() {
        let repo = setup().await;
        let customer = Uuid::new_v4();
        let older = VisitRecord::new(customer, date("2025-06-01")).with_created_at(at(0));
        let newer = VisitRecord::new(customer, date("2025-06-02")).with_created_at(at(0));
        repo.record_visit(&older).await.unwrap();
        repo.record_visit(&newer).await.unwrap();

        let latest = repo.get_latest_visits(customer, 2).await.unwrap();
        assert_eq!(latest[0].id, newer.id);
        assert_eq!(latest[1].id, older.id);
    }

    #[test]
    fn test_normalize_bedtime() {
        assert_eq!(normalize_bedtime(&json!("23:30")), json!("23:30:00"));
        assert_eq!(normalize_bedtime(&json!("23:30:15")), json!("23:30:15"));
        assert_eq!(normalize_bedtime(&json!("遅め")), json!("遅め"));
        assert_eq!(normalize_bedtime(&Value::Null), Value::Null);
    }
}
