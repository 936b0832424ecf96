//! Visit domain model.
//!
//! A visit is created at check-in and accumulates measurement and self-report
//! rows as the session progresses (before-measurement, self report,
//! after-measurement, after self report). The raw record keeps the row values
//! loosely typed, exactly as the store hands them over; `NormalizedVisit` is the
//! canonical projection used by the pipeline and is never persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::measurement::{Measurement, Phase, SelfReport};

/// Raw HRV measurement row, tagged with its phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub phase: String,
    #[serde(default)]
    pub rmssd: Value,
    #[serde(default)]
    pub sdnn: Value,
    #[serde(default)]
    pub heart_rate: Value,
}

impl MeasurementRow {
    pub fn new(phase: Phase, rmssd: Option<f64>, sdnn: Option<f64>, heart_rate: Option<f64>) -> Self {
        Self {
            phase: phase.as_str().to_string(),
            rmssd: rmssd.map_or(Value::Null, Value::from),
            sdnn: sdnn.map_or(Value::Null, Value::from),
            heart_rate: heart_rate.map_or(Value::Null, Value::from),
        }
    }
}

/// Raw self-report row, tagged with its phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfReportRow {
    pub phase: String,
    #[serde(default)]
    pub sleep_quality: Value,
    #[serde(default)]
    pub stress: Value,
    #[serde(default)]
    pub body_heaviness: Value,
    #[serde(default)]
    pub bedtime: Value,
    #[serde(default)]
    pub alcohol: Value,
    #[serde(default)]
    pub caffeine: Value,
    #[serde(default)]
    pub exercise: Value,
}

impl SelfReportRow {
    /// A row carrying only the three scores.
    pub fn scores(phase: Phase, sleep_quality: Option<u8>, stress: Option<u8>, body_heaviness: Option<u8>) -> Self {
        Self {
            phase: phase.as_str().to_string(),
            sleep_quality: sleep_quality.map_or(Value::Null, Value::from),
            stress: stress.map_or(Value::Null, Value::from),
            body_heaviness: body_heaviness.map_or(Value::Null, Value::from),
            ..Self::default()
        }
    }

    pub fn with_lifestyle(mut self, bedtime: Option<&str>, alcohol: Option<bool>, caffeine: Option<bool>, exercise: Option<bool>) -> Self {
        self.bedtime = bedtime.map_or(Value::Null, Value::from);
        self.alcohol = alcohol.map_or(Value::Null, Value::from);
        self.caffeine = caffeine.map_or(Value::Null, Value::from);
        self.exercise = exercise.map_or(Value::Null, Value::from);
        self
    }
}

/// A visit as stored: one customer, one calendar date, an ordering instant and
/// any number of phase-tagged rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub visit_date: NaiveDate,
    /// Creation instant; orders visits that share a calendar date.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub menu: Option<String>,
    #[serde(default)]
    pub staff: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub measurements: Vec<MeasurementRow>,
    #[serde(default)]
    pub self_reports: Vec<SelfReportRow>,
}

impl VisitRecord {
    pub fn new(customer_id: Uuid, visit_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            visit_date,
            created_at: Utc::now(),
            menu: None,
            staff: None,
            notes: None,
            measurements: Vec::new(),
            self_reports: Vec::new(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_menu(mut self, menu: impl Into<String>) -> Self {
        self.menu = Some(menu.into());
        self
    }

    pub fn with_staff(mut self, staff: impl Into<String>) -> Self {
        self.staff = Some(staff.into());
        self
    }

    pub fn with_measurement(mut self, row: MeasurementRow) -> Self {
        self.measurements.push(row);
        self
    }

    pub fn with_self_report(mut self, row: SelfReportRow) -> Self {
        self.self_reports.push(row);
        self
    }
}

/// Canonical, typed projection of a `VisitRecord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedVisit {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub ordering_key: DateTime<Utc>,
    pub date: NaiveDate,
    pub menu: Option<String>,
    pub staff: Option<String>,
    pub before: Option<Measurement>,
    pub after: Option<Measurement>,
    pub subjective_before: Option<SelfReport>,
    pub subjective_after: Option<SelfReport>,
}
