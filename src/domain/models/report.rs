//! Report request/response and persisted report models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::generation::AttemptSummary;

/// A persisted report. Several rows may exist per visit; the most recent is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub report_text: String,
    /// Label of the backend that produced the text (e.g. the model name).
    pub origin: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn new(visit_id: Uuid, report_text: impl Into<String>, origin: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            visit_id,
            report_text: report_text.into(),
            origin: origin.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Caller-supplied values used when the store has no (or incomplete) visit history.
///
/// Field names follow snake_case; the camelCase names sent by the check-in
/// front-end are accepted as aliases. Values are loosely typed on purpose and
/// go through the numeric/boolean coercions before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackData {
    #[serde(alias = "visitDate")]
    pub visit_date: Option<String>,
    pub menu: Option<String>,
    pub staff: Option<String>,

    #[serde(alias = "beforeRMSSD")]
    pub before_rmssd: Value,
    #[serde(alias = "beforeSDNN")]
    pub before_sdnn: Value,
    #[serde(alias = "beforeHeartRate")]
    pub before_heart_rate: Value,
    #[serde(alias = "afterRMSSD")]
    pub after_rmssd: Value,
    #[serde(alias = "afterSDNN")]
    pub after_sdnn: Value,
    #[serde(alias = "afterHeartRate")]
    pub after_heart_rate: Value,

    #[serde(alias = "sleepQuality")]
    pub sleep_quality: Value,
    pub stress: Value,
    #[serde(alias = "bodyHeaviness")]
    pub body_heaviness: Value,
    pub bedtime: Value,
    pub alcohol: Value,
    pub caffeine: Value,
    pub exercise: Value,

    #[serde(alias = "afterSleepQuality")]
    pub after_sleep_quality: Value,
    #[serde(alias = "afterStress")]
    pub after_stress: Value,
    #[serde(alias = "afterBodyHeaviness")]
    pub after_body_heaviness: Value,
}

/// Input to `generate_report`: a customer, a specific visit, or both, plus fallback data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateReportRequest {
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub visit_id: Option<Uuid>,
    #[serde(default, alias = "fallbackCustomerData")]
    pub fallback: FallbackData,
}

impl GenerateReportRequest {
    pub fn for_customer(customer_id: Uuid) -> Self {
        Self { customer_id: Some(customer_id), ..Default::default() }
    }

    pub fn for_visit(visit_id: Uuid) -> Self {
        Self { visit_id: Some(visit_id), ..Default::default() }
    }

    pub fn with_fallback(mut self, fallback: FallbackData) -> Self {
        self.fallback = fallback;
        self
    }
}

/// What the generation backend was given, for the caller's information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputUsage {
    pub has_subjective_before: bool,
    pub has_subjective_after: bool,
    pub previous_visit_date: Option<String>,
}

/// Outcome of the persistence step. A failure here is recoverable: the report is
/// still returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceStatus {
    Saved { report_id: Uuid, updated: bool },
    /// No current visit was resolved, so there is nothing to attach the report to.
    NotAttempted,
    Failed { error: String },
}

impl PersistenceStatus {
    pub fn report_id(&self) -> Option<Uuid> {
        match self {
            Self::Saved { report_id, .. } => Some(*report_id),
            _ => None,
        }
    }
}

/// Result of `generate_report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutcome {
    pub report: String,
    pub next_action: String,
    /// True when any deterministic fallback replaced generated output.
    #[serde(rename = "usedFallback")]
    pub used_fallback: bool,
    pub origin: String,
    pub visit_id: Option<Uuid>,
    pub input_used: InputUsage,
    pub attempts: Vec<AttemptSummary>,
    pub persistence: PersistenceStatus,
}
