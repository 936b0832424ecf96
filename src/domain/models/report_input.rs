//! The data surface handed to the text-generation backend.
//!
//! `ReportInput` is derived per request and never persisted. It carries no
//! customer identity beyond what the report needs (date, menu, staff label).

use serde::Serialize;

use super::measurement::{Measurement, SelfReport};

/// Directionality metadata sent alongside every diff so the backend does not
/// misread the sign of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterpretationNote {
    pub sleep_quality: &'static str,
    pub stress: &'static str,
    pub body_heaviness: &'static str,
    pub delta_rule: &'static str,
}

impl InterpretationNote {
    pub const FIXED: Self = Self {
        sleep_quality: "higher is better",
        stress: "lower is better",
        body_heaviness: "lower is better",
        delta_rule: "delta = after − before",
    };
}

impl Default for InterpretationNote {
    fn default() -> Self {
        Self::FIXED
    }
}

/// Before/after deltas. A field is present only when both operands were present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComputedDeltas {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmssd_diff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmssd_pct: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdnn_diff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdnn_pct: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_diff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_pct: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjective_sleep_diff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjective_stress_diff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjective_heavy_diff: Option<f64>,
    pub note: InterpretationNote,
}

/// Today's visit as the backend sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodaySnapshot {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjective_before: Option<SelfReport>,
    /// Absent (not an object of absents) unless at least one after-score was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjective_after: Option<SelfReport>,
    pub computed: ComputedDeltas,
}

/// The chronologically preceding visit, reduced to its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviousSnapshot {
    pub date: String,
    pub after: Option<Measurement>,
    pub subjective_after: Option<SelfReport>,
}

/// Sole input to the generation backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportInput {
    pub today: TodaySnapshot,
    pub previous: Option<PreviousSnapshot>,
}

impl ReportInput {
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
