//! Visit normalizer: raw visit records to `NormalizedVisit`.
//!
//! At most one row per phase is expected. When a visit carries duplicates the
//! configured `DuplicatePhasePolicy` decides which row wins; the default keeps
//! the first row in store order.

use crate::domain::models::{
    DuplicatePhasePolicy, Measurement, MeasurementRow, NormalizedVisit, Phase, SelfReport,
    SelfReportRow, VisitRecord,
};
use crate::services::numeric::{to_bool, to_number, to_score, to_text};

/// Converts raw visit records into their canonical projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisitNormalizer {
    policy: DuplicatePhasePolicy,
}

impl VisitNormalizer {
    pub fn new(policy: DuplicatePhasePolicy) -> Self {
        Self { policy }
    }

    /// Normalize an optional record; absent in, absent out.
    pub fn normalize(&self, visit: Option<&VisitRecord>) -> Option<NormalizedVisit> {
        let visit = visit?;

        let before = self.pick(&visit.measurements, Phase::Before, |m| &m.phase);
        let after = self.pick(&visit.measurements, Phase::After, |m| &m.phase);
        let subjective_before = self.pick(&visit.self_reports, Phase::Before, |s| &s.phase);
        let subjective_after = self.pick(&visit.self_reports, Phase::After, |s| &s.phase);

        let duplicated = [Phase::Before, Phase::After].iter().any(|phase| {
            count_phase(&visit.measurements, *phase, |m| &m.phase) > 1
                || count_phase(&visit.self_reports, *phase, |s| &s.phase) > 1
        });
        if duplicated {
            tracing::warn!(
                visit_id = %visit.id,
                policy = ?self.policy,
                "visit has duplicate rows for one phase"
            );
        }

        Some(NormalizedVisit {
            id: visit.id,
            customer_id: visit.customer_id,
            ordering_key: visit.created_at,
            date: visit.visit_date,
            menu: visit.menu.clone(),
            staff: visit.staff.clone(),
            before: before.map(measurement_from_row),
            after: after.map(measurement_from_row),
            subjective_before: subjective_before.map(self_report_from_row),
            subjective_after: subjective_after.map(self_report_from_row),
        })
    }

    fn pick<'a, T>(&self, rows: &'a [T], phase: Phase, tag: impl Fn(&T) -> &String) -> Option<&'a T> {
        let mut matching = rows.iter().filter(|row| Phase::from_str(tag(row)) == Some(phase));
        match self.policy {
            DuplicatePhasePolicy::FirstFound => matching.next(),
            DuplicatePhasePolicy::LastFound => matching.last(),
        }
    }
}

fn count_phase<T>(rows: &[T], phase: Phase, tag: impl Fn(&T) -> &String) -> usize {
    rows.iter()
        .filter(|row| Phase::from_str(tag(row)) == Some(phase))
        .count()
}

fn measurement_from_row(row: &MeasurementRow) -> Measurement {
    Measurement {
        rmssd: to_number(&row.rmssd),
        sdnn: to_number(&row.sdnn),
        heart_rate: to_number(&row.heart_rate),
    }
}

fn self_report_from_row(row: &SelfReportRow) -> SelfReport {
    SelfReport {
        sleep_quality: to_score(&row.sleep_quality),
        stress: to_score(&row.stress),
        body_heaviness: to_score(&row.body_heaviness),
        bedtime: to_text(&row.bedtime),
        alcohol: to_bool(&row.alcohol),
        caffeine: to_bool(&row.caffeine),
        exercise: to_bool(&row.exercise),
    }
}
