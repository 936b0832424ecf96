//! Input assembler: builds the `ReportInput` handed to the generation backend.
//!
//! Each field is taken from the resolved current visit first, then from the
//! caller's fallback data, and is otherwise left absent.

use chrono::{NaiveDate, Utc};

use crate::domain::models::{
    ComputedDeltas, FallbackData, InputUsage, InterpretationNote, Measurement, NormalizedVisit,
    PreviousSnapshot, ReportInput, SelfReport, TodaySnapshot,
};
use crate::services::numeric::{delta, percent_delta, to_bool, to_number, to_score, to_text};
use crate::services::visit_resolver::Resolution;

/// Assemble with today's UTC date as the last-resort visit date.
pub fn assemble(resolution: &Resolution, fallback: &FallbackData) -> ReportInput {
    assemble_on(resolution, fallback, Utc::now().date_naive())
}

/// Assemble with an explicit last-resort visit date.
pub fn assemble_on(resolution: &Resolution, fallback: &FallbackData, today: NaiveDate) -> ReportInput {
    let current = resolution.current.as_ref();

    let before = merge_measurement(
        current.and_then(|v| v.before),
        [&fallback.before_rmssd, &fallback.before_sdnn, &fallback.before_heart_rate],
    );
    let after = merge_measurement(
        current.and_then(|v| v.after),
        [&fallback.after_rmssd, &fallback.after_sdnn, &fallback.after_heart_rate],
    );
    let subjective_before = merge_subjective_before(current.and_then(|v| v.subjective_before.as_ref()), fallback);
    let subjective_after = merge_subjective_after(current.and_then(|v| v.subjective_after.as_ref()), fallback);

    let date = current
        .map(|v| v.date)
        .or_else(|| {
            fallback
                .visit_date
                .as_deref()
                .map(str::trim)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        })
        .unwrap_or(today);

    let computed = compute_deltas(
        before.as_ref(),
        after.as_ref(),
        subjective_before.as_ref(),
        subjective_after.as_ref(),
    );

    let today = TodaySnapshot {
        date: date.format("%Y-%m-%d").to_string(),
        menu: current.and_then(|v| v.menu.clone()).or_else(|| non_blank(fallback.menu.as_deref())),
        staff: current.and_then(|v| v.staff.clone()).or_else(|| non_blank(fallback.staff.as_deref())),
        before,
        after,
        subjective_before,
        subjective_after,
        computed,
    };

    ReportInput {
        today,
        previous: resolution.previous.as_ref().map(previous_snapshot),
    }
}

/// What the backend was given.
pub fn input_usage(input: &ReportInput) -> InputUsage {
    InputUsage {
        has_subjective_before: input.today.subjective_before.is_some(),
        has_subjective_after: input.today.subjective_after.is_some(),
        previous_visit_date: input.previous.as_ref().map(|p| p.date.clone()),
    }
}

fn merge_measurement(current: Option<Measurement>, fallback: [&serde_json::Value; 3]) -> Option<Measurement> {
    let current = current.unwrap_or_default();
    let [rmssd, sdnn, heart_rate] = fallback;
    Measurement {
        rmssd: current.rmssd.or_else(|| to_number(rmssd)),
        sdnn: current.sdnn.or_else(|| to_number(sdnn)),
        heart_rate: current.heart_rate.or_else(|| to_number(heart_rate)),
    }
    .non_empty()
}

fn merge_subjective_before(current: Option<&SelfReport>, fallback: &FallbackData) -> Option<SelfReport> {
    let current = current.cloned().unwrap_or_default();
    let merged = SelfReport {
        sleep_quality: current.sleep_quality.or_else(|| to_score(&fallback.sleep_quality)),
        stress: current.stress.or_else(|| to_score(&fallback.stress)),
        body_heaviness: current.body_heaviness.or_else(|| to_score(&fallback.body_heaviness)),
        bedtime: current.bedtime.or_else(|| to_text(&fallback.bedtime)),
        alcohol: current.alcohol.or_else(|| to_bool(&fallback.alcohol)),
        caffeine: current.caffeine.or_else(|| to_bool(&fallback.caffeine)),
        exercise: current.exercise.or_else(|| to_bool(&fallback.exercise)),
    };
    (!merged.is_empty()).then_some(merged)
}

/// After-phase carries scores only, and exists only if at least one score does.
fn merge_subjective_after(current: Option<&SelfReport>, fallback: &FallbackData) -> Option<SelfReport> {
    let current = current.map(SelfReport::scores_only).unwrap_or_default();
    let merged = SelfReport {
        sleep_quality: current.sleep_quality.or_else(|| to_score(&fallback.after_sleep_quality)),
        stress: current.stress.or_else(|| to_score(&fallback.after_stress)),
        body_heaviness: current.body_heaviness.or_else(|| to_score(&fallback.after_body_heaviness)),
        ..SelfReport::default()
    };
    merged.has_scores().then_some(merged)
}

fn compute_deltas(
    before: Option<&Measurement>,
    after: Option<&Measurement>,
    subjective_before: Option<&SelfReport>,
    subjective_after: Option<&SelfReport>,
) -> ComputedDeltas {
    let metric = |f: fn(&Measurement) -> Option<f64>| (before.and_then(f), after.and_then(f));
    let score = |f: fn(&SelfReport) -> Option<u8>| {
        (
            subjective_before.and_then(f).map(f64::from),
            subjective_after.and_then(f).map(f64::from),
        )
    };

    let (rmssd_b, rmssd_a) = metric(|m| m.rmssd);
    let (sdnn_b, sdnn_a) = metric(|m| m.sdnn);
    let (hr_b, hr_a) = metric(|m| m.heart_rate);
    let (sleep_b, sleep_a) = score(|s| s.sleep_quality);
    let (stress_b, stress_a) = score(|s| s.stress);
    let (heavy_b, heavy_a) = score(|s| s.body_heaviness);

    ComputedDeltas {
        rmssd_diff: delta(rmssd_b, rmssd_a),
        rmssd_pct: percent_delta(rmssd_b, rmssd_a),
        sdnn_diff: delta(sdnn_b, sdnn_a),
        sdnn_pct: percent_delta(sdnn_b, sdnn_a),
        hr_diff: delta(hr_b, hr_a),
        hr_pct: percent_delta(hr_b, hr_a),
        subjective_sleep_diff: delta(sleep_b, sleep_a),
        subjective_stress_diff: delta(stress_b, stress_a),
        subjective_heavy_diff: delta(heavy_b, heavy_a),
        note: InterpretationNote::FIXED,
    }
}

fn previous_snapshot(visit: &NormalizedVisit) -> PreviousSnapshot {
    PreviousSnapshot {
        date: visit.date.format("%Y-%m-%d").to_string(),
        after: visit.after.and_then(Measurement::non_empty),
        subjective_after: visit
            .subjective_after
            .as_ref()
            .map(SelfReport::scores_only)
            .filter(SelfReport::has_scores),
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn normalized(before: Option<Measurement>, after: Option<Measurement>) -> NormalizedVisit {
        NormalizedVisit {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            ordering_key: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            menu: Some("ヘッドスパ60分".to_string()),
            staff: None,
            before,
            after,
            subjective_before: None,
            subjective_after: None,
        }
    }

    fn fallback(value: serde_json::Value) -> FallbackData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_fallback_only_computes_deltas() {
        let data = fallback(json!({
            "beforeRMSSD": 20, "afterRMSSD": "35",
            "stress": 8, "afterStress": 3
        }));

        let input = assemble_on(&Resolution::default(), &data, day());

        assert_eq!(input.today.date, "2025-03-14");
        assert_eq!(input.today.computed.rmssd_diff, Some(15.0));
        assert_eq!(input.today.computed.rmssd_pct, Some(75));
        assert_eq!(input.today.computed.subjective_stress_diff, Some(-5.0));
        assert!(input.today.computed.sdnn_diff.is_none());
        assert!(input.previous.is_none());
    }

    #[test]
    fn test_absent_after_scores_leave_no_subjective_after() {
        let data = fallback(json!({ "sleepQuality": 3, "stress": 7, "bodyHeaviness": 6 }));

        let input = assemble_on(&Resolution::default(), &data, day());

        assert!(input.today.subjective_after.is_none());
        assert!(input.today.computed.subjective_sleep_diff.is_none());
        assert!(input.today.computed.subjective_stress_diff.is_none());
        assert!(input.today.computed.subjective_heavy_diff.is_none());

        let json = serde_json::to_value(&input).unwrap();
        assert!(json["today"].get("subjective_after").is_none());
        assert!(json["today"]["computed"].get("subjective_stress_diff").is_none());
    }

    #[test]
    fn test_current_visit_wins_over_fallback() {
        let current = normalized(
            Some(Measurement { rmssd: Some(30.0), ..Default::default() }),
            None,
        );
        let resolution = Resolution { current: Some(current), previous: None };
        let data = fallback(json!({
            "beforeRMSSD": 99, "beforeSDNN": 41, "afterRMSSD": 45,
            "menu": "別メニュー", "staff": "田中", "visitDate": "2030-01-01"
        }));

        let input = assemble_on(&resolution, &data, day());

        let before = input.today.before.unwrap();
        assert_eq!(before.rmssd, Some(30.0));
        assert_eq!(before.sdnn, Some(41.0));
        assert_eq!(input.today.after.unwrap().rmssd, Some(45.0));
        assert_eq!(input.today.menu.as_deref(), Some("ヘッドスパ60分"));
        assert_eq!(input.today.staff.as_deref(), Some("田中"));
        assert_eq!(input.today.date, "2025-02-01");
        assert_eq!(input.today.computed.rmssd_diff, Some(15.0));
    }

    #[test]
    fn test_fallback_visit_date_and_invalid_values() {
        let data = fallback(json!({
            "visitDate": "2025-01-20",
            "beforeRMSSD": "n/a",
            "stress": 15,
            "caffeine": "yes",
            "alcohol": true
        }));

        let input = assemble_on(&Resolution::default(), &data, day());

        assert_eq!(input.today.date, "2025-01-20");
        assert!(input.today.before.is_none());
        let subjective = input.today.subjective_before.unwrap();
        assert!(subjective.stress.is_none());
        assert!(subjective.caffeine.is_none());
        assert_eq!(subjective.alcohol, Some(true));
    }

    #[test]
    fn test_previous_snapshot_and_usage() {
        let mut previous = normalized(None, Some(Measurement { rmssd: Some(28.0), ..Default::default() }));
        previous.subjective_after = Some(SelfReport {
            stress: Some(4),
            caffeine: Some(true),
            ..Default::default()
        });
        let resolution = Resolution { current: None, previous: Some(previous) };
        let data = fallback(json!({ "stress": 6 }));

        let input = assemble_on(&resolution, &data, day());

        let prev = input.previous.as_ref().unwrap();
        assert_eq!(prev.date, "2025-02-01");
        assert_eq!(prev.after.unwrap().rmssd, Some(28.0));
        let prev_subjective = prev.subjective_after.as_ref().unwrap();
        assert_eq!(prev_subjective.stress, Some(4));
        assert!(prev_subjective.caffeine.is_none());

        let usage = input_usage(&input);
        assert!(usage.has_subjective_before);
        assert!(!usage.has_subjective_after);
        assert_eq!(usage.previous_visit_date.as_deref(), Some("2025-02-01"));
    }

    #[test]
    fn test_entirely_absent_input_is_still_assembled() {
        let input = assemble_on(&Resolution::default(), &FallbackData::default(), day());

        assert!(input.today.before.is_none());
        assert!(input.today.after.is_none());
        assert!(input.today.subjective_before.is_none());
        assert!(input.today.subjective_after.is_none());
        assert_eq!(input.today.computed, ComputedDeltas::default());
        assert_eq!(input.today.computed.note, InterpretationNote::FIXED);
    }
}
