//! End-to-end tests of the report pipeline over SQLite stores and a scripted backend.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use common::{at, compliant_report, relaxing_visit, setup, tagged, test_config, GOOD_ACTION};
use salon_report::adapters::generators::ScriptedGenerator;
use salon_report::domain::models::{
    ContractVariant, FallbackData, GenerateReportRequest, PersistenceStatus, ReportRecord,
};
use salon_report::services::input_assembler::assemble;
use salon_report::services::report_validator::validate_next_action;
use salon_report::services::{FallbackCategory, ReportValidator, VisitNormalizer, VisitResolver};
use salon_report::{DomainError, DomainResult, ReportPipeline, ReportStore};

fn pipeline(env: &common::TestEnv, generator: Arc<ScriptedGenerator>) -> ReportPipeline {
    ReportPipeline::new(env.visits.clone(), env.reports.clone(), generator, &test_config())
}

#[tokio::test]
async fn test_scenario_a_deltas_and_compliant_next_action() {
    let env = setup().await;
    let customer = Uuid::new_v4();
    let visit = relaxing_visit(customer, "2025-06-20", at(300));
    env.visits.record_visit(&visit).await.unwrap();

    let resolver = VisitResolver::new(env.visits.clone(), VisitNormalizer::default(), std::time::Duration::from_secs(5));
    let resolution = resolver.resolve(Some(customer), Some(visit.id)).await;
    let input = assemble(&resolution, &FallbackData::default());
    assert_eq!(input.today.computed.rmssd_diff, Some(15.0));
    assert_eq!(input.today.computed.rmssd_pct, Some(75));
    assert_eq!(input.today.computed.subjective_stress_diff, Some(-5.0));
    // Stress was 8 before treatment, so the high-stress category applies even though it fell to 3.
    assert_eq!(FallbackCategory::classify(&input), FallbackCategory::HighStress);

    // Backend never complies; the next action must still pass validation.
    let generator = Arc::new(ScriptedGenerator::new("scripted").with_default_text("ok"));
    let outcome = pipeline(&env, generator.clone())
        .generate_report(&GenerateReportRequest::for_visit(visit.id))
        .await;

    assert!(outcome.used_fallback);
    assert!(validate_next_action(Some(&outcome.next_action)).is_empty());
    assert!(FallbackCategory::HighStress.templates().contains(&outcome.next_action.as_str()));
    assert!(generator.calls()[0].user.contains("RMSSD: 20 → 35（+15 / +75%）"));
    assert_eq!(outcome.visit_id, Some(visit.id));
}

#[tokio::test]
async fn test_scenario_b_absent_subjective_after_stays_absent() {
    let env = setup().await;
    let customer = Uuid::new_v4();
    let mut visit = relaxing_visit(customer, "2025-06-20", at(300));
    visit.self_reports.retain(|row| row.phase == "before");
    env.visits.record_visit(&visit).await.unwrap();

    let resolver = VisitResolver::new(env.visits.clone(), VisitNormalizer::default(), std::time::Duration::from_secs(5));
    let input = assemble(&resolver.resolve(Some(customer), None).await, &FallbackData::default());

    assert!(input.today.subjective_after.is_none());
    assert!(input.today.computed.subjective_sleep_diff.is_none());
    assert!(input.today.computed.subjective_stress_diff.is_none());
    assert!(input.today.computed.subjective_heavy_diff.is_none());

    let generator = Arc::new(ScriptedGenerator::new("scripted").with_text(tagged(&compliant_report(), GOOD_ACTION)));
    let outcome = pipeline(&env, generator.clone())
        .generate_report(&GenerateReportRequest::for_customer(customer))
        .await;

    assert!(!outcome.input_used.has_subjective_after);
    assert!(outcome.input_used.has_subjective_before);
    assert!(generator.calls()[0].user.contains("ストレス（主観）: データ不足"));
}

#[tokio::test]
async fn test_scenario_c_missing_heading_retries_once_and_keeps_retry_text() {
    let env = setup().await;
    let customer = Uuid::new_v4();
    let visit = relaxing_visit(customer, "2025-06-20", at(300));
    env.visits.record_visit(&visit).await.unwrap();

    let without_heading = compliant_report().replace("【セルフケア（次回まで）】", "");
    let generator = Arc::new(
        ScriptedGenerator::new("scripted")
            .with_text(tagged(&without_heading, GOOD_ACTION))
            .with_text(tagged(&compliant_report(), GOOD_ACTION)),
    );
    let outcome = pipeline(&env, generator.clone())
        .generate_report(&GenerateReportRequest::for_visit(visit.id))
        .await;

    assert_eq!(generator.call_count(), 2);
    assert_eq!(outcome.report, compliant_report());
    assert_eq!(outcome.next_action, GOOD_ACTION);
    assert!(!outcome.used_fallback);
    assert_eq!(outcome.attempts[1].variant, ContractVariant::Strict);
    assert!(ReportValidator::new(220).validate_report(&outcome.report).is_empty());
}

#[tokio::test]
async fn test_always_non_compliant_backend_is_called_exactly_twice() {
    let env = setup().await;
    let customer = Uuid::new_v4();
    env.visits.record_visit(&relaxing_visit(customer, "2025-06-20", at(300))).await.unwrap();

    let generator = Arc::new(ScriptedGenerator::new("scripted").with_default_text("短い"));
    let outcome = pipeline(&env, generator.clone())
        .generate_report(&GenerateReportRequest::for_customer(customer))
        .await;

    assert_eq!(generator.call_count(), 2);
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(outcome.report, "短い");
    assert!(!outcome.next_action.is_empty());
}

#[tokio::test]
async fn test_previous_visit_follows_ordering_key() {
    let env = setup().await;
    let customer = Uuid::new_v4();
    let v1 = relaxing_visit(customer, "2025-05-01", at(100));
    let v2 = relaxing_visit(customer, "2025-06-01", at(200));
    let v3 = relaxing_visit(customer, "2025-07-01", at(300));
    for v in [&v3, &v1, &v2] {
        env.visits.record_visit(v).await.unwrap();
    }

    let generator = Arc::new(ScriptedGenerator::new("scripted").with_default_text(tagged(&compliant_report(), GOOD_ACTION)));
    let pipeline = pipeline(&env, generator);

    let of_v3 = pipeline.generate_report(&GenerateReportRequest::for_visit(v3.id)).await;
    assert_eq!(of_v3.input_used.previous_visit_date.as_deref(), Some("2025-06-01"));

    let of_v2 = pipeline.generate_report(&GenerateReportRequest::for_visit(v2.id)).await;
    assert_eq!(of_v2.input_used.previous_visit_date.as_deref(), Some("2025-05-01"));

    let latest = pipeline.generate_report(&GenerateReportRequest::for_customer(customer)).await;
    assert_eq!(latest.visit_id, Some(v3.id));
}

#[tokio::test]
async fn test_regenerating_updates_the_single_report_row() {
    let env = setup().await;
    let customer = Uuid::new_v4();
    let visit = relaxing_visit(customer, "2025-06-20", at(300));
    env.visits.record_visit(&visit).await.unwrap();

    let second_report = compliant_report().replace("ありがとうございました", "ありがとうございます");
    let generator = Arc::new(
        ScriptedGenerator::new("scripted")
            .with_text(tagged(&compliant_report(), GOOD_ACTION))
            .with_text(tagged(&second_report, GOOD_ACTION)),
    );
    let pipeline = pipeline(&env, generator);
    let request = GenerateReportRequest::for_visit(visit.id);

    let first = pipeline.generate_report(&request).await;
    let second = pipeline.generate_report(&request).await;

    assert!(matches!(first.persistence, PersistenceStatus::Saved { updated: false, .. }));
    assert!(matches!(second.persistence, PersistenceStatus::Saved { updated: true, .. }));
    assert_eq!(first.persistence.report_id(), second.persistence.report_id());
    assert_eq!(env.reports.count_for_visit(visit.id).await.unwrap(), 1);

    let saved = pipeline.latest_report(visit.id).await.unwrap().unwrap();
    assert!(saved.report_text.starts_with(&second_report));
    assert!(saved.report_text.ends_with(&format!("次回までの1アクション：{GOOD_ACTION}\n")));
    assert_eq!(saved.origin, "scripted");
}

struct UnwritableReports;

#[async_trait]
impl ReportStore for UnwritableReports {
    async fn find_latest_report(&self, _visit_id: Uuid) -> DomainResult<Option<ReportRecord>> {
        Ok(None)
    }

    async fn upsert_report(&self, _record: &ReportRecord) -> DomainResult<ReportRecord> {
        Err(DomainError::DatabaseError("disk I/O error".to_string()))
    }
}

#[tokio::test]
async fn test_persistence_failure_still_returns_the_report() {
    let env = setup().await;
    let customer = Uuid::new_v4();
    let visit = relaxing_visit(customer, "2025-06-20", at(300));
    env.visits.record_visit(&visit).await.unwrap();

    let generator = Arc::new(ScriptedGenerator::new("scripted").with_text(tagged(&compliant_report(), GOOD_ACTION)));
    let pipeline = ReportPipeline::new(env.visits.clone(), Arc::new(UnwritableReports), generator, &test_config());
    let outcome = pipeline.generate_report(&GenerateReportRequest::for_visit(visit.id)).await;

    assert_eq!(outcome.report, compliant_report());
    match outcome.persistence {
        PersistenceStatus::Failed { error } => assert!(error.contains("disk I/O error")),
        other => panic!("expected a persistence failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_walk_in_without_history_uses_fallback_data_and_skips_saving() {
    let env = setup().await;
    let fallback: FallbackData = serde_json::from_value(json!({
        "visitDate": "2025-06-20",
        "menu": "ヘッドスパ60分",
        "beforeRMSSD": 20,
        "afterRMSSD": "35",
        "stress": 8
    }))
    .unwrap();

    let generator = Arc::new(
        ScriptedGenerator::new("scripted")
            .with_error(DomainError::GenerationFailed("quota exceeded".to_string()))
            .with_error(DomainError::GenerationTimeout(5)),
    );
    let request = GenerateReportRequest::for_customer(Uuid::new_v4()).with_fallback(fallback);
    let outcome = pipeline(&env, generator).generate_report(&request).await;

    assert_eq!(outcome.persistence, PersistenceStatus::NotAttempted);
    assert!(outcome.used_fallback);
    assert!(outcome.report.contains("2025-06-20"));
    assert!(outcome.report.contains("20 → 35（+15 / +75%）"));
    assert!(ReportValidator::new(220).validate_report(&outcome.report).is_empty());
    assert!(validate_next_action(Some(&outcome.next_action)).is_empty());
}

#[tokio::test]
async fn test_unknown_visit_degrades_to_fallback_data() {
    let env = setup().await;
    let generator = Arc::new(ScriptedGenerator::new("scripted").with_text(tagged(&compliant_report(), GOOD_ACTION)));

    let outcome = pipeline(&env, generator)
        .generate_report(&GenerateReportRequest::for_visit(Uuid::new_v4()))
        .await;

    assert_eq!(outcome.visit_id, None);
    assert_eq!(outcome.persistence, PersistenceStatus::NotAttempted);
    assert_eq!(outcome.next_action, GOOD_ACTION);
}
