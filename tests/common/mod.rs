//! Common test utilities for integration tests
//!
//! Provides an in-memory database with migrations applied, visit fixtures and
//! canned generator output shared by the integration test files.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use salon_report::adapters::sqlite::{create_migrated_test_pool, SqliteReportRepository, SqliteVisitRepository};
use salon_report::domain::models::{Config, MeasurementRow, Phase, SelfReportRow, VisitRecord};

/// Next action that satisfies every next-action rule (length, digit, unit, single line).
pub const GOOD_ACTION: &str = "寝る前の5分間、首と肩をゆっくり回すストレッチを左右10回ずつ丁寧に行ってみてください";

pub struct TestEnv {
    pub pool: SqlitePool,
    pub visits: Arc<SqliteVisitRepository>,
    pub reports: Arc<SqliteReportRepository>,
}

pub async fn setup() -> TestEnv {
    let pool = create_migrated_test_pool().await.expect("Failed to create test pool");
    TestEnv {
        visits: Arc::new(SqliteVisitRepository::new(pool.clone())),
        reports: Arc::new(SqliteReportRepository::new(pool.clone())),
        pool,
    }
}

/// Config with a fixed fallback seed so canned picks are reproducible.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.fallback.seed = Some(42);
    config.generation.timeout_secs = 5;
    config
}

pub fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_750_000_000 + offset_secs, 0).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// RMSSD 20 → 35, stress 8 → 3.
pub fn relaxing_visit(customer_id: Uuid, visit_date: &str, created_at: DateTime<Utc>) -> VisitRecord {
    VisitRecord::new(customer_id, date(visit_date))
        .with_created_at(created_at)
        .with_menu("ヘッドスパ60分")
        .with_staff("佐藤")
        .with_measurement(MeasurementRow::new(Phase::Before, Some(20.0), Some(30.0), Some(72.0)))
        .with_measurement(MeasurementRow::new(Phase::After, Some(35.0), Some(38.0), Some(66.0)))
        .with_self_report(SelfReportRow::scores(Phase::Before, Some(4), Some(8), Some(6)))
        .with_self_report(SelfReportRow::scores(Phase::After, Some(7), Some(3), Some(2)))
}

/// A report meeting the full output contract at the standard tier.
pub fn compliant_report() -> String {
    "【本日のまとめ】\n本日はヘッドスパ60分を受けていただきありがとうございました。呼吸がゆったりとして、表情もやわらいだ印象でした。\n\n\
     【数値の変化】\n・RMSSD：20 → 35（+15 / +75%）で、リラックスしやすい状態に近づいた傾向が見られました。\n・心拍数：72 → 66（-6 / -8%）と落ち着いた値でした。\n\n\
     【主観・生活背景】\nストレスの自己評価は8から3へと軽くなったと感じていただけたようです。最近は寝つきが遅くなりがちとのことでした。\n\n\
     【セルフケア（次回まで）】\n寝る前の深呼吸や、首まわりをゆっくり回すストレッチを取り入れてみてください。無理のない範囲で続けることが大切です。\n\n\
     【次回来店の目安】\n3〜6週間後（約1ヶ月〜1ヶ月半）を目安にお越しください。"
        .to_string()
}

/// Generator output in the tagged format.
pub fn tagged(report: &str, next_action: &str) -> String {
    format!("<report>{report}</report>\n<next_action>{next_action}</next_action>")
}
