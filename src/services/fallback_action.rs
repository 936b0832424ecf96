//! Deterministic, offline fallbacks.
//!
//! `build_fallback_next_action` picks a canned recommendation by inspecting the
//! input in a fixed priority order. Every canned string satisfies the
//! next-action rules; the tests check each one. `fallback_report` renders a
//! template report for the case where no generated text exists at all.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::domain::models::{Measurement, ReportInput, SelfReport};
use crate::services::numeric::{format_delta, format_number, INSUFFICIENT_DATA};
use crate::services::prompt_contract::{NEXT_VISIT_PHRASE, REQUIRED_HEADINGS};

/// Stress at or above this is high.
pub const HIGH_STRESS: u8 = 6;
/// Sleep quality at or below this is poor.
pub const POOR_SLEEP: u8 = 4;
/// Body heaviness at or above this is heavy.
pub const HEAVY_BODY: u8 = 6;

const HIGH_STRESS_ACTIONS: &[&str] = &[
    "寝る前に4秒吸って8秒吐く深呼吸を5回、肩の力を抜きながらゆっくり繰り返してみてください",
    "お風呂上がりに目を閉じて、お腹がふくらむのを感じる腹式呼吸を3分間続けてみてください",
    "就寝前の5分間、照明を落として静かに座り、吐く息を長めにする呼吸に意識を向けてみましょう",
];

const POOR_SLEEP_ACTIONS: &[&str] = &[
    "寝る30分前にスマホを置き、首から肩をゆっくり回すストレッチを左右10回ずつ行ってみてください",
    "布団に入ったら足首をゆっくり曲げ伸ばす運動を10回行い、そのまま深い呼吸を3回してみましょう",
    "就寝1時間前にぬるめのお湯で15分ほど入浴し、上がったあとは照明を暗めにして過ごしましょう",
];

const BODY_HEAVINESS_ACTIONS: &[&str] = &[
    "朝起きたら両腕を頭の上に伸ばす全身の伸びを3回行い、肩甲骨を寄せる動きを10回してみましょう",
    "夜のテレビの時間に、ふくらはぎを下から上へさする簡単なマッサージを左右2分ずつ行いましょう",
];

const CAFFEINE_ACTIONS: &[&str] = &[
    "コーヒーや緑茶は14時までにして、午後は白湯やハーブティーを1日2回に分けて飲んでみてください",
    "夕方以降はカフェインを控え、代わりに温かい白湯をゆっくり5分かけて飲む時間をつくりましょう",
];

const ALCOHOL_ACTIONS: &[&str] = &[
    "お酒を飲んだ日は寝る前にコップ1杯の水を飲み、首を左右にゆっくり倒すストレッチを5回しましょう",
    "飲酒は寝る2時間前までにして、就寝前に目を閉じてゆっくり深呼吸を5回行ってみてください",
];

const GENERAL_ACTIONS: &[&str] = &[
    "寝る前の3分間、頭皮を指の腹でやさしく円を描くようにほぐし、ゆっくり深呼吸を5回しましょう",
    "1日1回、椅子に座ったまま首と肩をゆっくり回すストレッチを前後各5回ずつ行ってみてください",
    "朝と夜の2回、窓際で背筋を伸ばし、鼻から吸って口から細く吐く深呼吸を1分間続けてみましょう",
];

/// Which condition selected the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCategory {
    HighStress,
    PoorSleep,
    BodyHeaviness,
    Caffeine,
    Alcohol,
    General,
}

impl FallbackCategory {
    pub const ALL: [Self; 6] = [
        Self::HighStress,
        Self::PoorSleep,
        Self::BodyHeaviness,
        Self::Caffeine,
        Self::Alcohol,
        Self::General,
    ];

    /// First matching condition, in priority order. Each phase counts on its
    /// own, so a threshold crossed before treatment still selects its category.
    pub fn classify(input: &ReportInput) -> Self {
        let after = input.today.subjective_after.as_ref();
        let before = input.today.subjective_before.as_ref();
        let either = |f: fn(&SelfReport) -> Option<u8>, hit: fn(u8) -> bool| {
            [after, before].into_iter().flatten().filter_map(f).any(hit)
        };

        if either(|s| s.stress, |v| v >= HIGH_STRESS) {
            Self::HighStress
        } else if either(|s| s.sleep_quality, |v| v <= POOR_SLEEP) {
            Self::PoorSleep
        } else if either(|s| s.body_heaviness, |v| v >= HEAVY_BODY) {
            Self::BodyHeaviness
        } else if before.and_then(|s| s.caffeine) == Some(true) {
            Self::Caffeine
        } else if before.and_then(|s| s.alcohol) == Some(true) {
            Self::Alcohol
        } else {
            Self::General
        }
    }

    pub fn templates(&self) -> &'static [&'static str] {
        match self {
            Self::HighStress => HIGH_STRESS_ACTIONS,
            Self::PoorSleep => POOR_SLEEP_ACTIONS,
            Self::BodyHeaviness => BODY_HEAVINESS_ACTIONS,
            Self::Caffeine => CAFFEINE_ACTIONS,
            Self::Alcohol => ALCOHOL_ACTIONS,
            Self::General => GENERAL_ACTIONS,
        }
    }
}

/// A valid next action for any input, chosen with the given RNG.
pub fn build_fallback_next_action<R: Rng + ?Sized>(input: &ReportInput, rng: &mut R) -> &'static str {
    let templates = FallbackCategory::classify(input).templates();
    templates
        .choose(rng)
        .copied()
        .unwrap_or(GENERAL_ACTIONS[0])
}

/// Seedable source of fallback next actions.
pub struct FallbackActionGenerator {
    rng: Mutex<StdRng>,
}

impl FallbackActionGenerator {
    /// Entropy-seeded unless a seed is given.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self { rng: Mutex::new(rng) }
    }

    pub fn next_action(&self, input: &ReportInput) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        build_fallback_next_action(input, &mut *rng)
    }
}

impl Default for FallbackActionGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Template report used only when no generated report text exists.
pub fn fallback_report(input: &ReportInput, next_action: &str) -> String {
    let today = &input.today;
    let [summary, numbers, subjective, self_care, next_visit] = REQUIRED_HEADINGS;

    let greeting = match &today.menu {
        Some(menu) => format!("本日は{menu}をお受けいただき、ありがとうございました。"),
        None => "本日はお時間をいただき、ありがとうございました。".to_string(),
    };

    let metric = |label: &str, f: fn(&Measurement) -> Option<f64>| {
        let line = format_delta(today.before.as_ref().and_then(f), today.after.as_ref().and_then(f));
        format!("・{label}：{line}")
    };

    let mut text = format!(
        "{summary}\n測定日：{}\n{greeting}施術の前後で測定した数値と、お伺いした内容をもとに本日の様子をまとめました。数値はその日の体調の目安のひとつとしてご覧ください。\n\n\
         {numbers}\n{}\n{}\n{}\n（差分は「施術後 − 施術前」です。RMSSDは高いほどリラックスの傾向、心拍数は低いほど落ち着きの傾向とされています）\n\n\
         {subjective}\n",
        today.date,
        metric("RMSSD（リラックスの目安）", |m| m.rmssd),
        metric("SDNN（自律神経のゆとりの目安）", |m| m.sdnn),
        metric("心拍数", |m| m.heart_rate),
    );

    for line in subjective_lines(input) {
        text.push_str(&line);
        text.push('\n');
    }

    text.push_str(&format!(
        "\n{self_care}\n・{next_action}\n・無理のない範囲で、できる日に続けてみてください。\n\n\
         {next_visit}\n{NEXT_VISIT_PHRASE}を目安に、またお身体の状態を一緒に確認しましょう。"
    ));
    text
}

fn subjective_lines(input: &ReportInput) -> Vec<String> {
    let today = &input.today;
    let mut lines = Vec::new();

    match (&today.subjective_before, &today.subjective_after) {
        (before, Some(after)) => {
            let before = before.as_ref();
            let pair = |f: fn(&SelfReport) -> Option<u8>| {
                format_delta(before.and_then(f).map(f64::from), f(after).map(f64::from))
            };
            lines.push(format!("・睡眠の質（高いほど良い）：{}", pair(|s| s.sleep_quality)));
            lines.push(format!("・ストレス（低いほど良い）：{}", pair(|s| s.stress)));
            lines.push(format!("・体の重さ（低いほど良い）：{}", pair(|s| s.body_heaviness)));
        }
        (Some(before), None) => {
            lines.push(format!(
                "・施術前の自己評価：睡眠の質 {}、ストレス {}、体の重さ {}",
                score_text(before.sleep_quality),
                score_text(before.stress),
                score_text(before.body_heaviness),
            ));
        }
        (None, None) => lines.push("・本日は自己評価の記録がありませんでした。".to_string()),
    }

    if let Some(before) = &today.subjective_before {
        if before.caffeine == Some(true) {
            lines.push("・カフェインを摂られる習慣があるとのことでした。".to_string());
        }
        if before.alcohol == Some(true) {
            lines.push("・お酒を飲まれる日があるとのことでした。".to_string());
        }
    }

    if let Some(previous) = &input.previous {
        let rmssd = previous
            .after
            .and_then(|m| m.rmssd)
            .map_or_else(|| INSUFFICIENT_DATA.to_string(), format_number);
        lines.push(format!("・前回（{}）の施術後RMSSD：{rmssd}", previous.date));
    }

    lines
}

fn score_text(score: Option<u8>) -> String {
    score.map_or_else(|| INSUFFICIENT_DATA.to_string(), |s| s.to_string())
}
