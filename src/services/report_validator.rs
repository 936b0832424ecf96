//! Validation of extracted output against the report contract.
//!
//! The verdict keeps the two halves apart so the retry controller can tell
//! which one failed. Validation never errors; a failure is a list of
//! violations.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::ExtractionStrategy;
use crate::services::output_extraction::ExtractedOutput;
use crate::services::prompt_contract::{
    BANNED_TERMS, NEXT_ACTION_MAX_CHARS, NEXT_ACTION_MIN_CHARS, NEXT_VISIT_PHRASE, REQUIRED_HEADINGS,
    UNIT_TOKENS,
};

const RANGE_SEP: &str = r"\s*(?:〜|～|~|-|–|から)\s*";
const MONTH: &str = r"\s*[ヶかカヵ箇]\s*月";

static NEXT_VISIT_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let weeks = format!(r"3{RANGE_SEP}6\s*週間");
    let weeks_each = format!(r"3\s*週間{RANGE_SEP}6\s*週間");
    let months = format!(r"1{MONTH}{RANGE_SEP}1{MONTH}\s*半");
    Regex::new(&format!("{weeks}|{weeks_each}|{months}")).expect("valid next-visit pattern")
});
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("valid number pattern"));

/// Minimum distinct numbers a report must cite outside the next-visit phrase.
pub const MIN_NUMERIC_CITATIONS: usize = 2;

/// One broken contract rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    ReportEmpty,
    ReportTooShort { actual: usize, min: usize },
    MissingHeading(&'static str),
    MissingNextVisitRange,
    InsufficientNumericCitations { found: usize },
    NextActionMissing,
    NextActionLength { actual: usize },
    BannedTerm(&'static str),
    MissingDigit,
    MissingUnit,
    MultiLine,
}

impl Violation {
    /// Stable code used in attempt diagnostics and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReportEmpty => "report_empty",
            Self::ReportTooShort { .. } => "report_too_short",
            Self::MissingHeading(_) => "missing_heading",
            Self::MissingNextVisitRange => "missing_next_visit_range",
            Self::InsufficientNumericCitations { .. } => "insufficient_numeric_citations",
            Self::NextActionMissing => "next_action_missing",
            Self::NextActionLength { .. } => "next_action_length",
            Self::BannedTerm(_) => "banned_term",
            Self::MissingDigit => "missing_digit",
            Self::MissingUnit => "missing_unit",
            Self::MultiLine => "multi_line",
        }
    }

    /// The violated rule, restated as an instruction for the strict contract.
    pub fn restatement(&self) -> String {
        match self {
            Self::ReportEmpty => "レポート本文が空でした。<report>タグの中に本文を必ず書いてください。".to_string(),
            Self::ReportTooShort { actual, min } => {
                format!("本文が{actual}文字で短すぎます。{min}文字以上にしてください。")
            }
            Self::MissingHeading(heading) => format!("見出し「{heading}」が抜けています。必ず含めてください。"),
            Self::MissingNextVisitRange => {
                format!("【次回来店の目安】に「{NEXT_VISIT_PHRASE}」と明記してください。")
            }
            Self::InsufficientNumericCitations { found } => format!(
                "DATA の数値の引用が{found}個しかありません。半角数字で{MIN_NUMERIC_CITATIONS}個以上の異なる数値を引用してください。"
            ),
            Self::NextActionMissing => "next_action がありませんでした。<next_action>タグで必ず出力してください。".to_string(),
            Self::NextActionLength { actual } => format!(
                "next_action が{actual}文字でした。{NEXT_ACTION_MIN_CHARS}〜{NEXT_ACTION_MAX_CHARS}文字にしてください。"
            ),
            Self::BannedTerm(term) => format!("next_action に「{term}」を使わないでください。自宅でできる行動にしてください。"),
            Self::MissingDigit => "next_action に半角数字を含めてください。".to_string(),
            Self::MissingUnit => format!("next_action に単位（{}）を含めてください。", UNIT_TOKENS.join("・")),
            Self::MultiLine => "next_action は改行せず1行で書いてください。".to_string(),
        }
    }
}

/// Per-half validation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub report: Vec<Violation>,
    pub next_action: Vec<Violation>,
    /// How the output was recovered from the raw response.
    pub strategy: ExtractionStrategy,
}

impl Verdict {
    pub fn report_ok(&self) -> bool {
        self.report.is_empty()
    }

    pub fn next_action_ok(&self) -> bool {
        self.next_action.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.report_ok() && self.next_action_ok()
    }

    /// Both halves' violations, report first.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.report.iter().chain(self.next_action.iter())
    }

    pub fn codes(&self) -> Vec<String> {
        self.violations().map(|v| v.code().to_string()).collect()
    }
}

/// Checks report bodies and next actions.
#[derive(Debug, Clone, Copy)]
pub struct ReportValidator {
    min_report_chars: usize,
}

impl ReportValidator {
    pub fn new(min_report_chars: usize) -> Self {
        Self { min_report_chars }
    }

    pub fn validate(&self, output: &ExtractedOutput) -> Verdict {
        Verdict {
            report: self.validate_report(&output.report),
            next_action: validate_next_action(output.next_action.as_deref()),
            strategy: output.strategy,
        }
    }

    pub fn validate_report(&self, report: &str) -> Vec<Violation> {
        let report = report.trim();
        if report.is_empty() {
            return vec![Violation::ReportEmpty];
        }

        let mut violations = Vec::new();

        let actual = report.chars().count();
        if actual < self.min_report_chars {
            violations.push(Violation::ReportTooShort { actual, min: self.min_report_chars });
        }

        violations.extend(
            REQUIRED_HEADINGS
                .iter()
                .copied()
                .filter(|heading| !report.contains(heading))
                .map(Violation::MissingHeading),
        );

        if !NEXT_VISIT_RANGE.is_match(report) {
            violations.push(Violation::MissingNextVisitRange);
        }

        let found = count_numeric_citations(report);
        if found < MIN_NUMERIC_CITATIONS {
            violations.push(Violation::InsufficientNumericCitations { found });
        }

        violations
    }
}

/// Next-action rules do not depend on the strictness tier.
pub fn validate_next_action(next_action: Option<&str>) -> Vec<Violation> {
    let Some(action) = next_action.map(str::trim).filter(|a| !a.is_empty()) else {
        return vec![Violation::NextActionMissing];
    };

    let mut violations = Vec::new();

    let actual = action.chars().count();
    if !(NEXT_ACTION_MIN_CHARS..=NEXT_ACTION_MAX_CHARS).contains(&actual) {
        violations.push(Violation::NextActionLength { actual });
    }

    violations.extend(
        BANNED_TERMS
            .iter()
            .copied()
            .filter(|term| action.contains(term))
            .map(Violation::BannedTerm),
    );

    if !action.chars().any(|c| c.is_ascii_digit()) {
        violations.push(Violation::MissingDigit);
    }

    if !UNIT_TOKENS.iter().any(|unit| action.contains(unit)) {
        violations.push(Violation::MissingUnit);
    }

    if action.contains('\n') || action.contains('\r') {
        violations.push(Violation::MultiLine);
    }

    violations
}

/// Distinct numbers cited once the next-visit phrase is removed.
fn count_numeric_citations(report: &str) -> usize {
    let without_range = NEXT_VISIT_RANGE.replace_all(report, "");
    NUMBER
        .find_iter(&without_range)
        .map(|m| m.as_str())
        .collect::<HashSet<_>>()
        .len()
}
