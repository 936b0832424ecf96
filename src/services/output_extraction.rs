//! Extraction of `report` / `next_action` from raw backend text.
//!
//! Strategies are tried in a fixed order and the first success wins:
//! delimiter tags, the whole response as a JSON object, a JSON object found
//! inside the response, and finally the raw text as the report.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::models::ExtractionStrategy;

static REPORT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<report>(.*?)</report>").expect("valid report tag pattern"));
static NEXT_ACTION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<next_action>(.*?)</next_action>").expect("valid next_action tag pattern")
});
static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("valid fence pattern"));
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid code fence pattern"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+\n").expect("valid blank-run pattern"));

/// The two logical fields and the strategy that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedOutput {
    pub report: String,
    pub next_action: Option<String>,
    pub strategy: ExtractionStrategy,
}

/// Extract both fields from a raw response.
pub fn extract(raw: &str) -> ExtractedOutput {
    let (report, next_action, strategy) = from_tags(raw)
        .map(|(r, n)| (r, n, ExtractionStrategy::Tags))
        .or_else(|| from_direct_json(raw).map(|(r, n)| (r, n, ExtractionStrategy::DirectJson)))
        .or_else(|| from_scanned_json(raw).map(|(r, n)| (r, n, ExtractionStrategy::ScannedJson)))
        .unwrap_or_else(|| (raw.to_string(), None, ExtractionStrategy::RawText));

    ExtractedOutput {
        report: sanitize_report(&report),
        next_action: next_action.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        strategy,
    }
}

fn from_tags(raw: &str) -> Option<(String, Option<String>)> {
    let report = REPORT_TAG.captures(raw)?.get(1)?.as_str().to_string();
    let next_action = NEXT_ACTION_TAG
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    Some((report, next_action))
}

fn from_direct_json(raw: &str) -> Option<(String, Option<String>)> {
    match serde_json::from_str::<Value>(raw.trim()).ok()? {
        Value::Object(map) => fields_from_object(&map),
        _ => None,
    }
}

fn from_scanned_json(raw: &str) -> Option<(String, Option<String>)> {
    let fenced = JSON_FENCE
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .find_map(|m| parse_object(m.as_str()));
    if fenced.is_some() {
        return fenced;
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&raw[start..=end])
}

fn parse_object(candidate: &str) -> Option<(String, Option<String>)> {
    match serde_json::from_str::<Value>(candidate).ok()? {
        Value::Object(map) => fields_from_object(&map),
        _ => None,
    }
}

/// An object counts only if it has a string `report`.
fn fields_from_object(map: &Map<String, Value>) -> Option<(String, Option<String>)> {
    let report = map.get("report")?.as_str()?.to_string();
    let next_action = map
        .get("next_action")
        .or_else(|| map.get("nextAction"))
        .and_then(Value::as_str)
        .map(ToString::to_string);
    Some((report, next_action))
}

/// Remove code fences and leaked JSON-object lines, then tidy whitespace.
pub fn sanitize_report(report: &str) -> String {
    let without_fences = CODE_FENCE.replace_all(report, "");
    let without_json = strip_json_blocks(&without_fences);
    BLANK_RUNS
        .replace_all(&without_json, "\n\n")
        .trim()
        .to_string()
}

/// Drop runs of whole lines that together parse as a JSON object.
fn strip_json_blocks(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut kept = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        if lines[i].trim_start().starts_with('{') {
            let block_end = (i..lines.len()).find(|&j| {
                lines[j].trim_end().ends_with('}')
                    && matches!(
                        serde_json::from_str::<Value>(&lines[i..=j].join("\n")),
                        Ok(Value::Object(_))
                    )
            });
            if let Some(j) = block_end {
                i = j + 1;
                continue;
            }
        }
        kept.push(lines[i]);
        i += 1;
    }

    kept.join("\n")
}
