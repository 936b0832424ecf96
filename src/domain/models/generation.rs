//! Generation attempt bookkeeping shared by the pipeline services.

use serde::{Deserialize, Serialize};

/// The two contract variants, selected by retry-controller state.
///
/// Both state the same rules; `Strict` restates them forcefully together with
/// the constraints the previous attempt violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractVariant {
    Base,
    Strict,
}

impl ContractVariant {
    /// Attempt order. Its length is the hard bound on generation calls per request.
    pub const ORDER: [Self; 2] = [Self::Base, Self::Strict];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Strict => "strict",
        }
    }
}

/// Which response convention the two logical fields were recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// `<report>…</report>` / `<next_action>…</next_action>` spans.
    Tags,
    /// The whole response parsed as a two-key object.
    DirectJson,
    /// A JSON object found inside the response (fenced block or outer brace span).
    ScannedJson,
    /// Nothing structured found; the whole response is the report.
    RawText,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::DirectJson => "direct_json",
            Self::ScannedJson => "scanned_json",
            Self::RawText => "raw_text",
        }
    }
}

/// What happened during one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptSummary {
    pub variant: ContractVariant,
    /// `None` when the backend call itself failed.
    pub strategy: Option<ExtractionStrategy>,
    pub report_ok: bool,
    pub next_action_ok: bool,
    /// Violation codes, e.g. `missing_heading`, `next_action_length`.
    pub violations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
