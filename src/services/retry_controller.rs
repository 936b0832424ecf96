//! Retry/fallback controller.
//!
//! `Initial → Retry → Resolved`. The initial attempt uses the base contract;
//! any violation moves to a single retry under the strict contract, after
//! which the controller always resolves. At most two generation calls are
//! made per request.
//!
//! Resolution picks each field independently: the retry's value if it
//! validates, else the original's if it validates, else the retry's non-empty
//! value, else the original's. A next action that still fails is replaced by
//! the deterministic fallback. A report that still fails is surfaced as the
//! best available text; only a missing report is replaced by the template.

use crate::domain::models::{AttemptSummary, ContractVariant, ReportInput};
use crate::services::fallback_action::{fallback_report, FallbackActionGenerator};
use crate::services::generation_client::GenerationClient;
use crate::services::output_extraction::ExtractedOutput;
use crate::services::prompt_contract::PromptContract;
use crate::services::report_validator::{ReportValidator, Verdict, Violation};

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Initial,
    Retry,
    Resolved,
}

impl ControllerState {
    /// Contract used for the attempt made in this state.
    pub fn variant(&self) -> Option<ContractVariant> {
        match self {
            Self::Initial => Some(ContractVariant::Base),
            Self::Retry => Some(ContractVariant::Strict),
            Self::Resolved => None,
        }
    }
}

/// Final fields plus what it took to get them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOutcome {
    pub report: String,
    pub next_action: String,
    pub used_fallback: bool,
    pub attempts: Vec<AttemptSummary>,
}

struct Candidate {
    output: ExtractedOutput,
    verdict: Verdict,
}

pub struct RetryController {
    client: GenerationClient,
    contract: PromptContract,
    validator: ReportValidator,
    fallback: FallbackActionGenerator,
}

impl RetryController {
    pub fn new(
        client: GenerationClient,
        contract: PromptContract,
        validator: ReportValidator,
        fallback: FallbackActionGenerator,
    ) -> Self {
        Self { client, contract, validator, fallback }
    }

    pub fn origin(&self) -> &str {
        self.client.origin()
    }

    /// Drive the state machine to `Resolved` for one input.
    pub async fn run(&self, input: &ReportInput) -> ControllerOutcome {
        let mut attempts = Vec::with_capacity(2);
        let mut original: Option<Candidate> = None;
        let mut retry: Option<Candidate> = None;
        let mut violated: Vec<Violation> = Vec::new();

        let user_content = match self.contract.user_content(input) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::error!(error = %e, "failed to render report input, skipping generation");
                None
            }
        };

        let mut state = if user_content.is_some() { ControllerState::Initial } else { ControllerState::Resolved };

        while let (Some(variant), Some(user_content)) = (state.variant(), user_content.as_deref()) {
            let system = self.contract.system_instruction(variant, &violated);
            let attempt_no = attempts.len() + 1;

            let candidate = match self.client.generate(&system, user_content).await {
                Ok(output) => {
                    let verdict = self.validator.validate(&output);
                    tracing::info!(
                        attempt = attempt_no,
                        variant = variant.as_str(),
                        strategy = verdict.strategy.as_str(),
                        report_ok = verdict.report_ok(),
                        next_action_ok = verdict.next_action_ok(),
                        violations = ?verdict.codes(),
                        "generation attempt validated"
                    );
                    attempts.push(AttemptSummary {
                        variant,
                        strategy: Some(verdict.strategy),
                        report_ok: verdict.report_ok(),
                        next_action_ok: verdict.next_action_ok(),
                        violations: verdict.codes(),
                        error: None,
                    });
                    Some(Candidate { output, verdict })
                }
                Err(e) => {
                    tracing::warn!(attempt = attempt_no, variant = variant.as_str(), error = %e, "generation attempt failed");
                    attempts.push(AttemptSummary {
                        variant,
                        strategy: None,
                        report_ok: false,
                        next_action_ok: false,
                        violations: Vec::new(),
                        error: Some(e.to_string()),
                    });
                    None
                }
            };

            let valid = candidate.as_ref().is_some_and(|c| c.verdict.is_valid());
            if let Some(c) = &candidate {
                violated = c.verdict.violations().cloned().collect();
            }

            state = match state {
                ControllerState::Initial => {
                    original = candidate;
                    if valid { ControllerState::Resolved } else { ControllerState::Retry }
                }
                ControllerState::Retry | ControllerState::Resolved => {
                    retry = candidate;
                    ControllerState::Resolved
                }
            };
        }

        self.resolve(input, original.as_ref(), retry.as_ref(), attempts)
    }

    fn resolve(
        &self,
        input: &ReportInput,
        original: Option<&Candidate>,
        retry: Option<&Candidate>,
        attempts: Vec<AttemptSummary>,
    ) -> ControllerOutcome {
        let report = select(
            original.map(|c| (c.output.report.as_str(), c.verdict.report_ok())),
            retry.map(|c| (c.output.report.as_str(), c.verdict.report_ok())),
        );
        let report_ok = [retry, original]
            .into_iter()
            .flatten()
            .any(|c| c.verdict.report_ok() && Some(c.output.report.as_str()) == report.as_deref());

        let next_action = select(
            original.and_then(|c| c.output.next_action.as_deref().map(|n| (n, c.verdict.next_action_ok()))),
            retry.and_then(|c| c.output.next_action.as_deref().map(|n| (n, c.verdict.next_action_ok()))),
        );
        let next_action_ok = [retry, original].into_iter().flatten().any(|c| {
            c.verdict.next_action_ok() && c.output.next_action.as_deref() == next_action.as_deref()
        });

        let mut used_fallback = false;

        let next_action = match next_action {
            Some(action) if next_action_ok => action,
            _ => {
                used_fallback = true;
                let action = self.fallback.next_action(input);
                tracing::info!(attempts = attempts.len(), "using fallback next action");
                action.to_string()
            }
        };

        let report = match report {
            Some(report) => {
                if !report_ok {
                    tracing::warn!(
                        attempts = attempts.len(),
                        chars = report.chars().count(),
                        "surfacing non-compliant report as best available"
                    );
                }
                report
            }
            None => {
                used_fallback = true;
                tracing::warn!(attempts = attempts.len(), "no report text generated, using template report");
                fallback_report(input, &next_action)
            }
        };

        ControllerOutcome { report, next_action, used_fallback, attempts }
    }
}

/// Per-field choice between the original and retry values.
fn select<'a>(original: Option<(&'a str, bool)>, retry: Option<(&'a str, bool)>) -> Option<String> {
    let non_empty = |v: Option<(&'a str, bool)>| v.filter(|(text, _)| !text.trim().is_empty());
    let (original, retry) = (non_empty(original), non_empty(retry));

    retry
        .filter(|(_, ok)| *ok)
        .or(original.filter(|(_, ok)| *ok))
        .or(retry)
        .or(original)
        .map(|(text, _)| text.to_string())
}
