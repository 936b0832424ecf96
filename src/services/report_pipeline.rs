//! The report pipeline: resolve, assemble, generate, validate, persist.
//!
//! `generate_report` always returns a report and a compliant next action.
//! Resolution problems degrade to the caller's fallback data and a failed
//! save is reported in the outcome rather than as an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, GenerateReportRequest, PersistenceStatus, ReportOutcome, ReportRecord};
use crate::domain::ports::{ReportStore, TextGenerator, VisitStore};
use crate::services::fallback_action::FallbackActionGenerator;
use crate::services::generation_client::GenerationClient;
use crate::services::input_assembler::{assemble, input_usage};
use crate::services::prompt_contract::PromptContract;
use crate::services::report_gateway::{combine_report_text, ReportGateway};
use crate::services::report_validator::ReportValidator;
use crate::services::retry_controller::RetryController;
use crate::services::visit_normalizer::VisitNormalizer;
use crate::services::visit_resolver::VisitResolver;

pub struct ReportPipeline {
    resolver: VisitResolver<dyn VisitStore>,
    controller: RetryController,
    gateway: ReportGateway<dyn ReportStore>,
}

impl ReportPipeline {
    /// Wire the pipeline from its three capabilities and the loaded config.
    pub fn new(
        visits: Arc<dyn VisitStore>,
        reports: Arc<dyn ReportStore>,
        generator: Arc<dyn TextGenerator>,
        config: &Config,
    ) -> Self {
        let store_timeout = Duration::from_secs(config.database.query_timeout_secs);
        let min_chars = config.validation.min_chars();

        Self {
            resolver: VisitResolver::new(
                visits,
                VisitNormalizer::new(config.normalizer.duplicate_phase),
                store_timeout,
            ),
            controller: RetryController::new(
                GenerationClient::new(generator, Duration::from_secs(config.generation.timeout_secs)),
                PromptContract::new(min_chars),
                ReportValidator::new(min_chars),
                FallbackActionGenerator::new(config.fallback.seed),
            ),
            gateway: ReportGateway::new(reports, store_timeout),
        }
    }

    /// Generate, validate and persist the report for a request.
    #[instrument(skip(self, request), fields(customer_id = ?request.customer_id, visit_id = ?request.visit_id))]
    pub async fn generate_report(&self, request: &GenerateReportRequest) -> ReportOutcome {
        let resolution = self.resolver.resolve(request.customer_id, request.visit_id).await;
        let input = assemble(&resolution, &request.fallback);
        let input_used = input_usage(&input);
        tracing::info!(
            has_current = resolution.current.is_some(),
            has_previous = resolution.previous.is_some(),
            has_subjective_after = input_used.has_subjective_after,
            "report input assembled"
        );

        let resolved = self.controller.run(&input).await;
        let origin = self.controller.origin().to_string();

        let visit_id = resolution.current.as_ref().map(|v| v.id);
        let persistence = match visit_id {
            Some(visit_id) => {
                let text = combine_report_text(&resolved.report, &resolved.next_action);
                match self.gateway.save(visit_id, &text, &origin).await {
                    Ok(saved) => PersistenceStatus::Saved { report_id: saved.record.id, updated: saved.updated },
                    Err(e) => {
                        tracing::error!(%visit_id, error = %e, "failed to save report");
                        PersistenceStatus::Failed { error: e.to_string() }
                    }
                }
            }
            None => {
                tracing::info!("no resolved visit, report not persisted");
                PersistenceStatus::NotAttempted
            }
        };

        tracing::info!(
            used_fallback = resolved.used_fallback,
            attempts = resolved.attempts.len(),
            report_chars = resolved.report.chars().count(),
            "report generated"
        );

        ReportOutcome {
            report: resolved.report,
            next_action: resolved.next_action,
            used_fallback: resolved.used_fallback,
            origin,
            visit_id,
            input_used,
            attempts: resolved.attempts,
            persistence,
        }
    }

    /// The authoritative saved report of a visit.
    pub async fn latest_report(&self, visit_id: Uuid) -> DomainResult<Option<ReportRecord>> {
        self.gateway.latest(visit_id).await
    }
}
