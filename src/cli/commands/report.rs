//! Report CLI commands.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::adapters::generators::{OpenAiCompatibleGenerator, ScriptedGenerator};
use crate::cli::context::AppContext;
use crate::cli::output::{or_dash, output, CommandOutput};
use crate::domain::models::{
    Config, FallbackData, GenerateReportRequest, PersistenceStatus, ReportOutcome, ReportRecord,
};
use crate::domain::ports::{TextGenerator, VisitStore};
use crate::services::numeric::percent_delta;
use crate::services::{ReportGateway, ReportPipeline, VisitNormalizer};

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommands,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Generate (or regenerate) the report for a visit
    Generate {
        /// Customer ID; the latest visit is used when --visit is absent
        #[arg(short, long)]
        customer: Option<Uuid>,
        /// Visit ID
        #[arg(short, long)]
        visit: Option<Uuid>,
        /// JSON file with fallback values for missing data
        #[arg(short, long)]
        fallback: Option<PathBuf>,
        /// Skip the generation backend and use the deterministic fallback
        #[arg(long)]
        offline: bool,
    },
    /// Show the saved report of a visit
    Show {
        /// Visit ID
        visit: Uuid,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct GenerateOutput {
    #[serde(flatten)]
    pub outcome: ReportOutcome,
}

impl CommandOutput for GenerateOutput {
    fn to_human(&self) -> String {
        let outcome = &self.outcome;
        let mut lines = vec![
            outcome.report.clone(),
            String::new(),
            format!("次回までの1アクション：{}", outcome.next_action),
            String::new(),
            format!("origin: {}  fallback: {}  attempts: {}", outcome.origin, outcome.used_fallback, outcome.attempts.len()),
        ];
        lines.push(match &outcome.persistence {
            PersistenceStatus::Saved { report_id, updated } => {
                format!("saved: {report_id}{}", if *updated { " (updated)" } else { "" })
            }
            PersistenceStatus::NotAttempted => "not saved: no visit resolved".to_string(),
            PersistenceStatus::Failed { error } => format!("save failed: {error}"),
        });
        lines.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ShowOutput {
    pub visit_id: Uuid,
    pub report: Option<ReportRecord>,
    pub before_rmssd: Option<f64>,
    pub after_rmssd: Option<f64>,
    /// RMSSD change in percent, 0 when it cannot be computed.
    pub improvement_rate: i64,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Visit: {}", self.visit_id),
            format!(
                "RMSSD: {} → {} ({:+}%)",
                or_dash(self.before_rmssd),
                or_dash(self.after_rmssd),
                self.improvement_rate
            ),
        ];
        match &self.report {
            Some(report) => {
                lines.push(format!("Origin: {}  Updated: {}", report.origin, report.updated_at.to_rfc3339()));
                lines.push(String::new());
                lines.push(report.report_text.clone());
            }
            None => lines.push("No report saved for this visit.".to_string()),
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ReportArgs, config: Config, json_mode: bool) -> Result<()> {
    match args.command {
        ReportCommands::Generate { customer, visit, fallback, offline } => {
            if customer.is_none() && visit.is_none() && fallback.is_none() {
                bail!("Provide --customer, --visit or --fallback");
            }
            let fallback = match fallback {
                Some(path) => read_fallback(&path).await?,
                None => FallbackData::default(),
            };
            let generator = build_generator(&config, offline)?;
            let ctx = AppContext::open(config).await?;
            let pipeline = ReportPipeline::new(ctx.visits(), ctx.reports(), generator, &ctx.config);

            let request = GenerateReportRequest { customer_id: customer, visit_id: visit, fallback };
            let outcome = pipeline.generate_report(&request).await;
            output(&GenerateOutput { outcome }, json_mode);
        }
        ReportCommands::Show { visit } => {
            let ctx = AppContext::open(config).await?;
            let visits = ctx.visits();
            let record = visits.get_visit(visit).await.context("Failed to load visit")?;
            let Some(record) = record else {
                bail!("Visit not found: {visit}");
            };

            let normalized = VisitNormalizer::new(ctx.config.normalizer.duplicate_phase).normalize(Some(&record));
            let before_rmssd = normalized.as_ref().and_then(|v| v.before).and_then(|m| m.rmssd);
            let after_rmssd = normalized.as_ref().and_then(|v| v.after).and_then(|m| m.rmssd);

            let gateway = ReportGateway::new(ctx.reports(), Duration::from_secs(ctx.config.database.query_timeout_secs));
            let report = gateway.latest(visit).await.context("Failed to load report")?;

            output(
                &ShowOutput {
                    visit_id: visit,
                    report,
                    before_rmssd,
                    after_rmssd,
                    improvement_rate: percent_delta(before_rmssd, after_rmssd).unwrap_or(0),
                },
                json_mode,
            );
        }
    }
    Ok(())
}

fn build_generator(config: &Config, offline: bool) -> Result<Arc<dyn TextGenerator>> {
    if offline {
        return Ok(Arc::new(ScriptedGenerator::new("offline")));
    }
    let generator = OpenAiCompatibleGenerator::new(config.generation.clone())
        .context("Generation backend is not configured; set the API key or pass --offline")?;
    Ok(Arc::new(generator))
}

async fn read_fallback(path: &Path) -> Result<FallbackData> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid fallback data in {}", path.display()))
}
