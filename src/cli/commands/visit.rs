//! Visit CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{or_dash, output, truncate, CommandOutput};
use crate::domain::models::{Config, VisitRecord};
use crate::domain::ports::VisitStore;
use crate::services::VisitNormalizer;

#[derive(Args, Debug)]
pub struct VisitArgs {
    #[command(subcommand)]
    pub command: VisitCommands,
}

#[derive(Subcommand, Debug)]
pub enum VisitCommands {
    /// Record a visit with its measurement and self-report rows from a JSON file
    Record {
        /// Path to the visit JSON
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List the most recent visits of a customer
    List {
        /// Customer ID
        #[arg(short, long)]
        customer: Uuid,
        /// Maximum number of visits to display
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct RecordOutput {
    pub visit_id: Uuid,
    pub customer_id: Uuid,
    pub measurements: usize,
    pub self_reports: usize,
}

impl CommandOutput for RecordOutput {
    fn to_human(&self) -> String {
        format!(
            "Recorded visit {} for customer {} ({} measurement row(s), {} self-report row(s))",
            self.visit_id, self.customer_id, self.measurements, self.self_reports
        )
    }
}

#[derive(Debug, serde::Serialize)]
pub struct VisitSummary {
    pub id: Uuid,
    pub visit_date: String,
    pub created_at: String,
    pub menu: Option<String>,
    pub before_rmssd: Option<f64>,
    pub after_rmssd: Option<f64>,
}

#[derive(Debug, serde::Serialize)]
pub struct VisitListOutput {
    pub customer_id: Uuid,
    pub visits: Vec<VisitSummary>,
    pub total: usize,
}

impl CommandOutput for VisitListOutput {
    fn to_human(&self) -> String {
        if self.visits.is_empty() {
            return "No visits found.".to_string();
        }

        let mut lines = vec![format!("Found {} visit(s):\n", self.total)];
        lines.push(format!("{:<36}  {:<10}  {:<20}  {:>7}  {:>7}", "ID", "DATE", "MENU", "BEFORE", "AFTER"));
        lines.push("-".repeat(88));
        for visit in &self.visits {
            lines.push(format!(
                "{:<36}  {:<10}  {:<20}  {:>7}  {:>7}",
                visit.id,
                visit.visit_date,
                truncate(visit.menu.as_deref().unwrap_or("-"), 20),
                or_dash(visit.before_rmssd),
                or_dash(visit.after_rmssd)
            ));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: VisitArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let repo = ctx.visits();

    match args.command {
        VisitCommands::Record { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let visit: VisitRecord =
                serde_json::from_str(&content).with_context(|| format!("Invalid visit JSON in {}", file.display()))?;

            repo.record_visit(&visit).await.context("Failed to record visit")?;
            output(
                &RecordOutput {
                    visit_id: visit.id,
                    customer_id: visit.customer_id,
                    measurements: visit.measurements.len(),
                    self_reports: visit.self_reports.len(),
                },
                json_mode,
            );
        }
        VisitCommands::List { customer, limit } => {
            let normalizer = VisitNormalizer::new(ctx.config.normalizer.duplicate_phase);
            let visits = repo.get_latest_visits(customer, limit).await.context("Failed to list visits")?;
            let visits: Vec<VisitSummary> = visits.iter().map(|v| summarize(&normalizer, v)).collect();

            output(&VisitListOutput { customer_id: customer, total: visits.len(), visits }, json_mode);
        }
    }
    Ok(())
}

fn summarize(normalizer: &VisitNormalizer, visit: &VisitRecord) -> VisitSummary {
    let normalized = normalizer.normalize(Some(visit));
    VisitSummary {
        id: visit.id,
        visit_date: visit.visit_date.format("%Y-%m-%d").to_string(),
        created_at: visit.created_at.to_rfc3339(),
        menu: visit.menu.clone(),
        before_rmssd: normalized.as_ref().and_then(|v| v.before).and_then(|m| m.rmssd),
        after_rmssd: normalized.as_ref().and_then(|v| v.after).and_then(|m| m.rmssd),
    }
}
