//! CLI type definitions
//!
//! This module contains the top-level clap structures; each command group
//! defines its own arguments next to its implementation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::init::InitArgs;
use super::commands::report::ReportArgs;
use super::commands::visit::VisitArgs;

#[derive(Parser, Debug)]
#[command(name = "salon-report")]
#[command(about = "Post-treatment reports for salon visits from HRV and self-reported wellbeing", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .salon-report/
    #[arg(long, global = true, env = "SALON_REPORT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration and database
    Init(InitArgs),

    /// Generate and inspect reports
    Report(ReportArgs),

    /// Record and list visits
    Visit(VisitArgs),
}
