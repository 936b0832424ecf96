//! salon-report CLI entry point.

use anyhow::Result;
use clap::Parser;

use salon_report::cli::commands::{init, report, visit};
use salon_report::cli::{handle_error, Cli, Commands};
use salon_report::domain::models::Config;
use salon_report::infrastructure::config::ConfigLoader;
use salon_report::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config: Config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    match cli.command {
        Commands::Init(args) => init::execute(args, &config, cli.json).await,
        Commands::Report(args) => report::execute(args, config, cli.json).await,
        Commands::Visit(args) => visit::execute(args, config, cli.json).await,
    }
}
