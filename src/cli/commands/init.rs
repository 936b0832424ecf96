//! Implementation of the `salon-report init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use crate::adapters::sqlite::{database_url, initialize_database};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::CONFIG_DIR;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub config_written: bool,
    pub database_path: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!("\nWrote {CONFIG_DIR}/config.yaml"));
        }
        lines.push(format!("Database ready at {}", self.database_path.display()));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir().context("Failed to get current directory")?.join(&args.path)
    };

    let config_dir = target_path.join(CONFIG_DIR);
    fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    let config_path = config_dir.join("config.yaml");
    let config_written = if config_path.exists() && !args.force {
        false
    } else {
        let yaml = serde_yaml::to_string(&Config::default()).context("Failed to render default config")?;
        fs::write(&config_path, yaml)
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        true
    };

    let database_path = target_path.join(&config.database.path);
    initialize_database(&database_url(&database_path.to_string_lossy()), None)
        .await
        .context("Failed to initialize database")?;

    let output_data = InitOutput {
        success: true,
        message: if config_written {
            "Project initialized successfully.".to_string()
        } else {
            "Config already present; database checked. Use --force to rewrite the config.".to_string()
        },
        initialized_path: target_path,
        config_written,
        database_path,
    };

    output(&output_data, json_mode);
    Ok(())
}
