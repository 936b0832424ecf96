use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding project-local configuration and the default database.
pub const CONFIG_DIR: &str = ".salon-report";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid {0}: must be at least 1 second")]
    ZeroTimeout(&'static str),

    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f32),

    #[error("Invalid max_tokens: must be at least 1")]
    ZeroMaxTokens,

    #[error("Invalid report length tiers: min_report_chars ({0}) must not exceed strict_min_report_chars ({1})")]
    InvalidLengthTiers(usize, usize),

    #[error("Generation base_url cannot be empty")]
    EmptyBaseUrl,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .salon-report/config.yaml (project config, created by init)
    /// 3. .salon-report/local.yaml (local overrides, optional)
    /// 4. Environment variables (SALON_REPORT_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(CONFIG_DIR)
    }

    /// Same as [`ConfigLoader::load`] with the config directory made explicit.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let config: Config = Self::figment(dir)
            .extract()
            .with_context(|| format!("Failed to extract configuration from {}", dir.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without the local overlay.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("SALON_REPORT_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(dir: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed("SALON_REPORT_").split("__"))
    }

    /// Path of the project config file inside `dir`.
    pub fn config_path(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join("config.yaml")
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }
        if config.database.query_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("database.query_timeout_secs"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        let generation = &config.generation;
        if generation.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if generation.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("generation.timeout_secs"));
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ConfigError::InvalidTemperature(generation.temperature));
        }
        if generation.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }

        let validation = &config.validation;
        if validation.min_report_chars > validation.strict_min_report_chars {
            return Err(ConfigError::InvalidLengthTiers(
                validation.min_report_chars,
                validation.strict_min_report_chars,
            ));
        }

        Ok(())
    }
}
