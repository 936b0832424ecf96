use std::path::PathBuf;

use crate::domain::models::LoggingConfig;

/// Resolved logging settings.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format for stderr
    pub format: LogFormat,

    /// Directory for log files (stderr only when None)
    pub log_dir: Option<PathBuf>,

    /// Log rotation policy
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

impl RotationPolicy {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Self::Hourly,
            "never" => Self::Never,
            _ => Self::Daily,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from(&LoggingConfig::default())
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            format: LogFormat::parse(&config.format),
            log_dir: config.log_dir.as_ref().map(PathBuf::from),
            rotation: RotationPolicy::parse(&config.rotation),
        }
    }
}
