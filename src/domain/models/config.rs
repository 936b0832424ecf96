use serde::{Deserialize, Serialize};

/// Main configuration structure for the report service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Text-generation backend configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Output contract thresholds
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Visit normalization policy
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    /// Deterministic fallback settings
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Upper bound for a single store call made by the pipeline
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

fn default_database_path() -> String {
    ".salon-report/salon.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_query_timeout_secs() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Text-generation backend configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Base URL of the chat-completions API (without the `/chat/completions` suffix)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name, also used as the origin label of saved reports
    #[serde(default = "default_model")]
    pub model: String,

    /// Explicit API key; read from `api_key_env` when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout for one generation call; a timeout counts as a failed attempt
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_max_tokens() -> u32 {
    4000
}

const fn default_generation_timeout_secs() -> u64 {
    60
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    /// Get API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Strictness tier for the report length check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    #[default]
    Standard,
    Strict,
}

/// Output contract thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ValidationConfig {
    #[serde(default)]
    pub strictness: Strictness,

    /// Minimum report length (characters) in the standard tier
    #[serde(default = "default_min_report_chars")]
    pub min_report_chars: usize,

    /// Minimum report length (characters) in the strict tier
    #[serde(default = "default_strict_min_report_chars")]
    pub strict_min_report_chars: usize,
}

const fn default_min_report_chars() -> usize {
    220
}

const fn default_strict_min_report_chars() -> usize {
    320
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strictness: Strictness::default(),
            min_report_chars: default_min_report_chars(),
            strict_min_report_chars: default_strict_min_report_chars(),
        }
    }
}

impl ValidationConfig {
    /// The lower length bound for the configured tier.
    pub fn min_chars(&self) -> usize {
        match self.strictness {
            Strictness::Standard => self.min_report_chars,
            Strictness::Strict => self.strict_min_report_chars,
        }
    }
}

/// Which row wins when a visit carries more than one row for the same phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePhasePolicy {
    /// First row in store order
    #[default]
    FirstFound,
    /// Last row in store order (the most recently recorded)
    LastFound,
}

/// Visit normalization policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NormalizerConfig {
    #[serde(default)]
    pub duplicate_phase: DuplicatePhasePolicy,
}

/// Deterministic fallback settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FallbackConfig {
    /// Seed for picking among canned recommendations; entropy-seeded when unset
    #[serde(default)]
    pub seed: Option<u64>,
}
