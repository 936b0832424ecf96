use super::config::{LogConfig, LogFormat, RotationPolicy};
use anyhow::Result;
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_NAME: &str = "salon-report.log";

/// Logger implementation using tracing.
///
/// Console output goes to stderr so stdout stays free for command output.
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Initialize the global subscriber. RUST_LOG overrides the configured level.
    ///
    /// Keep the returned value alive for the life of the process; dropping it
    /// flushes and stops the file writer.
    pub fn init(config: &LogConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let console_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_target(true)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact()
                .boxed(),
        };

        let guard = if let Some(ref log_dir) = config.log_dir {
            let file_appender = match config.rotation {
                RotationPolicy::Daily => rolling::daily(log_dir, LOG_FILE_NAME),
                RotationPolicy::Hourly => rolling::hourly(log_dir, LOG_FILE_NAME),
                RotationPolicy::Never => rolling::never(log_dir, LOG_FILE_NAME),
            };
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            // Files are always JSON.
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(console_layer.and_then(file_layer).with_filter(env_filter))
                .try_init()?;
            Some(guard)
        } else {
            tracing_subscriber::registry()
                .with(console_layer.with_filter(env_filter))
                .try_init()?;
            None
        };

        tracing::debug!(
            level = %config.level,
            format = ?config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }
}

/// Parse log level string to Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}
