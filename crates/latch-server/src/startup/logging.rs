//! Logging bootstrap
//!
//! Console layer with a per-layer `EnvFilter`, plus an optional daily-rolling
//! file layer. The returned guard must stay alive for the process lifetime so
//! buffered file output is flushed.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Logging settings resolved from configuration
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub console_level: String,
    pub file_logging: bool,
    pub log_dir: String,
    pub file_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: "info".to_string(),
            file_logging: false,
            log_dir: "logs".to_string(),
            file_level: "info".to_string(),
        }
    }
}

/// Keeps non-blocking writer guards alive
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, Box<dyn std::error::Error>> {
    let mut guards: Vec<WorkerGuard> = Vec::new();

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.console_level.clone()));
    let console_layer = fmt::layer()
        .with_target(true)
        .with_filter(console_filter);

    let file_layer = if config.file_logging {
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "latch.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        let filter = EnvFilter::new(config.file_level.clone());
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(LoggingGuard { _guards: guards })
}
