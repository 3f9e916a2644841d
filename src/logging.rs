// Logging setup: stderr plus a daily-rolling server.log in the data directory
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::Result;

/// Default filter for the configured level. Debug mode lowers our own
/// crate and the `api` target to debug while dependencies stay at warn.
pub fn default_filter(logging: &LoggingConfig) -> String {
    if logging.debug_mode {
        "shipping_copilot=debug,api=debug,warn".to_string()
    } else {
        format!("shipping_copilot={},api=warn,warn", logging.level)
    }
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
pub fn init_logging(logging: &LoggingConfig, log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "server.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(logging)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| crate::error::CopilotError::Config(format!("failed to install logger: {}", e)))?;

    Ok(guard)
}
