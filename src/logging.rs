//! Tracing setup.
//!
//! The terminal console owns stdout, so it logs to a daily-rolling file.
//! The headless `send`/`template` commands log to stderr instead.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "amas_console=info";

/// Log file name prefix inside the log directory.
const LOG_FILE_PREFIX: &str = "amas-console.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Route logs to `<log_dir>/amas-console.log.<date>`.
pub fn init_file_logging(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(appender),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Route logs to stderr, keeping stdout for command output.
pub fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
