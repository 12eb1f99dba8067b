//! Structured Logger
//!
//! Wraps `tracing` to provide console output (plain or JSON), optional daily
//! NDJSON file rotation, and environment-based level control.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "singlefile-hooks.log";

#[derive(Debug, Clone, Copy)]
pub struct LoggerOptions<'a> {
    /// Default filter when `RUST_LOG` is unset.
    pub level: &'a str,
    /// Emit console logs as JSON lines.
    pub json: bool,
    /// Also write NDJSON to `<dir>/singlefile-hooks.log.YYYY-MM-DD`.
    pub log_dir: Option<&'a Path>,
}

impl Default for LoggerOptions<'_> {
    fn default() -> Self {
        Self { level: "info", json: false, log_dir: None }
    }
}

/// Initialize the global subscriber. Console output goes to stderr so stdout
/// stays free for command results.
pub fn init_logger(options: &LoggerOptions<'_>) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(options.level));

    let console_plain = (!options.json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });
    let console_json = options
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));

    let file_layer = match options.log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .build(dir)
                .with_context(|| format!("Failed to open log directory: {}", dir.display()))?;
            Some(fmt::layer().json().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_plain)
        .with(console_json)
        .with(file_layer)
        .try_init()
        .context("Global logger already initialized")?;
    Ok(())
}
