//! Config validation with path-qualified messages.

use crate::schema::CaptureConfig;
use thiserror::Error;

const KNOWN_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// A config validation finding with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Log warnings and errors through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
        for error in &self.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &CaptureConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_hooks_script(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_hooks_script(config: &CaptureConfig, report: &mut ValidationReport) {
    let Some(path) = &config.hooks_script_path else { return };
    if path.trim().is_empty() {
        report.error("hooksScriptPath", "Must not be empty");
    } else if !path.starts_with('/') {
        report.warn(
            "hooksScriptPath",
            "Internal resource paths are resolved from the extension root and should start with '/'",
        );
    }
}

fn validate_logging(config: &CaptureConfig, report: &mut ValidationReport) {
    let Some(level) = &config.logging.level else { return };
    // Directives such as `singlefile_hooks=debug` are passed through to the filter.
    if !level.contains('=') && !KNOWN_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.warn("logging.level", format!("Unknown log level \"{level}\""));
    }
}
