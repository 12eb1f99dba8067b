//! `singlefile-config` — capture bridge configuration.
//!
//! Provides:
//! - Typed config schema (deferred-image flags, hooks script path, logging)
//! - YAML read/write
//! - `SINGLEFILE_*` environment overrides
//! - Validation with path-qualified warnings

pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, apply_env_overrides_with, InvalidEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{CaptureConfig, LoggingConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::path::Path;

/// Load a config file, apply env overrides, and validate.
///
/// The report is returned rather than logged so callers can install their
/// logger from the loaded config first.
pub async fn load_and_prepare(path: &Path) -> Result<(CaptureConfig, ValidationReport)> {
    let config = load_config(path).await?;
    let config = apply_env_overrides(config).context("Failed to apply env overrides")?;
    let report = validate(&config);
    Ok((config, report))
}
