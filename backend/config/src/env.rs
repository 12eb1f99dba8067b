//! Environment variable overrides for config values.
//!
//! Boolean variables accept `1/true/yes/on` and `0/false/no/off`
//! (case-insensitive); anything else is an error naming the variable.

use std::collections::HashMap;

use crate::schema::CaptureConfig;

pub const ENV_BLOCK_COOKIES: &str = "SINGLEFILE_BLOCK_COOKIES";
pub const ENV_BLOCK_STORAGE: &str = "SINGLEFILE_BLOCK_STORAGE";
pub const ENV_KEEP_ZOOM_LEVEL: &str = "SINGLEFILE_KEEP_ZOOM_LEVEL";
pub const ENV_LOG_LEVEL: &str = "SINGLEFILE_LOG_LEVEL";

/// Error returned for an env var whose value cannot be used.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value \"{value}\" for env var \"{var_name}\": expected a boolean")]
pub struct InvalidEnvVarError {
    pub var_name: String,
    pub value: String,
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: CaptureConfig) -> Result<CaptureConfig, InvalidEnvVarError> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: CaptureConfig,
    env: &HashMap<String, String>,
) -> Result<CaptureConfig, InvalidEnvVarError> {
    let flags = &mut config.deferred_images;
    if let Some(value) = bool_var(env, ENV_BLOCK_COOKIES)? {
        flags.load_deferred_images_block_cookies = value;
    }
    if let Some(value) = bool_var(env, ENV_BLOCK_STORAGE)? {
        flags.load_deferred_images_block_storage = value;
    }
    if let Some(value) = bool_var(env, ENV_KEEP_ZOOM_LEVEL)? {
        flags.load_deferred_images_keep_zoom_level = value;
    }
    if let Some(level) = env.get(ENV_LOG_LEVEL).filter(|l| !l.is_empty()) {
        config.logging.level = Some(level.clone());
    }
    Ok(config)
}

fn bool_var(env: &HashMap<String, String>, name: &str) -> Result<Option<bool>, InvalidEnvVarError> {
    let Some(raw) = env.get(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(InvalidEnvVarError {
            var_name: name.to_string(),
            value: raw.clone(),
        }),
    }
}
