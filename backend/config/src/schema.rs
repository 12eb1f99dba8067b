//! Capture bridge configuration schema.
//!
//! Deserialized from YAML; keys are camelCase so the deferred-image flags use
//! the same names the capture pipeline passes at runtime.

use serde::{Deserialize, Serialize};
use singlefile_core::LoadDeferredImagesOptions;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    /// `loadDeferredImagesBlockCookies`, `…BlockStorage`, `…KeepZoomLevel`
    #[serde(flatten)]
    pub deferred_images: LoadDeferredImagesOptions,

    /// Internal path of the extra page-realm hooks script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks_script_path: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CaptureConfig {
    pub fn deferred_images_options(&self) -> LoadDeferredImagesOptions {
        self.deferred_images
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Emit console logs as JSON lines
    #[serde(default)]
    pub json: bool,

    /// Directory for rolling NDJSON log files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn level_or_default(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }
}
