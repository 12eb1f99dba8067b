//! Config file read/write.

use crate::schema::CaptureConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "hooks.yaml";

/// Resolve the config directory.
/// Priority: `SINGLEFILE_CONFIG_DIR` env > `~/.singlefile/` > `./.singlefile`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SINGLEFILE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".singlefile"),
        None => PathBuf::from(".singlefile"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<CaptureConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(CaptureConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: CaptureConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Write config to disk atomically (write to temp file, rename).
pub async fn write_config(config: &CaptureConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path).await.with_context(|| {
        format!("Failed to rename temp config to: {}", path.display())
    })?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("singlefile-config-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let path = config_file_path(&scratch_dir());
        let config = load_config(&path).await.unwrap();
        assert_eq!(config, CaptureConfig::default());
    }

    #[tokio::test]
    async fn test_write_then_load() {
        let dir = scratch_dir();
        let path = config_file_path(&dir);
        let mut config = CaptureConfig::default();
        config.deferred_images.load_deferred_images_keep_zoom_level = true;
        config.logging.level = Some("warn".into());

        write_config(&config, &path).await.unwrap();
        let loaded = load_config(&path).await.unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_an_error() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).await.unwrap();
        let path = config_file_path(&dir);
        fs::write(&path, "logging: [not, a, map]").await.unwrap();
        assert!(load_config(&path).await.is_err());
        let _ = fs::remove_dir_all(&dir).await;
    }
}
