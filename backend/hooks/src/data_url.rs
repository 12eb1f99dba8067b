//! Binary font payload → inline CSS source text.

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use singlefile_core::HookError;

/// Media type given to untyped binary payloads.
pub const OCTET_STREAM: &str = "application/octet-stream";

pub fn to_data_url(payload: &[u8]) -> String {
    format!("data:{};base64,{}", OCTET_STREAM, STANDARD.encode(payload))
}

/// Wrap a data URL as a CSS `url()` token.
pub fn to_css_url(data_url: &str) -> String {
    format!("url({data_url})")
}

/// Encode `payload` off the calling task and return `url(data:…)`.
pub async fn read_as_css_url(payload: Bytes) -> Result<String, HookError> {
    let data_url = tokio::task::spawn_blocking(move || to_data_url(&payload))
        .await
        .map_err(|e| HookError::Conversion(e.to_string()))?;
    Ok(to_css_url(&data_url))
}
