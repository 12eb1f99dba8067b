//! Realm-crossing event protocol.
//!
//! The content context and the page realm share nothing but the document's
//! event target. Everything they say to each other is one of the named events
//! below, carried as a [`CustomEvent`] whose optional `detail` is plain JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::HookError;
use crate::observation::FontObservation;

pub const LOAD_DEFERRED_IMAGES_START_EVENT: &str = "single-file-load-deferred-images-start";
pub const LOAD_DEFERRED_IMAGES_END_EVENT: &str = "single-file-load-deferred-images-end";
pub const LOAD_DEFERRED_IMAGES_KEEP_ZOOM_LEVEL_START_EVENT: &str =
    "single-file-load-deferred-images-keep-zoom-level-start";
pub const LOAD_DEFERRED_IMAGES_KEEP_ZOOM_LEVEL_END_EVENT: &str =
    "single-file-load-deferred-images-keep-zoom-level-end";
pub const LOAD_DEFERRED_IMAGES_RESET_ZOOM_LEVEL_EVENT: &str =
    "single-file-load-deferred-images-keep-zoom-level-reset";
pub const LOAD_DEFERRED_IMAGES_RESET_EVENT: &str = "single-file-load-deferred-images-reset";
pub const BLOCK_COOKIES_START_EVENT: &str = "single-file-block-cookies-start";
pub const BLOCK_COOKIES_END_EVENT: &str = "single-file-block-cookies-end";
pub const BLOCK_STORAGE_START_EVENT: &str = "single-file-block-storage-start";
pub const BLOCK_STORAGE_END_EVENT: &str = "single-file-block-storage-end";
pub const LOAD_IMAGE_EVENT: &str = "single-file-load-image";
pub const IMAGE_LOADED_EVENT: &str = "single-file-image-loaded";
pub const NEW_FONT_FACE_EVENT: &str = "single-file-new-font-face";

/// Version stamped on every [`CustomEvent`] this crate produces.
pub const PROTOCOL_VERSION: u32 = 1;

/// Payload-free signals the content context broadcasts to page-side
/// collaborators (deferred image loader, cookie and storage blockers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleSignal {
    #[serde(rename = "single-file-load-deferred-images-start")]
    LoadDeferredImagesStart,
    #[serde(rename = "single-file-load-deferred-images-end")]
    LoadDeferredImagesEnd,
    #[serde(rename = "single-file-load-deferred-images-keep-zoom-level-start")]
    LoadDeferredImagesKeepZoomLevelStart,
    #[serde(rename = "single-file-load-deferred-images-keep-zoom-level-end")]
    LoadDeferredImagesKeepZoomLevelEnd,
    #[serde(rename = "single-file-load-deferred-images-keep-zoom-level-reset")]
    LoadDeferredImagesResetZoomLevel,
    #[serde(rename = "single-file-load-deferred-images-reset")]
    LoadDeferredImagesReset,
    #[serde(rename = "single-file-block-cookies-start")]
    BlockCookiesStart,
    #[serde(rename = "single-file-block-cookies-end")]
    BlockCookiesEnd,
    #[serde(rename = "single-file-block-storage-start")]
    BlockStorageStart,
    #[serde(rename = "single-file-block-storage-end")]
    BlockStorageEnd,
}

impl LifecycleSignal {
    pub const ALL: [LifecycleSignal; 10] = [
        Self::LoadDeferredImagesStart,
        Self::LoadDeferredImagesEnd,
        Self::LoadDeferredImagesKeepZoomLevelStart,
        Self::LoadDeferredImagesKeepZoomLevelEnd,
        Self::LoadDeferredImagesResetZoomLevel,
        Self::LoadDeferredImagesReset,
        Self::BlockCookiesStart,
        Self::BlockCookiesEnd,
        Self::BlockStorageStart,
        Self::BlockStorageEnd,
    ];

    pub fn event_name(self) -> &'static str {
        match self {
            Self::LoadDeferredImagesStart => LOAD_DEFERRED_IMAGES_START_EVENT,
            Self::LoadDeferredImagesEnd => LOAD_DEFERRED_IMAGES_END_EVENT,
            Self::LoadDeferredImagesKeepZoomLevelStart => {
                LOAD_DEFERRED_IMAGES_KEEP_ZOOM_LEVEL_START_EVENT
            }
            Self::LoadDeferredImagesKeepZoomLevelEnd => LOAD_DEFERRED_IMAGES_KEEP_ZOOM_LEVEL_END_EVENT,
            Self::LoadDeferredImagesResetZoomLevel => LOAD_DEFERRED_IMAGES_RESET_ZOOM_LEVEL_EVENT,
            Self::LoadDeferredImagesReset => LOAD_DEFERRED_IMAGES_RESET_EVENT,
            Self::BlockCookiesStart => BLOCK_COOKIES_START_EVENT,
            Self::BlockCookiesEnd => BLOCK_COOKIES_END_EVENT,
            Self::BlockStorageStart => BLOCK_STORAGE_START_EVENT,
            Self::BlockStorageEnd => BLOCK_STORAGE_END_EVENT,
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|signal| signal.event_name() == name)
    }
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Every message kind the bridge understands.
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    Lifecycle(LifecycleSignal),
    /// Passthrough for the deferred image loader; detail is opaque here.
    LoadImage(Option<Value>),
    /// Passthrough for the deferred image loader; detail is opaque here.
    ImageLoaded(Option<Value>),
    NewFontFace(FontObservation),
}

impl HookEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Lifecycle(signal) => signal.event_name(),
            Self::LoadImage(_) => LOAD_IMAGE_EVENT,
            Self::ImageLoaded(_) => IMAGE_LOADED_EVENT,
            Self::NewFontFace(_) => NEW_FONT_FACE_EVENT,
        }
    }

    /// Encode into the wire form dispatched on the document event target.
    pub fn to_custom_event(&self) -> CustomEvent {
        let detail = match self {
            Self::Lifecycle(_) => None,
            Self::LoadImage(detail) | Self::ImageLoaded(detail) => detail.clone(),
            Self::NewFontFace(observation) => serde_json::to_value(observation).ok(),
        };
        CustomEvent {
            event_type: self.event_name().to_string(),
            detail,
            version: PROTOCOL_VERSION,
        }
    }

    /// Decode a wire event. Unknown names and malformed details are errors.
    pub fn from_custom_event(event: &CustomEvent) -> Result<Self, HookError> {
        if event.version != PROTOCOL_VERSION {
            return Err(HookError::UnsupportedVersion {
                found: event.version,
                expected: PROTOCOL_VERSION,
            });
        }
        if let Some(signal) = LifecycleSignal::from_event_name(&event.event_type) {
            return Ok(Self::Lifecycle(signal));
        }
        match event.event_type.as_str() {
            LOAD_IMAGE_EVENT => Ok(Self::LoadImage(event.detail.clone())),
            IMAGE_LOADED_EVENT => Ok(Self::ImageLoaded(event.detail.clone())),
            NEW_FONT_FACE_EVENT => {
                let detail = event.detail.clone().ok_or_else(|| HookError::MissingDetail {
                    event: NEW_FONT_FACE_EVENT.to_string(),
                })?;
                let observation = serde_json::from_value(detail)
                    .map_err(|e| HookError::malformed(NEW_FONT_FACE_EVENT, e.to_string()))?;
                Ok(Self::NewFontFace(observation))
            }
            other => Err(HookError::UnknownEvent(other.to_string())),
        }
    }
}

impl From<LifecycleSignal> for HookEvent {
    fn from(signal: LifecycleSignal) -> Self {
        Self::Lifecycle(signal)
    }
}

/// A DOM-style custom event as it crosses between realms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    PROTOCOL_VERSION
}

impl CustomEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: None,
            version: PROTOCOL_VERSION,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}
