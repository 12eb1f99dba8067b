//! The page realm: where page script runs and where fonts get constructed.
//!
//! A realm exposes a font-face constructor binding. The binding starts as the
//! realm's native constructor (if it has one) and can be replaced exactly
//! once, when the realm is hooked; later attempts leave the first choice
//! in place.
use std::fmt;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use singlefile_core::{EventTarget, FontFaceDescriptors};
use tracing::debug;
use uuid::Uuid;

/// How the native constructor renders when stringified.
pub const NATIVE_FONT_FACE_SOURCE: &str = "function FontFace() { [native code] }";

/// Second argument to the font-face constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontFaceSource {
    /// A CSS source descriptor or URL, passed through as text.
    Url(String),
    /// Raw font file bytes.
    Binary(Bytes),
}

impl From<&str> for FontFaceSource {
    fn from(src: &str) -> Self {
        Self::Url(src.to_string())
    }
}

impl From<String> for FontFaceSource {
    fn from(src: String) -> Self {
        Self::Url(src)
    }
}

impl From<Vec<u8>> for FontFaceSource {
    fn from(payload: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(payload))
    }
}

impl From<Bytes> for FontFaceSource {
    fn from(payload: Bytes) -> Self {
        Self::Binary(payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFaceLoadStatus {
    Unloaded,
    Loading,
    Loaded,
    Error,
}

/// The font object page code gets back from construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    pub source: FontFaceSource,
    pub descriptors: FontFaceDescriptors,
    pub status: FontFaceLoadStatus,
}

/// A font-face constructor as page code sees it.
///
/// `Display` is what page code gets when it stringifies the constructor.
pub trait FontFaceConstructor: fmt::Display + Send + Sync {
    fn construct(
        &self,
        family: &str,
        source: FontFaceSource,
        descriptors: Option<&FontFaceDescriptors>,
    ) -> FontFace;
}

/// The realm's built-in constructor.
#[derive(Debug, Default)]
pub struct NativeFontFace;

impl FontFaceConstructor for NativeFontFace {
    fn construct(
        &self,
        family: &str,
        source: FontFaceSource,
        descriptors: Option<&FontFaceDescriptors>,
    ) -> FontFace {
        FontFace {
            family: family.to_string(),
            source,
            descriptors: descriptors.cloned().unwrap_or_default(),
            status: FontFaceLoadStatus::Unloaded,
        }
    }
}

impl fmt::Display for NativeFontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(NATIVE_FONT_FACE_SOURCE)
    }
}

pub struct PageRealm {
    id: Uuid,
    events: EventTarget,
    native_font_face: Option<Arc<dyn FontFaceConstructor>>,
    font_face: OnceLock<Arc<dyn FontFaceConstructor>>,
}

impl PageRealm {
    /// A realm with the built-in font-face constructor.
    pub fn new(events: EventTarget) -> Self {
        Self::with_native_font_face(events, Some(Arc::new(NativeFontFace)))
    }

    /// A realm with no font-face constructor at all.
    pub fn without_font_face(events: EventTarget) -> Self {
        Self::with_native_font_face(events, None)
    }

    pub fn with_native_font_face(
        events: EventTarget,
        native_font_face: Option<Arc<dyn FontFaceConstructor>>,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(realm = %id, font_face = native_font_face.is_some(), "Page realm created");
        Self {
            id,
            events,
            native_font_face,
            font_face: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn events(&self) -> &EventTarget {
        &self.events
    }

    pub fn native_font_face(&self) -> Option<&Arc<dyn FontFaceConstructor>> {
        self.native_font_face.as_ref()
    }

    /// The constructor page code currently reaches: the selected replacement
    /// if the realm was hooked, otherwise the native one.
    pub fn font_face(&self) -> Option<Arc<dyn FontFaceConstructor>> {
        self.font_face
            .get()
            .or(self.native_font_face.as_ref())
            .cloned()
    }

    pub fn is_font_face_hooked(&self) -> bool {
        self.font_face.get().is_some()
    }

    /// Select the realm's font-face binding. Only the first call wins.
    pub(crate) fn select_font_face(&self, constructor: Arc<dyn FontFaceConstructor>) -> bool {
        self.font_face.set(constructor).is_ok()
    }

    /// Page code calling `new FontFace(family, source, descriptors)`.
    /// Returns `None` when the realm has no constructor.
    pub fn construct_font_face(
        &self,
        family: &str,
        source: impl Into<FontFaceSource>,
        descriptors: Option<&FontFaceDescriptors>,
    ) -> Option<FontFace> {
        let constructor = self.font_face()?;
        Some(constructor.construct(family, source.into(), descriptors))
    }
}

impl fmt::Debug for PageRealm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRealm")
            .field("id", &self.id)
            .field("native_font_face", &self.native_font_face.is_some())
            .field("hooked", &self.is_font_face_hooked())
            .finish()
    }
}
