pub mod content;
pub mod data_url;
pub mod document;
pub mod interceptor;
pub mod realm;
pub mod registry;

pub use content::{ContentHooks, HOOKS_FRAMES_WEB_SCRIPT, ResourceResolver};
pub use document::{DocumentKind, PageDocument, PageScript, ScriptElement, ScriptLoader};
pub use interceptor::{FONT_FACE_HOOK_WARNING, FontFaceInterceptor, ObservingFontFace};
pub use realm::{
    FontFace, FontFaceConstructor, FontFaceLoadStatus, FontFaceSource, NATIVE_FONT_FACE_SOURCE,
    NativeFontFace, PageRealm,
};
pub use registry::{FontRegistry, RegistrySlot};

// Passthrough event names for the deferred image loader.
pub use singlefile_core::{IMAGE_LOADED_EVENT, LOAD_IMAGE_EVENT};
