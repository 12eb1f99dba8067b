pub mod error;
pub mod event;
pub mod observation;
pub mod options;
pub mod target;

pub use error::HookError;
pub use event::{
    CustomEvent, HookEvent, LifecycleSignal, BLOCK_COOKIES_END_EVENT, BLOCK_COOKIES_START_EVENT,
    BLOCK_STORAGE_END_EVENT, BLOCK_STORAGE_START_EVENT, IMAGE_LOADED_EVENT,
    LOAD_DEFERRED_IMAGES_END_EVENT, LOAD_DEFERRED_IMAGES_KEEP_ZOOM_LEVEL_END_EVENT,
    LOAD_DEFERRED_IMAGES_KEEP_ZOOM_LEVEL_START_EVENT, LOAD_DEFERRED_IMAGES_RESET_EVENT,
    LOAD_DEFERRED_IMAGES_RESET_ZOOM_LEVEL_EVENT, LOAD_DEFERRED_IMAGES_START_EVENT,
    LOAD_IMAGE_EVENT, NEW_FONT_FACE_EVENT, PROTOCOL_VERSION,
};
pub use observation::{FontAttribute, FontFaceDescriptors, FontObservation};
pub use options::LoadDeferredImagesOptions;
pub use target::{EventTarget, Listener};
