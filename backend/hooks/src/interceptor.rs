//! Page-realm font-face interception.
//!
//! [`FontFaceInterceptor`] is the script the content side injects into the
//! page. Running it selects an [`ObservingFontFace`] as the realm's font-face
//! binding. The observing constructor reports every construction on the
//! document event target as `single-file-new-font-face` and then builds the
//! font with the native constructor, unchanged.
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use singlefile_core::{EventTarget, FontFaceDescriptors, FontObservation, HookEvent};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::data_url::read_as_css_url;
use crate::document::PageScript;
use crate::realm::{FontFace, FontFaceConstructor, FontFaceSource, PageRealm};

pub const FONT_FACE_HOOK_WARNING: &str =
    "SingleFile is hooking the FontFace constructor to get font URLs.";

pub struct ObservingFontFace {
    native: Arc<dyn FontFaceConstructor>,
    events: EventTarget,
    warning_displayed: AtomicBool,
}

impl ObservingFontFace {
    pub fn new(native: Arc<dyn FontFaceConstructor>, events: EventTarget) -> Self {
        Self {
            native,
            events,
            warning_displayed: AtomicBool::new(false),
        }
    }

    pub fn warning_displayed(&self) -> bool {
        self.warning_displayed.load(Ordering::Relaxed)
    }

    fn report(&self, observation: FontObservation, source: &FontFaceSource) {
        match source {
            FontFaceSource::Url(_) => self.events.dispatch(&HookEvent::NewFontFace(observation)),
            FontFaceSource::Binary(payload) => {
                spawn_conversion(self.events.clone(), observation, payload.clone())
            }
        }
    }
}

impl FontFaceConstructor for ObservingFontFace {
    fn construct(
        &self,
        family: &str,
        source: FontFaceSource,
        descriptors: Option<&FontFaceDescriptors>,
    ) -> FontFace {
        if !self.warning_displayed.swap(true, Ordering::Relaxed) {
            warn!("{}", FONT_FACE_HOOK_WARNING);
        }
        let src = match &source {
            FontFaceSource::Url(src) => src.as_str(),
            FontFaceSource::Binary(_) => "",
        };
        let observation = FontObservation::from_arguments(family, src, descriptors);
        self.report(observation, &source);
        self.native.construct(family, source, descriptors)
    }
}

impl fmt::Display for ObservingFontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.native, f)
    }
}

/// Convert `payload` in the background and report the font once it is text.
/// Without a runtime the conversion never runs and the font goes unreported.
fn spawn_conversion(events: EventTarget, observation: FontObservation, payload: Bytes) {
    let Ok(runtime) = Handle::try_current() else {
        warn!(
            family = observation.font_family(),
            "No async runtime; binary font source will not be reported"
        );
        return;
    };
    let size = payload.len();
    runtime.spawn(async move {
        match read_as_css_url(payload).await {
            Ok(src) => {
                debug!(family = observation.font_family(), bytes = size, "Binary font source converted");
                events.dispatch(&HookEvent::NewFontFace(observation.with_src(src)));
            }
            Err(e) => {
                warn!(family = observation.font_family(), error = %e, "Binary font source conversion failed");
            }
        }
    });
}

/// Hooks a realm's font-face constructor. Idempotent per realm.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontFaceInterceptor;

impl FontFaceInterceptor {
    /// Returns whether this call hooked the realm.
    pub fn install(realm: &PageRealm) -> bool {
        let Some(native) = realm.native_font_face() else {
            debug!(realm = %realm.id(), "No native font-face constructor; nothing to hook");
            return false;
        };
        let observing = ObservingFontFace::new(native.clone(), realm.events().clone());
        if realm.select_font_face(Arc::new(observing)) {
            info!(realm = %realm.id(), "Font-face constructor hooked");
            true
        } else {
            debug!(realm = %realm.id(), "Font-face constructor already hooked");
            false
        }
    }
}

impl PageScript for FontFaceInterceptor {
    fn name(&self) -> &str {
        "font-face-interceptor"
    }

    fn run(&self, realm: &PageRealm) {
        Self::install(realm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::{NATIVE_FONT_FACE_SOURCE, NativeFontFace};
    use singlefile_core::{CustomEvent, NEW_FONT_FACE_EVENT};
    use std::sync::Mutex;
    use std::time::Duration;

    fn font_events(target: &EventTarget) -> Arc<Mutex<Vec<CustomEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        target.add_event_listener(NEW_FONT_FACE_EVENT, move |event| {
            sink.lock().unwrap().push(event.clone());
        });
        seen
    }

    fn observation_of(event: &CustomEvent) -> FontObservation {
        match HookEvent::from_custom_event(event).unwrap() {
            HookEvent::NewFontFace(observation) => observation,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn url_source_is_reported_synchronously() {
        let realm = PageRealm::new(EventTarget::new());
        let seen = font_events(realm.events());
        assert!(FontFaceInterceptor::install(&realm));

        let descriptors = FontFaceDescriptors::new()
            .with("style", "italic")
            .with("display", "swap");
        let font = realm
            .construct_font_face("Inter", "url(inter.woff2)", Some(&descriptors))
            .unwrap();

        assert_eq!(font.family, "Inter");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].detail,
            Some(serde_json::json!({
                "font-family": "Inter",
                "src": "url(inter.woff2)",
                "font-style": "italic"
            }))
        );
    }

    #[test]
    fn installing_twice_reports_once_per_construction() {
        let realm = PageRealm::new(EventTarget::new());
        let seen = font_events(realm.events());
        assert!(FontFaceInterceptor::install(&realm));
        assert!(!FontFaceInterceptor::install(&realm));

        realm.construct_font_face("A", "url(a)", None);
        realm.construct_font_face("B", "url(b)", None);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn hooked_constructor_stringifies_like_native() {
        let realm = PageRealm::new(EventTarget::new());
        let before = realm.font_face().unwrap().to_string();
        FontFaceInterceptor::install(&realm);
        let after = realm.font_face().unwrap().to_string();
        assert_eq!(before, after);
        assert_eq!(after, NATIVE_FONT_FACE_SOURCE);
    }

    #[test]
    fn realm_without_constructor_is_left_alone() {
        let realm = PageRealm::without_font_face(EventTarget::new());
        assert!(!FontFaceInterceptor::install(&realm));
        assert!(realm.font_face().is_none());
    }

    #[test]
    fn warning_is_shown_once() {
        let observing = ObservingFontFace::new(Arc::new(NativeFontFace), EventTarget::new());
        assert!(!observing.warning_displayed());
        observing.construct("A", "url(a)".into(), None);
        observing.construct("B", "url(b)".into(), None);
        assert!(observing.warning_displayed());
    }

    #[test]
    fn binary_source_without_runtime_is_dropped() {
        let realm = PageRealm::new(EventTarget::new());
        let seen = font_events(realm.events());
        FontFaceInterceptor::install(&realm);

        let font = realm.construct_font_face("Bin", vec![1u8, 2, 3], None).unwrap();
        assert_eq!(font.source, FontFaceSource::Binary(Bytes::from_static(&[1, 2, 3])));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn binary_source_is_reported_after_conversion() {
        let realm = PageRealm::new(EventTarget::new());
        let seen = font_events(realm.events());
        let mut stream = realm.events().subscribe();
        FontFaceInterceptor::install(&realm);

        let descriptors = FontFaceDescriptors::new().with("weight", "700");
        let font = realm
            .construct_font_face("Bin", Bytes::from_static(b"wOF2"), Some(&descriptors))
            .unwrap();

        // Construction returned before the conversion task had a chance to run.
        assert_eq!(font.status, crate::realm::FontFaceLoadStatus::Unloaded);
        assert!(seen.lock().unwrap().is_empty());

        let event = tokio::time::timeout(Duration::from_secs(5), stream.recv())
            .await
            .expect("conversion did not complete")
            .unwrap();
        let observation = observation_of(&event);
        assert!(observation.src().starts_with("url("));
        assert!(observation.src().contains("data:application/octet-stream;base64,d09GMg=="));
        assert_eq!(
            observation.fingerprint(),
            r#"{"font-family":"Bin","src":"url(data:application/octet-stream;base64,d09GMg==)","font-weight":"700"}"#
        );
    }
}
