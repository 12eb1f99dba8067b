/// Content-side bridge controller.
///
/// Collects font observations reported by the page realm into the document's
/// font registry and broadcasts the deferred-image lifecycle signals.
///
/// Lifecycle:
/// 1. `ContentHooks::install(&document, resolver)` — listener, then inline
///    interceptor, then the external hooks script.
/// 2. Capture pipeline brackets deferred-image loading with
///    `load_deferred_images_start` / `load_deferred_images_end`.
/// 3. `get_fonts_data()` when serializing the page.
use singlefile_core::{
    CustomEvent, EventTarget, HookEvent, LifecycleSignal, LoadDeferredImagesOptions,
    NEW_FONT_FACE_EVENT,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::document::{PageDocument, ScriptElement};
use crate::interceptor::FontFaceInterceptor;
use crate::registry::FontRegistry;

/// Internal path of the script carrying the remaining page-realm hooks.
pub const HOOKS_FRAMES_WEB_SCRIPT: &str = "/dist/web/hooks/hooks-frames-web.js";

/// Host capability turning an internal resource path into an injectable URL.
pub trait ResourceResolver: Send + Sync {
    fn get_url(&self, path: &str) -> Option<String>;
}

impl<F> ResourceResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn get_url(&self, path: &str) -> Option<String> {
        self(path)
    }
}

pub struct ContentHooks {
    events: EventTarget,
    fonts: FontRegistry,
    active: bool,
}

impl ContentHooks {
    /// Attach to `document`.
    ///
    /// Interception is only set up in an HTML document and only when the host
    /// provides a resolver. Otherwise the returned controller is inert: its
    /// signals are still broadcast but the font registry stays empty.
    pub fn install(document: &PageDocument, resolver: Option<&dyn ResourceResolver>) -> Self {
        Self::install_with_script(document, resolver, HOOKS_FRAMES_WEB_SCRIPT)
    }

    /// Like [`install`](Self::install) with a different internal path for the
    /// external hooks script.
    pub fn install_with_script(
        document: &PageDocument,
        resolver: Option<&dyn ResourceResolver>,
        hooks_script_path: &str,
    ) -> Self {
        let events = document.events().clone();
        let fonts = document.font_registry();

        let resolver = match resolver {
            Some(resolver) if document.is_html_document() => resolver,
            Some(_) => {
                debug!(kind = ?document.kind(), "Not an HTML document; font hooks skipped");
                return Self { events, fonts, active: false };
            }
            None => {
                debug!("No resource resolver; font hooks skipped");
                return Self { events, fonts, active: false };
            }
        };

        let registry = fonts.clone();
        events.add_event_listener(NEW_FONT_FACE_EVENT, move |event| {
            record_font_face(&registry, event)
        });

        document.append_script(ScriptElement::Inline(Arc::new(FontFaceInterceptor)));
        match resolver.get_url(hooks_script_path) {
            Some(src) => document.append_script(ScriptElement::External { src, is_async: false }),
            None => warn!(path = hooks_script_path, "Hooks script URL could not be resolved"),
        }

        info!(realm = %document.realm().id(), "Content hooks installed");
        Self { events, fonts, active: true }
    }

    /// Whether font interception was set up.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The live font registry for this document.
    pub fn get_fonts_data(&self) -> FontRegistry {
        self.fonts.clone()
    }

    pub fn load_deferred_images_start(&self, options: &LoadDeferredImagesOptions) {
        self.broadcast(options.start_signals());
    }

    pub fn load_deferred_images_end(&self, options: &LoadDeferredImagesOptions) {
        self.broadcast(options.end_signals());
    }

    pub fn load_deferred_images_reset_zoom_level(&self, options: &LoadDeferredImagesOptions) {
        self.broadcast([options.reset_zoom_level_signal()]);
    }

    fn broadcast(&self, signals: impl IntoIterator<Item = LifecycleSignal>) {
        for signal in signals {
            debug!(signal = %signal, "Broadcasting lifecycle signal");
            self.events.dispatch(&HookEvent::Lifecycle(signal));
        }
    }
}

fn record_font_face(registry: &FontRegistry, event: &CustomEvent) {
    match HookEvent::from_custom_event(event) {
        Ok(HookEvent::NewFontFace(observation)) => {
            registry.insert(observation);
        }
        Ok(other) => debug!(event = other.event_name(), "Ignoring non font-face event"),
        Err(e) => warn!(error = %e, "Ignoring malformed font-face event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;
    use crate::realm::PageRealm;
    use singlefile_core::{FontFaceDescriptors, FontObservation};
    use std::sync::Mutex;
    use std::time::Duration;

    fn resolver(path: &str) -> Option<String> {
        Some(format!("moz-extension://capture{path}"))
    }

    fn html_document() -> PageDocument {
        PageDocument::html(PageRealm::new(EventTarget::new()))
    }

    fn record_all(target: &EventTarget) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for signal in LifecycleSignal::ALL {
            let sink = seen.clone();
            target.add_event_listener(signal.event_name(), move |event| {
                sink.lock().unwrap().push(event.event_type.clone());
            });
        }
        seen
    }

    #[test]
    fn install_hooks_realm_and_appends_hooks_script() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, Some(&resolver));
        assert!(hooks.is_active());
        assert!(document.realm().is_font_face_hooked());
        assert_eq!(
            document.external_scripts(),
            vec!["moz-extension://capture/dist/web/hooks/hooks-frames-web.js"]
        );
    }

    #[test]
    fn custom_hooks_script_path_is_resolved() {
        let document = html_document();
        ContentHooks::install_with_script(&document, Some(&resolver), "/hooks/extra.js");
        assert_eq!(
            document.external_scripts(),
            vec!["moz-extension://capture/hooks/extra.js"]
        );
    }

    #[test]
    fn distinct_fonts_are_collected_in_order_without_duplicates() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, Some(&resolver));
        let realm = document.realm();

        let bold = FontFaceDescriptors::new().with("weight", "700");
        realm.construct_font_face("A", "url(a.woff2)", None);
        realm.construct_font_face("B", "url(b.woff2)", Some(&bold));
        realm.construct_font_face("A", "url(a.woff2)", None);
        realm.construct_font_face("B", "url(b.woff2)", Some(&bold));
        realm.construct_font_face("C", "url(c.woff2)", None);

        let families: Vec<_> = hooks
            .get_fonts_data()
            .snapshot()
            .iter()
            .map(|o| o.font_family().to_string())
            .collect();
        assert_eq!(families, vec!["A", "B", "C"]);
    }

    #[test]
    fn fonts_data_is_live() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, Some(&resolver));
        let fonts = hooks.get_fonts_data();
        assert!(fonts.is_empty());
        document.realm().construct_font_face("A", "url(a)", None);
        assert_eq!(fonts.len(), 1);
    }

    #[test]
    fn repeated_install_shares_registry_and_does_not_double_report() {
        let document = html_document();
        let first = ContentHooks::install(&document, Some(&resolver));
        let second = ContentHooks::install(&document, Some(&resolver));

        let raw = Arc::new(Mutex::new(0usize));
        let counter = raw.clone();
        document.events().add_event_listener(NEW_FONT_FACE_EVENT, move |_| {
            *counter.lock().unwrap() += 1;
        });

        document.realm().construct_font_face("A", "url(a)", None);
        assert_eq!(*raw.lock().unwrap(), 1);
        assert!(first.get_fonts_data().same_registry(&second.get_fonts_data()));
        assert_eq!(second.get_fonts_data().len(), 1);
    }

    #[test]
    fn without_resolver_controller_is_inert() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, None);
        assert!(!hooks.is_active());
        assert!(!document.realm().is_font_face_hooked());
        assert!(document.external_scripts().is_empty());

        document.realm().construct_font_face("A", "url(a)", None);
        assert!(hooks.get_fonts_data().is_empty());

        let seen = record_all(document.events());
        hooks.load_deferred_images_start(&LoadDeferredImagesOptions::new());
        assert_eq!(*seen.lock().unwrap(), vec!["single-file-load-deferred-images-start"]);
    }

    #[test]
    fn non_html_document_is_not_hooked() {
        let document = PageDocument::new(DocumentKind::Svg, PageRealm::new(EventTarget::new()));
        let hooks = ContentHooks::install(&document, Some(&resolver));
        assert!(!hooks.is_active());
        assert!(!document.realm().is_font_face_hooked());
    }

    #[test]
    fn unresolvable_hooks_script_still_hooks_fonts() {
        let document = html_document();
        let unresolved = |_: &str| -> Option<String> { None };
        let hooks = ContentHooks::install(&document, Some(&unresolved));
        assert!(hooks.is_active());
        assert!(document.external_scripts().is_empty());
        document.realm().construct_font_face("A", "url(a)", None);
        assert_eq!(hooks.get_fonts_data().len(), 1);
    }

    #[test]
    fn malformed_font_event_is_ignored() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, Some(&resolver));
        document
            .events()
            .dispatch_event(CustomEvent::new(NEW_FONT_FACE_EVENT).with_detail(serde_json::json!(42)));
        document.events().dispatch_event(CustomEvent::new(NEW_FONT_FACE_EVENT));
        assert!(hooks.get_fonts_data().is_empty());
    }

    #[test]
    fn start_with_cookies_and_storage() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, Some(&resolver));
        let seen = record_all(document.events());

        hooks.load_deferred_images_start(
            &LoadDeferredImagesOptions::new()
                .block_cookies(true)
                .block_storage(true)
                .keep_zoom_level(false),
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "single-file-block-cookies-start",
                "single-file-block-storage-start",
                "single-file-load-deferred-images-start",
            ]
        );
    }

    #[test]
    fn start_keeping_zoom_level() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, Some(&resolver));
        let seen = record_all(document.events());

        hooks.load_deferred_images_start(&LoadDeferredImagesOptions::new().keep_zoom_level(true));
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["single-file-load-deferred-images-keep-zoom-level-start"]
        );
    }

    #[test]
    fn end_mirrors_start() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, Some(&resolver));
        let seen = record_all(document.events());

        hooks.load_deferred_images_end(
            &LoadDeferredImagesOptions::new()
                .block_cookies(true)
                .keep_zoom_level(true),
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "single-file-block-cookies-end",
                "single-file-load-deferred-images-keep-zoom-level-end",
            ]
        );
    }

    #[test]
    fn reset_without_zoom_emits_plain_reset() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, Some(&resolver));
        let seen = record_all(document.events());

        hooks.load_deferred_images_reset_zoom_level(
            &LoadDeferredImagesOptions::new().keep_zoom_level(false),
        );
        hooks.load_deferred_images_reset_zoom_level(
            &LoadDeferredImagesOptions::new().keep_zoom_level(true),
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "single-file-load-deferred-images-reset",
                "single-file-load-deferred-images-keep-zoom-level-reset",
            ]
        );
    }

    #[tokio::test]
    async fn binary_font_lands_in_registry_after_conversion() {
        let document = html_document();
        let hooks = ContentHooks::install(&document, Some(&resolver));
        let mut stream = document.events().subscribe();

        let font = document
            .realm()
            .construct_font_face("Bin", vec![0u8, 1, 0, 0], None)
            .unwrap();
        assert_eq!(font.family, "Bin");
        assert!(hooks.get_fonts_data().is_empty());

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = stream.recv().await.unwrap();
                if event.event_type == NEW_FONT_FACE_EVENT {
                    break;
                }
            }
        })
        .await
        .expect("conversion did not complete");

        let fonts = hooks.get_fonts_data().snapshot();
        assert_eq!(fonts.len(), 1);
        assert_eq!(
            fonts[0],
            FontObservation::new("Bin", "url(data:application/octet-stream;base64,AAEAAA==)")
        );
    }
}
