//! Page document: the frame the content side is attached to.
//!
//! Owns the page realm, the well-known font registry slot and the script
//! insertion point used to reach into the realm.
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use singlefile_core::EventTarget;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::realm::PageRealm;
use crate::registry::{FontRegistry, RegistrySlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Xml,
    Svg,
}

/// Code that runs inside the page realm when inlined into the document.
pub trait PageScript: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, realm: &PageRealm);
}

/// Fetches and evaluates external scripts appended to the document.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    async fn load(&self, src: &str) -> Result<()>;
}

pub enum ScriptElement {
    Inline(Arc<dyn PageScript>),
    External { src: String, is_async: bool },
}

pub struct PageDocument {
    kind: DocumentKind,
    realm: PageRealm,
    font_registry: RegistrySlot,
    script_loader: Option<Arc<dyn ScriptLoader>>,
    external_scripts: Mutex<Vec<String>>,
}

impl PageDocument {
    pub fn new(kind: DocumentKind, realm: PageRealm) -> Self {
        Self {
            kind,
            realm,
            font_registry: RegistrySlot::new(),
            script_loader: None,
            external_scripts: Mutex::new(Vec::new()),
        }
    }

    pub fn html(realm: PageRealm) -> Self {
        Self::new(DocumentKind::Html, realm)
    }

    pub fn with_script_loader(mut self, loader: Arc<dyn ScriptLoader>) -> Self {
        self.script_loader = Some(loader);
        self
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn is_html_document(&self) -> bool {
        self.kind == DocumentKind::Html
    }

    pub fn realm(&self) -> &PageRealm {
        &self.realm
    }

    pub fn events(&self) -> &EventTarget {
        self.realm.events()
    }

    pub fn font_registry(&self) -> FontRegistry {
        self.font_registry.get_or_create()
    }

    /// Insert a script element and remove it again.
    ///
    /// Inline scripts run synchronously in the page realm. External scripts
    /// are recorded and handed to the script loader, if any, on the current
    /// runtime.
    pub fn append_script(&self, element: ScriptElement) {
        match element {
            ScriptElement::Inline(script) => {
                debug!(script = script.name(), realm = %self.realm.id(), "Running inline script");
                script.run(&self.realm);
            }
            ScriptElement::External { src, is_async } => {
                info!(src = %src, is_async, "Appending external script");
                self.external_scripts
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(src.clone());
                self.load_external(src);
            }
        }
    }

    /// Sources of every external script appended so far.
    pub fn external_scripts(&self) -> Vec<String> {
        self.external_scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn load_external(&self, src: String) {
        let Some(loader) = self.script_loader.clone() else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!(src = %src, "No async runtime; external script not loaded");
            return;
        };
        runtime.spawn(async move {
            if let Err(e) = loader.load(&src).await {
                warn!(src = %src, error = %e, "External script failed to load");
            }
        });
    }
}

impl std::fmt::Debug for PageDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageDocument")
            .field("kind", &self.kind)
            .field("realm", &self.realm)
            .field("external_scripts", &self.external_scripts())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct CountingScript(AtomicUsize);

    impl PageScript for CountingScript {
        fn name(&self) -> &str {
            "counting"
        }

        fn run(&self, _realm: &PageRealm) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct ChannelLoader(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl ScriptLoader for ChannelLoader {
        async fn load(&self, src: &str) -> Result<()> {
            self.0.send(src.to_string())?;
            Ok(())
        }
    }

    #[test]
    fn inline_scripts_run_immediately() {
        let document = PageDocument::html(PageRealm::new(EventTarget::new()));
        let script = Arc::new(CountingScript(AtomicUsize::new(0)));
        document.append_script(ScriptElement::Inline(script.clone()));
        assert_eq!(script.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registry_slot_is_reused() {
        let document = PageDocument::html(PageRealm::new(EventTarget::new()));
        assert!(document.font_registry().same_registry(&document.font_registry()));
    }

    #[tokio::test]
    async fn external_scripts_go_to_loader() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let document = PageDocument::html(PageRealm::new(EventTarget::new()))
            .with_script_loader(Arc::new(ChannelLoader(tx)));

        document.append_script(ScriptElement::External {
            src: "chrome-extension://id/hooks.js".into(),
            is_async: false,
        });

        assert_eq!(document.external_scripts(), vec!["chrome-extension://id/hooks.js"]);
        let loaded = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, "chrome-extension://id/hooks.js");
    }
}
