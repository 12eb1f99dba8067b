//! Simulated page for driving the bridge from the command line.
//!
//! One HTML document with a fresh realm, the content hooks installed through
//! an extension-style resolver.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use clap::ValueEnum;
use serde::Deserialize;
use singlefile_core::{
    EventTarget, FontFaceDescriptors, LoadDeferredImagesOptions, NEW_FONT_FACE_EVENT,
};
use singlefile_hooks::{
    ContentHooks, FontFaceSource, FontRegistry, PageDocument, PageRealm, ResourceResolver,
    ScriptLoader,
};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{info, warn};

/// Large enough that replaying a fonts file never lags the stream.
const STREAM_CAPACITY: usize = 4096;

/// Resolves internal paths against an extension base URL.
pub struct ExtensionHost {
    base_url: String,
}

impl ExtensionHost {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

impl ResourceResolver for ExtensionHost {
    fn get_url(&self, path: &str) -> Option<String> {
        Some(format!("{}{}", self.base_url.trim_end_matches('/'), path))
    }
}

/// The external hooks script belongs to the host; here it is only logged.
pub struct LoggingScriptLoader;

#[async_trait]
impl ScriptLoader for LoggingScriptLoader {
    async fn load(&self, src: &str) -> Result<()> {
        info!(src, "External hooks script requested");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    Start,
    End,
    Reset,
}

/// One `new FontFace(...)` call in a fonts file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontRegistration {
    pub family: String,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub src_base64: Option<String>,
    #[serde(default)]
    pub descriptors: Option<FontFaceDescriptors>,
}

impl FontRegistration {
    fn source(&self) -> Result<FontFaceSource> {
        match (&self.src, &self.src_base64) {
            (Some(src), None) => Ok(FontFaceSource::Url(src.clone())),
            (None, Some(encoded)) => {
                let payload = STANDARD
                    .decode(encoded)
                    .with_context(|| format!("Font {}: srcBase64 is not valid base64", self.family))?;
                Ok(FontFaceSource::from(payload))
            }
            _ => bail!("Font {}: exactly one of src or srcBase64 is required", self.family),
        }
    }
}

pub struct SimulatedPage {
    document: PageDocument,
    hooks: ContentHooks,
}

impl SimulatedPage {
    pub fn new(host: &ExtensionHost, hooks_script_path: &str) -> Self {
        let events = EventTarget::with_stream_capacity(STREAM_CAPACITY);
        let document = PageDocument::html(PageRealm::new(events))
            .with_script_loader(std::sync::Arc::new(LoggingScriptLoader));
        let hooks = ContentHooks::install_with_script(&document, Some(host), hooks_script_path);
        Self { document, hooks }
    }

    pub fn events(&self) -> &EventTarget {
        self.document.events()
    }

    /// Run one deferred-image operation and return the event names it broadcast.
    pub fn signals(&self, phase: Phase, options: &LoadDeferredImagesOptions) -> Vec<String> {
        let mut stream = self.events().subscribe();
        match phase {
            Phase::Start => self.hooks.load_deferred_images_start(options),
            Phase::End => self.hooks.load_deferred_images_end(options),
            Phase::Reset => self.hooks.load_deferred_images_reset_zoom_level(options),
        }
        let mut names = Vec::new();
        loop {
            match stream.try_recv() {
                Ok(event) => names.push(event.event_type),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        names
    }

    /// Construct every registered font in the page, wait up to `wait` for
    /// binary sources to be reported, and return the collected fonts.
    pub async fn replay_fonts(
        &self,
        registrations: &[FontRegistration],
        wait: Duration,
    ) -> Result<FontRegistry> {
        let sources = registrations
            .iter()
            .map(FontRegistration::source)
            .collect::<Result<Vec<_>>>()?;

        let mut stream = self.events().subscribe();
        let realm = self.document.realm();
        for (registration, source) in registrations.iter().zip(sources) {
            realm.construct_font_face(&registration.family, source, registration.descriptors.as_ref());
        }

        // Each construction reports exactly once; binary ones later.
        let expected = registrations.len();
        let waited = tokio::time::timeout(wait, async {
            let mut seen = 0;
            while seen < expected {
                match stream.recv().await {
                    Ok(event) if event.event_type == NEW_FONT_FACE_EVENT => seen += 1,
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Event stream lagged; font count may be incomplete");
                        break;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
        .await;
        if waited.is_err() {
            warn!(timeout_secs = wait.as_secs(), "Some binary font sources were not converted in time");
        }

        Ok(self.hooks.get_fonts_data())
    }
}
