//! Bridge Event Logger
//!
//! Journals every bridge event dispatched on a document event target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use singlefile_core::{
    CustomEvent, EventTarget, IMAGE_LOADED_EVENT, LOAD_IMAGE_EVENT, LifecycleSignal,
    NEW_FONT_FACE_EVENT,
};
use tracing::info;

use crate::redact::redact_data_urls;

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl EventLogEntry {
    pub fn from_event(event: &CustomEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.event_type.clone(),
            detail: event
                .detail
                .as_ref()
                .map(|detail| redact_data_urls(&detail.to_string())),
        }
    }
}

pub struct BridgeEventLogger;

impl BridgeEventLogger {
    /// Event names journaled by [`attach`](Self::attach).
    pub fn event_names() -> Vec<&'static str> {
        LifecycleSignal::ALL
            .iter()
            .map(|signal| signal.event_name())
            .chain([LOAD_IMAGE_EVENT, IMAGE_LOADED_EVENT, NEW_FONT_FACE_EVENT])
            .collect()
    }

    /// Log every known bridge event dispatched on `target` from now on.
    pub fn attach(target: &EventTarget) {
        for name in Self::event_names() {
            target.add_event_listener(name, Self::log_event);
        }
    }

    pub fn log_event(event: &CustomEvent) {
        let entry = EventLogEntry::from_event(event);
        info!(target: "bridge_events", event = %entry.event, detail = ?entry.detail, "Bridge event");
    }
}
