use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::event::{CustomEvent, HookEvent};

/// Buffer size of the broadcast stream handed out by [`EventTarget::subscribe`].
const DEFAULT_STREAM_CAPACITY: usize = 256;

pub type Listener = Arc<dyn Fn(&CustomEvent) + Send + Sync>;

/// The document's event target: the only thing both realms can reach.
///
/// Listeners are called synchronously, in registration order, during
/// [`dispatch_event`](Self::dispatch_event). A listener added after an event
/// was dispatched never sees that event. There is no acknowledgment.
#[derive(Clone)]
pub struct EventTarget {
    inner: Arc<TargetInner>,
}

struct TargetInner {
    listeners: RwLock<Vec<(String, Listener)>>,
    stream: broadcast::Sender<CustomEvent>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::with_stream_capacity(DEFAULT_STREAM_CAPACITY)
    }

    pub fn with_stream_capacity(capacity: usize) -> Self {
        let (stream, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(TargetInner {
                listeners: RwLock::new(Vec::new()),
                stream,
            }),
        }
    }

    pub fn add_event_listener<F>(&self, event_type: &str, listener: F)
    where
        F: Fn(&CustomEvent) + Send + Sync + 'static,
    {
        let mut listeners = self
            .inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        listeners.push((event_type.to_string(), Arc::new(listener)));
        debug!(event = event_type, total = listeners.len(), "Listener added");
    }

    /// Deliver `event` to every listener registered for its type, then to
    /// stream subscribers.
    pub fn dispatch_event(&self, event: CustomEvent) {
        // Snapshot so listeners may add listeners or dispatch re-entrantly.
        let matching: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(event_type, _)| *event_type == event.event_type)
            .map(|(_, listener)| listener.clone())
            .collect();

        trace!(event = %event.event_type, listeners = matching.len(), "Dispatching event");
        for listener in matching {
            listener(&event);
        }
        // No subscribers is not an error.
        let _ = self.inner.stream.send(event);
    }

    pub fn dispatch(&self, event: &HookEvent) {
        self.dispatch_event(event.to_custom_event());
    }

    /// Async view of every event dispatched from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CustomEvent> {
        self.inner.stream.subscribe()
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(t, _)| t == event_type)
            .count()
    }

    /// Whether both handles point at the same target.
    pub fn same_target(&self, other: &EventTarget) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for EventTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("subscribers", &self.inner.stream.receiver_count())
            .finish_non_exhaustive()
    }
}
