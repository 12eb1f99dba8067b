/// Font registry and the per-document slot it lives in.
///
/// The registry is an insertion-ordered set of font observations keyed by
/// their serialized text. It is shared by handle: the content-side listener
/// appends through one clone while the capture pipeline reads through another,
/// so a handle returned earlier keeps seeing later observations.
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::{Serialize, Serializer};
use singlefile_core::FontObservation;
use tracing::debug;

struct RegistryEntry {
    fingerprint: String,
    observation: FontObservation,
}

#[derive(Default, Clone)]
pub struct FontRegistry {
    entries: Arc<RwLock<Vec<RegistryEntry>>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `observation` unless an identical one is already present.
    /// Returns whether it was appended.
    pub fn insert(&self, observation: FontObservation) -> bool {
        let fingerprint = observation.fingerprint();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|entry| entry.fingerprint == fingerprint) {
            debug!(family = observation.font_family(), "Duplicate font observation ignored");
            return false;
        }
        debug!(
            family = observation.font_family(),
            index = entries.len(),
            "Font observation recorded"
        );
        entries.push(RegistryEntry { fingerprint, observation });
        true
    }

    pub fn contains(&self, observation: &FontObservation) -> bool {
        let fingerprint = observation.fingerprint();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|entry| entry.fingerprint == fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned copy of the current contents, in insertion order.
    pub fn snapshot(&self) -> Vec<FontObservation> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| entry.observation.clone())
            .collect()
    }

    pub fn same_registry(&self, other: &FontRegistry) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl Serialize for FontRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.snapshot()).finish()
    }
}

/// Well-known slot on a document holding its font registry.
///
/// Absent until first requested, then reused for the rest of the document's
/// lifetime so repeated installs in the same page share one registry.
#[derive(Default)]
pub struct RegistrySlot {
    registry: OnceLock<FontRegistry>,
}

impl RegistrySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self) -> FontRegistry {
        let mut created = false;
        let registry = self.registry.get_or_init(|| {
            created = true;
            FontRegistry::new()
        });
        if created {
            debug!("Font registry created");
        } else {
            debug!(fonts = registry.len(), "Font registry reused");
        }
        registry.clone()
    }

    pub fn is_present(&self) -> bool {
        self.registry.get().is_some()
    }
}
