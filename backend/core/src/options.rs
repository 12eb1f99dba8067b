//! Options accepted by the deferred-image signaling operations.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::event::LifecycleSignal;

/// Flags read by `load_deferred_images_*`. Absent flags are off; any other
/// value is tested for truthiness the way a page script would test it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadDeferredImagesOptions {
    #[serde(deserialize_with = "truthy")]
    pub load_deferred_images_block_cookies: bool,
    #[serde(deserialize_with = "truthy")]
    pub load_deferred_images_block_storage: bool,
    #[serde(deserialize_with = "truthy")]
    pub load_deferred_images_keep_zoom_level: bool,
}

impl LoadDeferredImagesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_cookies(mut self, value: bool) -> Self {
        self.load_deferred_images_block_cookies = value;
        self
    }

    pub fn block_storage(mut self, value: bool) -> Self {
        self.load_deferred_images_block_storage = value;
        self
    }

    pub fn keep_zoom_level(mut self, value: bool) -> Self {
        self.load_deferred_images_keep_zoom_level = value;
        self
    }

    /// Signals for the start of deferred-image loading, in emission order.
    pub fn start_signals(&self) -> Vec<LifecycleSignal> {
        self.bracket(
            LifecycleSignal::BlockCookiesStart,
            LifecycleSignal::BlockStorageStart,
            LifecycleSignal::LoadDeferredImagesKeepZoomLevelStart,
            LifecycleSignal::LoadDeferredImagesStart,
        )
    }

    /// Signals for the end of deferred-image loading, in emission order.
    pub fn end_signals(&self) -> Vec<LifecycleSignal> {
        self.bracket(
            LifecycleSignal::BlockCookiesEnd,
            LifecycleSignal::BlockStorageEnd,
            LifecycleSignal::LoadDeferredImagesKeepZoomLevelEnd,
            LifecycleSignal::LoadDeferredImagesEnd,
        )
    }

    pub fn reset_zoom_level_signal(&self) -> LifecycleSignal {
        if self.load_deferred_images_keep_zoom_level {
            LifecycleSignal::LoadDeferredImagesResetZoomLevel
        } else {
            LifecycleSignal::LoadDeferredImagesReset
        }
    }

    fn bracket(
        &self,
        cookies: LifecycleSignal,
        storage: LifecycleSignal,
        keep_zoom: LifecycleSignal,
        plain: LifecycleSignal,
    ) -> Vec<LifecycleSignal> {
        let mut signals = Vec::with_capacity(3);
        if self.load_deferred_images_block_cookies {
            signals.push(cookies);
        }
        if self.load_deferred_images_block_storage {
            signals.push(storage);
        }
        if self.load_deferred_images_keep_zoom_level {
            signals.push(keep_zoom);
        } else {
            signals.push(plain);
        }
        signals
    }
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}
