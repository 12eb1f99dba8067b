//! Font observations: what the page interceptor learns about each font the
//! page registers, in the exact attribute order it will be compared by.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::HookError;
use crate::event::NEW_FONT_FACE_EVENT;

pub const FONT_FAMILY_KEY: &str = "font-family";
pub const SRC_KEY: &str = "src";

/// A CSS `@font-face` attribute that can be reported for an observed font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontAttribute {
    Family,
    Style,
    Weight,
    Stretch,
    UnicodeRange,
    Variant,
    FeatureSettings,
}

/// Page API descriptor key → reported attribute.
const DESCRIPTOR_TABLE: [(&str, FontAttribute); 7] = [
    ("family", FontAttribute::Family),
    ("style", FontAttribute::Style),
    ("weight", FontAttribute::Weight),
    ("stretch", FontAttribute::Stretch),
    ("unicodeRange", FontAttribute::UnicodeRange),
    ("variant", FontAttribute::Variant),
    ("featureSettings", FontAttribute::FeatureSettings),
];

impl FontAttribute {
    /// Map a descriptor key as passed to the font-face constructor.
    pub fn from_descriptor(key: &str) -> Option<Self> {
        DESCRIPTOR_TABLE
            .iter()
            .find(|(descriptor, _)| *descriptor == key)
            .map(|(_, attribute)| *attribute)
    }

    pub fn from_attribute_name(name: &str) -> Option<Self> {
        DESCRIPTOR_TABLE
            .iter()
            .map(|(_, attribute)| *attribute)
            .find(|attribute| attribute.attribute_name() == name)
    }

    pub fn descriptor_name(self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Style => "style",
            Self::Weight => "weight",
            Self::Stretch => "stretch",
            Self::UnicodeRange => "unicodeRange",
            Self::Variant => "variant",
            Self::FeatureSettings => "featureSettings",
        }
    }

    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::Family => FONT_FAMILY_KEY,
            Self::Style => "font-style",
            Self::Weight => "font-weight",
            Self::Stretch => "font-stretch",
            Self::UnicodeRange => "unicode-range",
            Self::Variant => "font-variant",
            Self::FeatureSettings => "font-feature-settings",
        }
    }
}

/// Descriptor set handed to the font-face constructor, kept in the order the
/// page supplied it. Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct FontFaceDescriptors {
    entries: Vec<(String, String)>,
}

impl FontFaceDescriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FontFaceDescriptors {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut descriptors = Self::new();
        for (key, value) in iter {
            descriptors.set(key, value);
        }
        descriptors
    }
}

impl From<Map<String, Value>> for FontFaceDescriptors {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(key, value)| match value {
                Value::String(text) => (key, text),
                other => (key, other.to_string()),
            })
            .collect()
    }
}

impl From<FontFaceDescriptors> for Map<String, Value> {
    fn from(descriptors: FontFaceDescriptors) -> Self {
        descriptors
            .entries
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect()
    }
}

/// One font registered by page code.
///
/// Serializes as `{"font-family", "src", <style attributes in supplied order>}`.
/// Equality is the equality of that serialized text, so two observations with
/// the same attributes in a different order are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct FontObservation {
    font_family: String,
    src: String,
    style: Vec<(FontAttribute, String)>,
}

impl FontObservation {
    pub fn new(font_family: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
            src: src.into(),
            style: Vec::new(),
        }
    }

    /// Build an observation from font-face constructor arguments.
    ///
    /// Descriptor keys outside the descriptor table are dropped. A `family`
    /// descriptor overwrites the positional family name.
    pub fn from_arguments(
        font_family: impl Into<String>,
        src: impl Into<String>,
        descriptors: Option<&FontFaceDescriptors>,
    ) -> Self {
        let mut observation = Self::new(font_family, src);
        if let Some(descriptors) = descriptors {
            for (key, value) in descriptors.iter() {
                if let Some(attribute) = FontAttribute::from_descriptor(key) {
                    observation.set_attribute(attribute, value);
                }
            }
        }
        observation
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn attribute(&self, attribute: FontAttribute) -> Option<&str> {
        if attribute == FontAttribute::Family {
            return Some(&self.font_family);
        }
        self.style
            .iter()
            .find(|(a, _)| *a == attribute)
            .map(|(_, v)| v.as_str())
    }

    /// Style attributes (everything but family and src) in reported order.
    pub fn style_attributes(&self) -> impl Iterator<Item = (FontAttribute, &str)> {
        self.style.iter().map(|(a, v)| (*a, v.as_str()))
    }

    /// Serialized JSON text; the identity used for deduplication.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }

    fn set_attribute(&mut self, attribute: FontAttribute, value: &str) {
        if attribute == FontAttribute::Family {
            self.font_family = value.to_owned();
            return;
        }
        match self.style.iter_mut().find(|(a, _)| *a == attribute) {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.style.push((attribute, value.to_owned())),
        }
    }
}

impl Serialize for FontObservation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.style.len()))?;
        map.serialize_entry(FONT_FAMILY_KEY, &self.font_family)?;
        map.serialize_entry(SRC_KEY, &self.src)?;
        for (attribute, value) in &self.style {
            map.serialize_entry(attribute.attribute_name(), value)?;
        }
        map.end()
    }
}

impl TryFrom<Map<String, Value>> for FontObservation {
    type Error = HookError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut font_family = None;
        let mut src = None;
        let mut style = Vec::new();

        for (key, value) in map {
            let Value::String(text) = value else {
                return Err(HookError::malformed(
                    NEW_FONT_FACE_EVENT,
                    format!("attribute \"{key}\" is not a string"),
                ));
            };
            match key.as_str() {
                FONT_FAMILY_KEY => font_family = Some(text),
                SRC_KEY => src = Some(text),
                name => match FontAttribute::from_attribute_name(name) {
                    Some(attribute) => style.push((attribute, text)),
                    None => {
                        return Err(HookError::malformed(
                            NEW_FONT_FACE_EVENT,
                            format!("unknown attribute \"{name}\""),
                        ));
                    }
                },
            }
        }

        let font_family = font_family
            .ok_or_else(|| HookError::malformed(NEW_FONT_FACE_EVENT, "missing font-family"))?;
        let src = src.ok_or_else(|| HookError::malformed(NEW_FONT_FACE_EVENT, "missing src"))?;
        Ok(Self { font_family, src, style })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_family_src_then_descriptors_in_supplied_order() {
        let descriptors = FontFaceDescriptors::new()
            .with("weight", "700")
            .with("style", "italic");
        let observation =
            FontObservation::from_arguments("Inter", "url(inter.woff2)", Some(&descriptors));
        assert_eq!(
            observation.fingerprint(),
            r#"{"font-family":"Inter","src":"url(inter.woff2)","font-weight":"700","font-style":"italic"}"#
        );
    }

    #[test]
    fn family_descriptor_overwrites_positional_family() {
        let descriptors = FontFaceDescriptors::new().with("family", "Override");
        let observation = FontObservation::from_arguments("Inter", "url(a)", Some(&descriptors));
        assert_eq!(observation.font_family(), "Override");
        assert_eq!(
            observation.fingerprint(),
            r#"{"font-family":"Override","src":"url(a)"}"#
        );
    }

    #[test]
    fn unknown_descriptors_are_dropped() {
        let descriptors = FontFaceDescriptors::new()
            .with("display", "swap")
            .with("unicodeRange", "U+0000-00FF");
        let observation = FontObservation::from_arguments("Inter", "url(a)", Some(&descriptors));
        assert_eq!(observation.style_attributes().count(), 1);
        assert_eq!(
            observation.attribute(FontAttribute::UnicodeRange),
            Some("U+0000-00FF")
        );
    }

    #[test]
    fn descriptor_order_changes_identity() {
        let a = FontFaceDescriptors::new().with("weight", "400").with("style", "normal");
        let b = FontFaceDescriptors::new().with("style", "normal").with("weight", "400");
        let first = FontObservation::from_arguments("Inter", "url(a)", Some(&a));
        let second = FontObservation::from_arguments("Inter", "url(a)", Some(&b));
        assert_ne!(first, second);
        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn decodes_wire_detail_keeping_attribute_order() {
        let detail = serde_json::json!({
            "font-family": "Roboto",
            "src": "url(roboto.woff)",
            "font-stretch": "condensed",
            "font-variant": "small-caps"
        });
        let observation: FontObservation = serde_json::from_value(detail).unwrap();
        let order: Vec<_> = observation.style_attributes().map(|(a, _)| a).collect();
        assert_eq!(order, vec![FontAttribute::Stretch, FontAttribute::Variant]);
    }

    #[test]
    fn rejects_detail_without_src() {
        let detail = serde_json::json!({ "font-family": "Roboto" });
        assert!(serde_json::from_value::<FontObservation>(detail).is_err());
    }

    #[test]
    fn rejects_non_string_attribute() {
        let detail = serde_json::json!({ "font-family": "Roboto", "src": {} });
        assert!(serde_json::from_value::<FontObservation>(detail).is_err());
    }

    #[test]
    fn descriptors_from_json_keep_order_and_stringify_values() {
        let descriptors: FontFaceDescriptors =
            serde_json::from_value(serde_json::json!({ "weight": 700, "style": "italic" })).unwrap();
        let keys: Vec<_> = descriptors.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["weight", "style"]);
        assert_eq!(descriptors.get("weight"), Some("700"));
    }
}
