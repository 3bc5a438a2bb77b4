use alloc::string::String;
use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque schema-version tag.
///
/// Tags are compared only for equality — no ordering or numeric successor is
/// assumed between versions. Which shapes are reachable from which is
/// declared entirely by the registered migration steps.
///
/// # Example
///
/// ```
/// use verdoc::VersionTag;
///
/// let v1 = VersionTag::new("1");
/// let also_v1: VersionTag = "1".into();
/// assert_eq!(v1, also_v1);
/// assert_eq!(v1.as_str(), "1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    /// Create a tag from any string-like value.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for VersionTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// A stored record: a key, the schema version its payload is encoded in, and
/// the structured payload itself.
///
/// Invariant: `version` always reflects the shape of `payload`. The two are
/// only ever written together — a migration that changes the payload also
/// changes the tag, never one without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedDocument {
    /// Primary key the document is stored under.
    pub key: String,
    /// Schema version of `payload`.
    pub version: VersionTag,
    /// The structured payload.
    pub payload: Value,
}

impl VersionedDocument {
    /// Create a document.
    pub fn new(key: impl Into<String>, version: impl Into<VersionTag>, payload: Value) -> Self {
        Self {
            key: key.into(),
            version: version.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_equality_is_textual() {
        assert_eq!(VersionTag::new("2"), VersionTag::from("2"));
        assert_ne!(VersionTag::new("2"), VersionTag::new("2.0"));
    }

    #[test]
    fn tag_display() {
        let tag = VersionTag::new("v3-beta");
        assert_eq!(alloc::format!("{tag}"), "v3-beta");
    }

    #[test]
    fn document_construction() {
        let doc = VersionedDocument::new("42", "1", json!({"id": "42"}));
        assert_eq!(doc.key, "42");
        assert_eq!(doc.version, VersionTag::new("1"));
        assert_eq!(doc.payload, json!({"id": "42"}));
    }

    #[test]
    fn tag_serializes_as_plain_string() {
        let tag = VersionTag::new("7");
        assert_eq!(serde_json::to_value(&tag).unwrap(), json!("7"));
        let back: VersionTag = serde_json::from_value(json!("7")).unwrap();
        assert_eq!(back, tag);
    }
}
