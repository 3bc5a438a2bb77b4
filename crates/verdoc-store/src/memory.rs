use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use verdoc::{Value, VersionTag, VersionedDocument};

use crate::traits::DocumentStore;

/// In-memory storage backend.
///
/// Documents live in a `BTreeMap` — nothing touches disk. Ideal for testing
/// and prototyping.
///
/// # Example
///
/// ```
/// use verdoc::VersionTag;
/// use verdoc_store::{DocumentStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// let v1 = VersionTag::new("1");
/// store.put("products", "p-1", &v1, &serde_json::json!({"sku": "p-1"})).unwrap();
///
/// let doc = store.get("products", "p-1").unwrap().unwrap();
/// assert_eq!(doc.version, v1);
/// ```
pub struct MemoryStore {
    /// (table, key) -> (version, payload)
    documents: BTreeMap<(String, String), (VersionTag, Value)>,
}

/// Error type for the in-memory backend.
///
/// This backend never actually fails, but the trait requires an error type.
#[derive(Debug, Clone)]
pub struct MemoryError(String);

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryStore error: {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MemoryError {}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            documents: BTreeMap::new(),
        }
    }

    /// Total number of documents across all tables.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn table_key(table: &str, key: &str) -> (String, String) {
        (table.to_string(), key.to_string())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    type Error = MemoryError;

    fn put(
        &mut self,
        table: &str,
        key: &str,
        version: &VersionTag,
        payload: &Value,
    ) -> Result<(), Self::Error> {
        self.documents.insert(
            Self::table_key(table, key),
            (version.clone(), payload.clone()),
        );
        Ok(())
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<VersionedDocument>, Self::Error> {
        Ok(self
            .documents
            .get(&Self::table_key(table, key))
            .map(|(version, payload)| {
                VersionedDocument::new(key, version.clone(), payload.clone())
            }))
    }

    fn scan_by_version(
        &self,
        table: &str,
        version: &VersionTag,
    ) -> Result<Vec<VersionedDocument>, Self::Error> {
        let docs = self
            .documents
            .iter()
            .filter(|((tbl, _), (ver, _))| tbl == table && ver == version)
            .map(|((_, key), (ver, payload))| {
                VersionedDocument::new(key.clone(), ver.clone(), payload.clone())
            })
            .collect();
        Ok(docs)
    }

    fn delete(&mut self, table: &str, key: &str) -> Result<(), Self::Error> {
        self.documents.remove(&Self::table_key(table, key));
        Ok(())
    }

    fn delete_all(&mut self, table: &str) -> Result<(), Self::Error> {
        self.documents.retain(|(tbl, _), _| tbl != table);
        Ok(())
    }

    fn list_keys(&self, table: &str) -> Result<Vec<String>, Self::Error> {
        let keys = self
            .documents
            .keys()
            .filter(|(tbl, _)| tbl == table)
            .map(|(_, k)| k.clone())
            .collect();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(tag: &str) -> VersionTag {
        VersionTag::new(tag)
    }

    #[test]
    fn put_get_delete() {
        let mut store = MemoryStore::new();

        store.put("tbl", "k1", &v("1"), &json!({"a": 1})).unwrap();
        let doc = store.get("tbl", "k1").unwrap().unwrap();
        assert_eq!(doc.key, "k1");
        assert_eq!(doc.version, v("1"));
        assert_eq!(doc.payload, json!({"a": 1}));

        store.put("tbl", "k1", &v("2"), &json!({"a": 2})).unwrap();
        let doc = store.get("tbl", "k1").unwrap().unwrap();
        assert_eq!(doc.version, v("2"));
        assert_eq!(doc.payload, json!({"a": 2}));

        store.delete("tbl", "k1").unwrap();
        assert!(store.get("tbl", "k1").unwrap().is_none());
    }

    #[test]
    fn delete_missing_key_is_not_an_error() {
        let mut store = MemoryStore::new();
        store.delete("tbl", "nope").unwrap();
    }

    #[test]
    fn table_isolation() {
        let mut store = MemoryStore::new();
        store.put("a", "k1", &v("1"), &json!("alpha")).unwrap();
        store.put("b", "k1", &v("1"), &json!("beta")).unwrap();

        assert_eq!(store.get("a", "k1").unwrap().unwrap().payload, json!("alpha"));
        assert_eq!(store.get("b", "k1").unwrap().unwrap().payload, json!("beta"));
    }

    #[test]
    fn scan_by_version_filters() {
        let mut store = MemoryStore::new();
        store.put("tbl", "k1", &v("1"), &json!(1)).unwrap();
        store.put("tbl", "k2", &v("2"), &json!(2)).unwrap();
        store.put("tbl", "k3", &v("1"), &json!(3)).unwrap();
        store.put("other", "k4", &v("1"), &json!(4)).unwrap();

        let docs = store.scan_by_version("tbl", &v("1")).unwrap();
        let keys: Vec<_> = docs.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["k1", "k3"]);

        assert!(store.scan_by_version("tbl", &v("3")).unwrap().is_empty());
    }

    #[test]
    fn delete_all_clears_only_the_table() {
        let mut store = MemoryStore::new();
        store.put("tbl", "k1", &v("1"), &json!(1)).unwrap();
        store.put("tbl", "k2", &v("1"), &json!(2)).unwrap();
        store.put("other", "k3", &v("1"), &json!(3)).unwrap();

        store.delete_all("tbl").unwrap();
        assert!(store.list_keys("tbl").unwrap().is_empty());
        assert_eq!(store.list_keys("other").unwrap(), vec!["k3"]);
    }

    #[test]
    fn list_keys_and_exists() {
        let mut store = MemoryStore::new();
        store.put("tbl", "b", &v("1"), &json!(1)).unwrap();
        store.put("tbl", "a", &v("1"), &json!(2)).unwrap();

        assert_eq!(store.list_keys("tbl").unwrap(), vec!["a", "b"]);
        assert!(store.exists("tbl", "a").unwrap());
        assert!(!store.exists("tbl", "c").unwrap());
    }
}
