//! Pure-Rust key-value backend using [`redb`](https://docs.rs/redb).
//!
//! No C dependencies — ideal when you can't cross-compile SQLite, or when
//! you want a fully Rust-native stack. Documents and the version index live
//! in two tables kept in step within one transaction per operation, so
//! `scan_by_version` never scans the whole document table.
//!
//! Enable with `features = ["redb"]`.
//!
//! ```no_run
//! use verdoc::VersionTag;
//! use verdoc_store::{DocumentStore, RedbStore};
//!
//! let mut store = RedbStore::open("/tmp/catalog.redb").unwrap();
//! let payload = serde_json::json!({"sku": "p-1"});
//! store.put("products", "p-1", &VersionTag::new("1"), &payload).unwrap();
//! ```

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use verdoc::{Value, VersionTag, VersionedDocument};

use crate::traits::DocumentStore;

// ── Table definitions ───────────────────────────────────────────────

const DOC_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("documents");
const VERSION_INDEX: TableDefinition<&[u8], ()> = TableDefinition::new("version_index");

// ── Error type ──────────────────────────────────────────────────────

/// Errors returned by [`RedbStore`] operations.
#[derive(Debug)]
pub struct RedbError(String);

impl std::fmt::Display for RedbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RedbError {}

fn err(e: impl std::fmt::Display) -> RedbError {
    RedbError(e.to_string())
}

// ── Store ───────────────────────────────────────────────────────────

/// A pure-Rust persistence backend built on [`redb`].
///
/// Uses two internal tables: documents and a version index. All writes are
/// atomic (each operation runs in its own redb transaction), so the index
/// never drifts from the documents it covers.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RedbError> {
        let db = Database::create(path).map_err(err)?;
        Self::init_tables(&db)?;
        Ok(Self { db })
    }

    /// Create an in-memory redb database (for testing).
    pub fn open_in_memory() -> Result<Self, RedbError> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(err)?;
        Self::init_tables(&db)?;
        Ok(Self { db })
    }

    // Ensure tables exist by opening a write txn.
    fn init_tables(db: &Database) -> Result<(), RedbError> {
        let txn = db.begin_write().map_err(err)?;
        txn.open_table(DOC_TABLE).map_err(err)?;
        txn.open_table(VERSION_INDEX).map_err(err)?;
        txn.commit().map_err(err)?;
        Ok(())
    }
}

impl DocumentStore for RedbStore {
    type Error = RedbError;

    fn put(
        &mut self,
        table: &str,
        key: &str,
        version: &VersionTag,
        payload: &Value,
    ) -> Result<(), RedbError> {
        let json = serde_json::to_vec(payload).map_err(err)?;
        let txn = self.db.begin_write().map_err(err)?;
        {
            let mut docs = txn.open_table(DOC_TABLE).map_err(err)?;
            let mut index = txn.open_table(VERSION_INDEX).map_err(err)?;

            let dk = doc_key(table, key);

            // Drop the stale index entry when overwriting at a new version.
            let old_version = docs
                .get(dk.as_slice())
                .map_err(err)?
                .and_then(|guard| decode_doc_value(guard.value()).map(|(v, _)| v));
            if let Some(old) = old_version {
                if old != version.as_str() {
                    index
                        .remove(index_key(table, &old, key).as_slice())
                        .map_err(err)?;
                }
            }

            let dv = encode_doc_value(version.as_str(), &json);
            docs.insert(dk.as_slice(), dv.as_slice()).map_err(err)?;
            index
                .insert(index_key(table, version.as_str(), key).as_slice(), ())
                .map_err(err)?;
        }
        txn.commit().map_err(err)?;
        Ok(())
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<VersionedDocument>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let docs = txn.open_table(DOC_TABLE).map_err(err)?;
        match docs.get(doc_key(table, key).as_slice()).map_err(err)? {
            Some(guard) => {
                let (version, json) = decode_doc_value(guard.value())
                    .ok_or_else(|| RedbError("corrupt document value".into()))?;
                let payload: Value = serde_json::from_slice(&json).map_err(err)?;
                Ok(Some(VersionedDocument::new(key, version, payload)))
            }
            None => Ok(None),
        }
    }

    fn scan_by_version(
        &self,
        table: &str,
        version: &VersionTag,
    ) -> Result<Vec<VersionedDocument>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let index = txn.open_table(VERSION_INDEX).map_err(err)?;
        let docs = txn.open_table(DOC_TABLE).map_err(err)?;

        let lower = index_prefix(table, version.as_str());
        let upper = prefix_upper(&lower);
        let range = index.range(lower.as_slice()..upper.as_slice()).map_err(err)?;

        let mut found = Vec::new();
        for item in range {
            let (key_guard, _) = item.map_err(err)?;
            let key = parse_index_key(key_guard.value())
                .ok_or_else(|| RedbError("corrupt index key".into()))?;
            match docs.get(doc_key(table, key).as_slice()).map_err(err)? {
                Some(guard) => {
                    let (ver, json) = decode_doc_value(guard.value())
                        .ok_or_else(|| RedbError("corrupt document value".into()))?;
                    let payload: Value = serde_json::from_slice(&json).map_err(err)?;
                    found.push(VersionedDocument::new(key, ver, payload));
                }
                None => return Err(RedbError("index entry without document".into())),
            }
        }
        Ok(found)
    }

    fn delete(&mut self, table: &str, key: &str) -> Result<(), RedbError> {
        let txn = self.db.begin_write().map_err(err)?;
        {
            let mut docs = txn.open_table(DOC_TABLE).map_err(err)?;
            let mut index = txn.open_table(VERSION_INDEX).map_err(err)?;

            let removed = docs.remove(doc_key(table, key).as_slice()).map_err(err)?;
            if let Some(guard) = removed {
                if let Some((version, _)) = decode_doc_value(guard.value()) {
                    index
                        .remove(index_key(table, &version, key).as_slice())
                        .map_err(err)?;
                }
            }
        }
        txn.commit().map_err(err)?;
        Ok(())
    }

    fn delete_all(&mut self, table: &str) -> Result<(), RedbError> {
        let txn = self.db.begin_write().map_err(err)?;
        {
            let mut docs = txn.open_table(DOC_TABLE).map_err(err)?;
            let mut index = txn.open_table(VERSION_INDEX).map_err(err)?;

            let lower = table_prefix(table);
            let upper = prefix_upper(&lower);

            // Collect keys first — can't mutate while iterating.
            let doc_keys: Vec<Vec<u8>> = docs
                .range(lower.as_slice()..upper.as_slice())
                .map_err(err)?
                .map(|item| item.map(|(k, _)| k.value().to_vec()))
                .collect::<Result<_, _>>()
                .map_err(err)?;
            for k in &doc_keys {
                docs.remove(k.as_slice()).map_err(err)?;
            }

            let index_keys: Vec<Vec<u8>> = index
                .range(lower.as_slice()..upper.as_slice())
                .map_err(err)?
                .map(|item| item.map(|(k, _)| k.value().to_vec()))
                .collect::<Result<_, _>>()
                .map_err(err)?;
            for k in &index_keys {
                index.remove(k.as_slice()).map_err(err)?;
            }
        }
        txn.commit().map_err(err)?;
        Ok(())
    }

    fn list_keys(&self, table: &str) -> Result<Vec<String>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let docs = txn.open_table(DOC_TABLE).map_err(err)?;

        let lower = table_prefix(table);
        let upper = prefix_upper(&lower);
        let range = docs.range(lower.as_slice()..upper.as_slice()).map_err(err)?;

        let mut keys = Vec::new();
        for item in range {
            let (key_guard, _) = item.map_err(err)?;
            if let Some(k) = parse_doc_key(key_guard.value()) {
                keys.push(k.to_string());
            }
        }
        Ok(keys)
    }
}

// ── Key encoding helpers ────────────────────────────────────────────

/// Document key: `tbl \0 key`
fn doc_key(table: &str, key: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(table.len() + 1 + key.len());
    k.extend_from_slice(table.as_bytes());
    k.push(0);
    k.extend_from_slice(key.as_bytes());
    k
}

/// Parse a document key back into its `key` part.
fn parse_doc_key(key: &[u8]) -> Option<&str> {
    let pos = key.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&key[pos + 1..]).ok()
}

/// Index key: `tbl \0 version \0 key`
fn index_key(table: &str, version: &str, key: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(table.len() + 1 + version.len() + 1 + key.len());
    k.extend_from_slice(table.as_bytes());
    k.push(0);
    k.extend_from_slice(version.as_bytes());
    k.push(0);
    k.extend_from_slice(key.as_bytes());
    k
}

/// Parse the `key` part out of an index key.
fn parse_index_key(key: &[u8]) -> Option<&str> {
    let first = key.iter().position(|&b| b == 0)?;
    let rest = &key[first + 1..];
    let second = rest.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&rest[second + 1..]).ok()
}

/// Lower bound for all document keys in a table.
fn table_prefix(table: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(table.len() + 1);
    k.extend_from_slice(table.as_bytes());
    k.push(0);
    k
}

/// Lower bound for all index keys of `(table, version)`.
fn index_prefix(table: &str, version: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(table.len() + 1 + version.len() + 1);
    k.extend_from_slice(table.as_bytes());
    k.push(0);
    k.extend_from_slice(version.as_bytes());
    k.push(0);
    k
}

/// Upper bound (exclusive) for a `\0`-terminated prefix.
fn prefix_upper(prefix: &[u8]) -> Vec<u8> {
    let mut k = prefix.to_vec();
    *k.last_mut().expect("prefix is never empty") = 1; // \x01 > \x00, captures everything in range
    k
}

// ── Value encoding helpers ──────────────────────────────────────────

/// Encode a document value: `version_len(2) + version + payload_json`
fn encode_doc_value(version: &str, json: &[u8]) -> Vec<u8> {
    let ver = version.as_bytes();
    let mut v = Vec::with_capacity(2 + ver.len() + json.len());
    v.extend_from_slice(&(ver.len() as u16).to_be_bytes());
    v.extend_from_slice(ver);
    v.extend_from_slice(json);
    v
}

/// Decode a document value back into `(version, payload_json)`.
fn decode_doc_value(value: &[u8]) -> Option<(String, Vec<u8>)> {
    if value.len() < 2 {
        return None;
    }
    let ver_len = u16::from_be_bytes(value[..2].try_into().ok()?) as usize;
    if value.len() < 2 + ver_len {
        return None;
    }
    let version = String::from_utf8(value[2..2 + ver_len].to_vec()).ok()?;
    let json = value[2 + ver_len..].to_vec();
    Some((version, json))
}

// ── Tests ───────────────────────────────────────────────────────────
