use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use verdoc::{Value, VersionTag, VersionedDocument};

/// Record-level interface to the underlying key-value storage.
///
/// Documents live in named tables under a primary key, together with the
/// schema version their payload is encoded in. The store treats payloads as
/// opaque structured values — versioning decisions are made above it by the
/// [`VersionAdapter`](crate::VersionAdapter).
///
/// `scan_by_version` is the secondary-index lookup that drives explicit bulk
/// migration; ordinary reads never use it.
pub trait DocumentStore {
    /// Error type for this backend.
    type Error: fmt::Debug + fmt::Display;

    /// Write a document, overwriting any existing one under `(table, key)`.
    fn put(
        &mut self,
        table: &str,
        key: &str,
        version: &VersionTag,
        payload: &Value,
    ) -> Result<(), Self::Error>;

    /// Read the document at `(table, key)`.
    /// Returns `None` if no document exists under the key.
    fn get(&self, table: &str, key: &str) -> Result<Option<VersionedDocument>, Self::Error>;

    /// All documents in `table` stored at exactly `version`.
    fn scan_by_version(
        &self,
        table: &str,
        version: &VersionTag,
    ) -> Result<Vec<VersionedDocument>, Self::Error>;

    /// Delete the document at `(table, key)`. Deleting a missing key is not
    /// an error.
    fn delete(&mut self, table: &str, key: &str) -> Result<(), Self::Error>;

    /// Delete every document in `table`. Intended for tests and resets.
    fn delete_all(&mut self, table: &str) -> Result<(), Self::Error>;

    /// List all keys in `table`.
    fn list_keys(&self, table: &str) -> Result<Vec<String>, Self::Error>;

    /// Check whether a document exists under `(table, key)`.
    fn exists(&self, table: &str, key: &str) -> Result<bool, Self::Error> {
        Ok(self.get(table, key)?.is_some())
    }
}

// A mutable borrow of a store is itself a store, so several adapters can
// address one backend sequentially.
impl<S: DocumentStore + ?Sized> DocumentStore for &mut S {
    type Error = S::Error;

    fn put(
        &mut self,
        table: &str,
        key: &str,
        version: &VersionTag,
        payload: &Value,
    ) -> Result<(), Self::Error> {
        (**self).put(table, key, version, payload)
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<VersionedDocument>, Self::Error> {
        (**self).get(table, key)
    }

    fn scan_by_version(
        &self,
        table: &str,
        version: &VersionTag,
    ) -> Result<Vec<VersionedDocument>, Self::Error> {
        (**self).scan_by_version(table, version)
    }

    fn delete(&mut self, table: &str, key: &str) -> Result<(), Self::Error> {
        (**self).delete(table, key)
    }

    fn delete_all(&mut self, table: &str) -> Result<(), Self::Error> {
        (**self).delete_all(table)
    }

    fn list_keys(&self, table: &str) -> Result<Vec<String>, Self::Error> {
        (**self).list_keys(table)
    }

    fn exists(&self, table: &str, key: &str) -> Result<bool, Self::Error> {
        (**self).exists(table, key)
    }
}
