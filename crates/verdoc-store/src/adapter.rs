//! High-level adapter API for versioned documents.
//!
//! A [`VersionAdapter`] reads and writes one payload type at that type's
//! native schema version. Saves tag the document with the native version;
//! reads decode directly on a version match, or migrate the stored payload
//! in memory first — one registered step at a time — until it reaches the
//! native version.
//!
//! # Example
//!
//! ```
//! use serde::{Serialize, Deserialize};
//! use verdoc::JsonCodec;
//! use verdoc_migrate::Versioned;
//! use verdoc_store::{MemoryStore, VersionAdapter};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Product { sku: String, title: String }
//!
//! impl Versioned for Product {
//!     const VERSION: &'static str = "1";
//!     const TABLE: &'static str = "products";
//!     fn key(&self) -> &str { &self.sku }
//! }
//!
//! let mut adapter = VersionAdapter::new(MemoryStore::new(), JsonCodec::new()).unwrap();
//! let product = Product { sku: "p-1".into(), title: "Espresso".into() };
//! adapter.save(&product).unwrap();
//!
//! let loaded: Product = adapter.get("p-1").unwrap();
//! assert_eq!(loaded, product);
//! ```

use alloc::string::{String, ToString};
use core::fmt;
use core::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use verdoc::{CodecError, JsonCodec, VersionTag};
use verdoc_migrate::resolver;
use verdoc_migrate::{MigrationError, MigrationSet, RegistryError, ResolutionError, Versioned};

use crate::traits::DocumentStore;

/// Error type for [`VersionAdapter`] operations.
#[derive(Debug)]
pub enum AdapterError<E: fmt::Debug + fmt::Display> {
    /// Error from the underlying storage backend. The only transient kind —
    /// retry policy belongs to the backend and its caller.
    Store(E),
    /// No document exists under the key.
    NotFound {
        /// The key that was looked up.
        key: String,
    },
    /// The payload could not be converted to or from its structured form.
    Codec(CodecError),
    /// No registered step leads out of the stored version. Permanent for
    /// this `(stored, target)` pair; never retried automatically.
    Resolution(ResolutionError),
    /// A migration step could not transform the stored payload.
    Migration {
        /// Version the failing step reads.
        from: VersionTag,
        /// Version the failing step produces.
        to: VersionTag,
        /// Why the step failed.
        source: MigrationError,
    },
}

impl<E: fmt::Debug + fmt::Display> fmt::Display for AdapterError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::NotFound { key } => write!(f, "no document under key {key:?}"),
            Self::Codec(e) => e.fmt(f),
            Self::Resolution(e) => e.fmt(f),
            Self::Migration { from, to, source } => {
                write!(f, "migration {from} -> {to} failed: {source}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for AdapterError<E> {}

impl<E: fmt::Debug + fmt::Display> From<CodecError> for AdapterError<E> {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

/// Reads and writes one payload type at its native schema version.
///
/// The adapter holds the store, a shared [`JsonCodec`], and the validated
/// [`MigrationSet`] built from [`Versioned::migrations`] at construction —
/// malformed declarations fail here, at startup, not on first read.
///
/// `save` performs exactly one write and always overwrites. `get` performs
/// exactly one read; on a version mismatch, migration operates purely in
/// memory on the already-fetched payload, with zero additional reads.
pub struct VersionAdapter<T: Versioned, S: DocumentStore> {
    store: S,
    codec: JsonCodec,
    migrations: MigrationSet,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Versioned, S: DocumentStore> core::fmt::Debug for VersionAdapter<T, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VersionAdapter")
            .field("version", &T::VERSION)
            .finish_non_exhaustive()
    }
}

impl<T: Versioned, S: DocumentStore> VersionAdapter<T, S> {
    /// Build an adapter over `store`, validating the migration steps
    /// declared by `T`.
    pub fn new(store: S, codec: JsonCodec) -> Result<Self, RegistryError> {
        let migrations = MigrationSet::new(T::migrations())?;
        Ok(Self {
            store,
            codec,
            migrations,
            _payload: PhantomData,
        })
    }

    /// The native schema version this adapter reads and writes.
    pub fn version(&self) -> VersionTag {
        T::VERSION.into()
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a mutable reference to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Save a payload, tagged with the adapter's native version, under the
    /// key derived from the payload's identity field. Always overwrites.
    pub fn save(&mut self, payload: &T) -> Result<(), AdapterError<S::Error>>
    where
        T: Serialize,
    {
        let value = self.codec.encode(payload)?;
        self.store
            .put(T::TABLE, payload.key(), &self.version(), &value)
            .map_err(AdapterError::Store)
    }

    /// Read the document at `key` as the adapter's native version.
    ///
    /// A stored payload at another version is migrated in memory, one
    /// registered step at a time, until it lands on the native version. If
    /// no step leads out of the version at hand the read fails with
    /// [`AdapterError::Resolution`] — no fallback, no partial result.
    pub fn get(&self, key: &str) -> Result<T, AdapterError<S::Error>>
    where
        T: DeserializeOwned,
    {
        let doc = self
            .store
            .get(T::TABLE, key)
            .map_err(AdapterError::Store)?
            .ok_or_else(|| AdapterError::NotFound {
                key: key.to_string(),
            })?;

        let target = self.version();
        let mut version = doc.version;
        let mut payload = doc.payload;

        // One step per resolution; re-check the landed version each time.
        // A walk that visits more steps than the set holds has revisited a
        // source version, so it can never reach the target.
        let mut hops = 0;
        while version != target {
            if hops >= self.migrations.len() {
                return Err(AdapterError::Resolution(ResolutionError {
                    expected: target,
                    actual: version,
                }));
            }
            let step = resolver::resolve(&version, &target, &self.migrations)
                .map_err(AdapterError::Resolution)?;
            log::debug!(
                "migrating {}/{} from version {} to {}",
                T::TABLE,
                key,
                version,
                step.target_version()
            );
            payload = step.migrate(payload).map_err(|e| AdapterError::Migration {
                from: step.applies_to(),
                to: step.target_version(),
                source: e,
            })?;
            version = step.target_version();
            hops += 1;
        }

        Ok(self.codec.decode(payload)?)
    }

    /// Check whether a document exists under `key`.
    pub fn exists(&self, key: &str) -> Result<bool, AdapterError<S::Error>> {
        self.store.exists(T::TABLE, key).map_err(AdapterError::Store)
    }

    /// Delete the document at `key`. Deleting a missing key is not an error.
    pub fn delete(&mut self, key: &str) -> Result<(), AdapterError<S::Error>> {
        self.store.delete(T::TABLE, key).map_err(AdapterError::Store)
    }

    /// Rewrite every stored document at version `from` one step forward.
    ///
    /// Scans the version index, applies the single registered step to each
    /// record, and writes it back tagged with the step's target version.
    /// Returns the number of rewritten documents.
    ///
    /// This is an at-least-once, non-transactional pass: a crash mid-scan
    /// leaves some records migrated and others not, and re-running is safe
    /// because steps are pure and the scan no longer matches records already
    /// moved off `from`.
    pub fn migrate_all(&mut self, from: &VersionTag) -> Result<u64, AdapterError<S::Error>> {
        if *from == self.version() {
            return Ok(0);
        }

        let stale = self
            .store
            .scan_by_version(T::TABLE, from)
            .map_err(AdapterError::Store)?;
        if stale.is_empty() {
            return Ok(0);
        }

        let step = resolver::resolve(from, &self.version(), &self.migrations)
            .map_err(AdapterError::Resolution)?;
        let to = step.target_version();

        let mut count = 0u64;
        for doc in stale {
            let migrated = step.migrate(doc.payload).map_err(|e| AdapterError::Migration {
                from: step.applies_to(),
                to: to.clone(),
                source: e,
            })?;
            self.store
                .put(T::TABLE, &doc.key, &to, &migrated)
                .map_err(AdapterError::Store)?;
            count += 1;
        }

        log::info!(
            "rewrote {} documents in {} from version {} to {}",
            count,
            T::TABLE,
            from,
            to
        );
        Ok(count)
    }
}
