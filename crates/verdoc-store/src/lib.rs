//! # verdoc-store
//!
//! Persistence backends and version adapters for
//! [`verdoc`](https://docs.rs/verdoc) documents.
//!
//! Provides the [`DocumentStore`] abstraction for keeping versioned JSON
//! documents in a key-value store, plus the [`VersionAdapter`] façade that
//! reads documents *as* a schema version — migrating stale payloads in
//! memory on the way out.
//!
//! ## Quick Start
//!
//! ```
//! use verdoc::VersionTag;
//! use verdoc_store::{DocumentStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//!
//! let payload = serde_json::json!({"sku": "p-1", "title": "Espresso"});
//! store.put("products", "p-1", &VersionTag::new("1"), &payload).unwrap();
//!
//! let doc = store.get("products", "p-1").unwrap().unwrap();
//! assert_eq!(doc.version, VersionTag::new("1"));
//! ```
//!
//! ## Backends
//!
//! | Backend | Feature flag | Use case |
//! |---------|-------------|----------|
//! | [`MemoryStore`] | *(always available)* | Testing, prototyping |
//! | `SqliteStore` | `sqlite` | File-backed single-node services |
//! | `RedbStore` | `redb` | Pure-Rust stack without C deps |

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod adapter;
mod memory;
#[cfg(feature = "redb")]
mod redb;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

pub use adapter::{AdapterError, VersionAdapter};
pub use memory::{MemoryError, MemoryStore};
#[cfg(feature = "redb")]
pub use redb::{RedbError, RedbStore};
#[cfg(feature = "sqlite")]
pub use sqlite::{JournalMode, SqliteConfig, SqliteError, SqliteStore};
pub use traits::DocumentStore;
