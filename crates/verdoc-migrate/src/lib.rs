//! # verdoc-migrate
//!
//! Single-step schema migrations for [`verdoc`](https://docs.rs/verdoc)
//! documents.
//!
//! When a document's stored version differs from the version a reader asks
//! for, a registered migration step transforms the structured payload — no
//! downtime, no reprocessing of the whole table, no data loss.
//!
//! ## How It Works
//!
//! 1. Every payload type declares its native version and its migration steps
//!    via the [`Versioned`] trait.
//! 2. The declared steps are validated once, at startup, into a
//!    [`MigrationSet`] — at most one step per source version.
//! 3. On read, the [`resolver`] compares the stored tag to the requested one
//!    and applies the single step leading out of the stored version.
//! 4. Callers re-check the landed version and invoke the resolver again
//!    until it matches the target, so chains (v1→v2→v3) compose out of
//!    single steps.
//!
//! ## Key Concepts
//!
//! - **Lazy migration**: payloads are migrated in memory on read; stored
//!   records are rewritten only by an explicit bulk pass.
//! - **Pure steps**: a step must not observe external state — same input,
//!   same output. Purity is what makes re-reads and bulk-rewrite retries
//!   safe.
//! - **One step per resolution**: the resolver never chains internally; it
//!   applies exactly one step and hands control back.
//! - **No reverse paths**: reading a newer document as an older version
//!   fails unless a forward step happens to be registered for it.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod migration;
mod registry;
pub mod resolver;
mod schema;

pub use migration::{Migration, MigrationError};
pub use registry::{MigrationSet, RegistryError};
pub use resolver::{ResolutionError, ResolveError};
pub use schema::Versioned;
