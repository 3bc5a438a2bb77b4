//! # verdoc
//!
//! Core data model for versioned JSON documents.
//!
//! A versioned document is a key, an opaque schema-version tag, and a
//! structured JSON payload. The tag always reflects the shape the payload is
//! encoded in; the two are only ever written together. Higher layers
//! ([`verdoc-migrate`](https://docs.rs/verdoc-migrate) and
//! [`verdoc-store`](https://docs.rs/verdoc-store)) use the tag to decide
//! whether a stored payload needs migrating before it is decoded.
//!
//! ## Quick Start
//!
//! ```
//! use serde::{Serialize, Deserialize};
//! use verdoc::{JsonCodec, VersionedDocument};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Sensor { id: String, temperature: f32 }
//!
//! let codec = JsonCodec::new();
//! let sensor = Sensor { id: "s1".into(), temperature: 22.5 };
//!
//! let payload = codec.encode(&sensor).unwrap();
//! let doc = VersionedDocument::new("s1", "1", payload);
//!
//! let decoded: Sensor = codec.decode(doc.payload).unwrap();
//! assert_eq!(decoded, sensor);
//! ```
//!
//! ## `no_std` Support
//!
//! This crate supports `no_std` environments with the `alloc` crate.
//! Disable the default `std` feature in your `Cargo.toml`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod codec;
mod document;

pub use codec::{CodecError, JsonCodec};
pub use document::{VersionTag, VersionedDocument};

// The structured payload form used throughout the stack.
pub use serde_json::Value;
