use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::migration::Migration;

/// Binds a payload type to its native schema version, its storage table, and
/// the migration steps that reach that version from its predecessors.
///
/// The binding is declared in code and fixed for the lifetime of the
/// process — explicit wiring in place of runtime discovery. Adapters read it
/// once at construction and validate the declared steps into a
/// [`MigrationSet`](crate::MigrationSet) before serving any traffic.
///
/// # Example
///
/// ```
/// use serde::{Serialize, Deserialize};
/// use verdoc_migrate::Versioned;
///
/// #[derive(Serialize, Deserialize)]
/// struct Product {
///     sku: String,
///     name: String,
/// }
///
/// impl Versioned for Product {
///     const VERSION: &'static str = "1";
///     const TABLE: &'static str = "products";
///
///     fn key(&self) -> &str {
///         &self.sku
///     }
/// }
/// ```
pub trait Versioned: Sized {
    /// The schema version this type is encoded as.
    const VERSION: &'static str;

    /// The storage table documents of this type live in. Every version of a
    /// payload shape shares one table.
    const TABLE: &'static str;

    /// The identity field the document key is derived from.
    fn key(&self) -> &str;

    /// Steps producing [`VERSION`](Self::VERSION) from older versions.
    ///
    /// Defaults to none. Declared once; validated when an adapter builds its
    /// [`MigrationSet`](crate::MigrationSet) at startup.
    fn migrations() -> Vec<Box<dyn Migration>> {
        Vec::new()
    }
}
