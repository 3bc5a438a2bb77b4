//! # Product Catalog Example
//!
//! Demonstrates the full verdoc stack:
//!
//! 1. **Version adapters** — typed save/get tagged with a schema version
//! 2. **Lazy migration** — v1 data transparently upgraded to v2 on read
//! 3. **Bulk rewrite** — explicit migration of every stored v1 record
//! 4. **Failure paths** — what happens when no migration path exists
//! 5. **SQLite backend** — the same flow against a file-backed store
//!
//! Run: `cargo run -p verdoc-example-catalog`
//!
//! Set `RUST_LOG=debug` to watch individual migration steps fire.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use verdoc::{JsonCodec, VersionTag};
use verdoc_migrate::{Migration, MigrationError, Versioned};
use verdoc_store::{AdapterError, DocumentStore, MemoryStore, SqliteStore, VersionAdapter};

// ── Payload shapes ────────────────────────────────────────────────

/// The shape the catalog service wrote last year: a flat price in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ProductV1 {
    sku: String,
    title: String,
    price_cents: u64,
}

impl Versioned for ProductV1 {
    const VERSION: &'static str = "1";
    const TABLE: &'static str = "products";

    fn key(&self) -> &str {
        &self.sku
    }
}

/// The current shape: price is a money object with an explicit currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ProductV2 {
    sku: String,
    title: String,
    price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Money {
    cents: u64,
    currency: String,
}

impl Versioned for ProductV2 {
    const VERSION: &'static str = "2";
    const TABLE: &'static str = "products";

    fn key(&self) -> &str {
        &self.sku
    }

    fn migrations() -> Vec<Box<dyn Migration>> {
        vec![Box::new(NestPrice)]
    }
}

/// V1 -> V2: move `price_cents` under a `price` object. All v1 prices were
/// euro amounts, so the currency is fixed here.
struct NestPrice;

impl Migration for NestPrice {
    fn applies_to(&self) -> VersionTag {
        "1".into()
    }
    fn target_version(&self) -> VersionTag {
        "2".into()
    }
    fn migrate(&self, mut payload: Value) -> Result<Value, MigrationError> {
        let obj = payload
            .as_object_mut()
            .ok_or_else(|| MigrationError::InvalidPayload("not an object".into()))?;
        let cents = obj
            .remove("price_cents")
            .ok_or_else(|| MigrationError::MissingField {
                field: "price_cents".into(),
            })?;
        obj.insert("price".into(), json!({"cents": cents, "currency": "EUR"}));
        Ok(payload)
    }
}

fn main() {
    env_logger::init();

    println!("=== Product Catalog Example (verdoc) ===\n");

    demo_save_and_get();
    demo_lazy_migration();
    demo_bulk_rewrite();
    demo_failure_paths();
    demo_sqlite_backend();

    println!("\n=== Done! ===");
}

// ── Section 1: Save / get at one version ──────────────────────────

fn demo_save_and_get() {
    println!("1. Save and read back at the native version...\n");

    let mut adapter: VersionAdapter<ProductV1, _> =
        VersionAdapter::new(MemoryStore::new(), JsonCodec::new()).unwrap();

    let product = ProductV1 {
        sku: "p-100".into(),
        title: "Espresso Beans 1kg".into(),
        price_cents: 1499,
    };
    adapter.save(&product).unwrap();

    let loaded = adapter.get("p-100").unwrap();
    println!("   Saved and loaded: {loaded:?}");
    assert_eq!(loaded, product);

    println!();
}

// ── Section 2: Lazy migration on read ─────────────────────────────

fn demo_lazy_migration() {
    println!("2. Lazy migration v1 -> v2 on read...\n");

    let codec = JsonCodec::new();
    let mut store = MemoryStore::new();

    // Simulate: the old binary wrote this record.
    {
        let mut v1: VersionAdapter<ProductV1, _> =
            VersionAdapter::new(&mut store, codec.clone()).unwrap();
        v1.save(&ProductV1 {
            sku: "p-100".into(),
            title: "Espresso Beans 1kg".into(),
            price_cents: 1499,
        })
        .unwrap();
    }

    // The new binary reads it as v2 — the step runs in memory.
    let v2: VersionAdapter<ProductV2, _> = VersionAdapter::new(&mut store, codec).unwrap();
    let migrated = v2.get("p-100").unwrap();
    println!("   Read as v2: {migrated:?}");
    assert_eq!(migrated.price.cents, 1499);
    assert_eq!(migrated.price.currency, "EUR");

    // The stored record is untouched until an explicit rewrite.
    let stored = v2.store().get("products", "p-100").unwrap().unwrap();
    println!("   Still stored as version {}", stored.version);
    assert_eq!(stored.version, VersionTag::new("1"));

    println!("   Lazy migration successful!\n");
}

// ── Section 3: Bulk rewrite ───────────────────────────────────────

fn demo_bulk_rewrite() {
    println!("3. Explicit bulk rewrite of all v1 records...\n");

    let codec = JsonCodec::new();
    let mut store = MemoryStore::new();

    {
        let mut v1: VersionAdapter<ProductV1, _> =
            VersionAdapter::new(&mut store, codec.clone()).unwrap();
        for (sku, title, cents) in [
            ("p-100", "Espresso Beans 1kg", 1499u64),
            ("p-101", "Filter Roast 500g", 899),
            ("p-102", "Moka Pot", 2950),
        ] {
            v1.save(&ProductV1 {
                sku: sku.into(),
                title: title.into(),
                price_cents: cents,
            })
            .unwrap();
        }
    }

    let mut v2: VersionAdapter<ProductV2, _> =
        VersionAdapter::new(&mut store, codec).unwrap();
    let rewritten = v2.migrate_all(&"1".into()).unwrap();
    println!("   Rewrote {rewritten} records");
    assert_eq!(rewritten, 3);

    let old = store.scan_by_version("products", &"1".into()).unwrap();
    let new = store.scan_by_version("products", &"2".into()).unwrap();
    println!("   Records at v1: {}, at v2: {}", old.len(), new.len());
    assert!(old.is_empty());
    assert_eq!(new.len(), 3);

    println!("   Bulk rewrite successful!\n");
}

// ── Section 4: Failure paths ──────────────────────────────────────

fn demo_failure_paths() {
    println!("4. Failure paths...\n");

    let codec = JsonCodec::new();
    let mut store = MemoryStore::new();

    // Write a v2 record.
    {
        let mut v2: VersionAdapter<ProductV2, _> =
            VersionAdapter::new(&mut store, codec.clone()).unwrap();
        v2.save(&ProductV2 {
            sku: "p-200".into(),
            title: "Grinder".into(),
            price: Money {
                cents: 7900,
                currency: "EUR".into(),
            },
        })
        .unwrap();
    }

    // No migration reads v2, so the v1 adapter cannot go back.
    let v1: VersionAdapter<ProductV1, _> = VersionAdapter::new(&mut store, codec).unwrap();
    match v1.get("p-200").unwrap_err() {
        AdapterError::Resolution(e) => println!("   Reading v2 data as v1 fails: {e}"),
        other => panic!("unexpected error: {other}"),
    }

    // Missing documents are their own error, not a resolution problem.
    match v1.get("p-999").unwrap_err() {
        AdapterError::NotFound { key } => println!("   Missing key reported as not found: {key}"),
        other => panic!("unexpected error: {other}"),
    }

    println!();
}

// ── Section 5: SQLite backend ─────────────────────────────────────

fn demo_sqlite_backend() {
    println!("5. Same flow against SQLite...\n");

    let codec = JsonCodec::new();
    let mut store = SqliteStore::open_in_memory().unwrap();

    {
        let mut v1: VersionAdapter<ProductV1, _> =
            VersionAdapter::new(&mut store, codec.clone()).unwrap();
        v1.save(&ProductV1 {
            sku: "p-100".into(),
            title: "Espresso Beans 1kg".into(),
            price_cents: 1499,
        })
        .unwrap();
    }

    // Hand the same store to the v2 adapter.
    let v2: VersionAdapter<ProductV2, _> = VersionAdapter::new(&mut store, codec).unwrap();

    let migrated = v2.get("p-100").unwrap();
    println!("   Read from SQLite as v2: {migrated:?}");
    assert_eq!(migrated.price.cents, 1499);

    println!("   SQLite backend works!");
}
