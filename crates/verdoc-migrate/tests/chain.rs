//! Steps written the decode-old/build-new/encode-new way, composed into a
//! chain by repeated resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use verdoc::{JsonCodec, VersionTag};
use verdoc_migrate::{resolver, Migration, MigrationError, MigrationSet};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct OrderV1 {
    id: String,
    item: String,
    quantity: u32,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct OrderV2 {
    id: String,
    lines: Vec<OrderLine>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct OrderLine {
    item: String,
    quantity: u32,
}

/// V1 -> V2: the single item/quantity pair becomes a list of lines.
///
/// Implemented through the codec rather than raw JSON edits: decode the old
/// shape, build the new one, encode it. Codec failures surface as
/// `MigrationError::InvalidPayload` through the `From` conversion.
struct ListifyLines {
    codec: JsonCodec,
}

impl Migration for ListifyLines {
    fn applies_to(&self) -> VersionTag {
        "1".into()
    }
    fn target_version(&self) -> VersionTag {
        "2".into()
    }
    fn migrate(&self, payload: Value) -> Result<Value, MigrationError> {
        let old: OrderV1 = self.codec.decode(payload)?;
        let new = OrderV2 {
            id: old.id,
            lines: vec![OrderLine {
                item: old.item,
                quantity: old.quantity,
            }],
        };
        Ok(self.codec.encode(&new)?)
    }
}

/// V2 -> V3: orders gain a status, starting out open.
struct AddStatus;

impl Migration for AddStatus {
    fn applies_to(&self) -> VersionTag {
        "2".into()
    }
    fn target_version(&self) -> VersionTag {
        "3".into()
    }
    fn migrate(&self, mut payload: Value) -> Result<Value, MigrationError> {
        let obj = payload
            .as_object_mut()
            .ok_or_else(|| MigrationError::InvalidPayload("not an object".into()))?;
        obj.insert("status".into(), serde_json::json!("open"));
        Ok(payload)
    }
}

fn chain() -> MigrationSet {
    MigrationSet::new(vec![
        Box::new(ListifyLines {
            codec: JsonCodec::new(),
        }),
        Box::new(AddStatus),
    ])
    .unwrap()
}

#[test]
fn repeated_resolution_walks_the_chain() {
    let codec = JsonCodec::new();
    let set = chain();

    let order = OrderV1 {
        id: "o-1".into(),
        item: "beans".into(),
        quantity: 2,
    };
    let mut payload = codec.encode(&order).unwrap();

    let target = VersionTag::new("3");
    let mut version = VersionTag::new("1");
    while version != target {
        let step = resolver::resolve(&version, &target, &set).unwrap();
        payload = step.migrate(payload).unwrap();
        version = step.target_version();
    }

    assert_eq!(
        payload,
        serde_json::json!({
            "id": "o-1",
            "lines": [{"item": "beans", "quantity": 2}],
            "status": "open"
        })
    );
}

#[test]
fn codec_based_step_rejects_the_wrong_shape() {
    let set = chain();

    // Not a version 1 order at all.
    let err = resolver::apply(
        &"1".into(),
        &"2".into(),
        serde_json::json!({"id": "o-1"}),
        &set,
    )
    .unwrap_err();

    match err {
        verdoc_migrate::ResolveError::Step { from, to, source } => {
            assert_eq!(from, VersionTag::new("1"));
            assert_eq!(to, VersionTag::new("2"));
            assert!(matches!(source, MigrationError::InvalidPayload(_)));
        }
        other => panic!("expected Step, got {other:?}"),
    }
}
