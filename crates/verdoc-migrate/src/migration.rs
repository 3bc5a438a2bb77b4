use alloc::string::{String, ToString};
use core::fmt;

use verdoc::{CodecError, Value, VersionTag};

/// A single schema-migration step that transforms a payload from one version
/// to another.
///
/// Steps must be **pure**: no clocks, no I/O, no external state — the same
/// input always produces the same output. Two readers migrating the same
/// stored payload must end up with identical results, and a bulk rewrite
/// must be safe to re-run after a crash.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use verdoc::VersionTag;
/// use verdoc_migrate::{Migration, MigrationError};
///
/// struct AddUnit;
///
/// impl Migration for AddUnit {
///     fn applies_to(&self) -> VersionTag {
///         "1".into()
///     }
///     fn target_version(&self) -> VersionTag {
///         "2".into()
///     }
///     fn migrate(&self, mut payload: Value) -> Result<Value, MigrationError> {
///         let obj = payload
///             .as_object_mut()
///             .ok_or_else(|| MigrationError::InvalidPayload("not an object".into()))?;
///         obj.insert("unit".into(), json!("celsius"));
///         Ok(payload)
///     }
/// }
/// ```
pub trait Migration: Send + Sync {
    /// The version this step reads.
    fn applies_to(&self) -> VersionTag;

    /// The version this step produces.
    fn target_version(&self) -> VersionTag;

    /// Transform a payload encoded as [`applies_to`](Self::applies_to) into
    /// [`target_version`](Self::target_version) form.
    ///
    /// Must not fabricate data: a payload missing a required source field
    /// fails with [`MigrationError::MissingField`] instead of producing a
    /// partially populated result.
    fn migrate(&self, payload: Value) -> Result<Value, MigrationError>;
}

/// A migration step could not interpret its input.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationError {
    /// A field required by the step is absent from the source payload.
    MissingField {
        /// The absent field.
        field: String,
    },
    /// The payload is not a valid encoding of the step's source version.
    InvalidPayload(String),
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => {
                write!(f, "source payload is missing required field {field:?}")
            }
            Self::InvalidPayload(reason) => write!(f, "invalid source payload: {reason}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MigrationError {}

impl From<CodecError> for MigrationError {
    fn from(e: CodecError) -> Self {
        Self::InvalidPayload(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdoc::JsonCodec;

    #[test]
    fn display_names_the_missing_field() {
        let err = MigrationError::MissingField {
            field: "data1".into(),
        };
        assert_eq!(
            alloc::format!("{err}"),
            "source payload is missing required field \"data1\""
        );
    }

    #[test]
    fn codec_errors_convert_to_invalid_payload() {
        let codec = JsonCodec::new();
        let err = codec
            .decode::<u32>(serde_json::json!("not a number"))
            .unwrap_err();
        let migration_err: MigrationError = err.into();
        assert!(matches!(migration_err, MigrationError::InvalidPayload(_)));
    }
}
