use alloc::string::{String, ToString};
use core::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Converts typed payloads to and from their structured JSON form.
///
/// One codec is constructed at process start and shared (by reference or
/// clone) with every adapter that needs it. It holds no per-call state, so it
/// is safe to use from multiple threads without coordination.
///
/// Decoding tolerates unknown fields: a payload carrying fields the target
/// shape does not declare still decodes, which is what makes reads possible
/// right after a migration added data the reader does not know about yet.
/// Missing required fields and type mismatches fail with
/// [`CodecError::Decode`].
///
/// # Example
///
/// ```
/// use serde::{Serialize, Deserialize};
/// use verdoc::JsonCodec;
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Reading { celsius: f64 }
///
/// let codec = JsonCodec::new();
/// let value = codec.encode(&Reading { celsius: 21.0 }).unwrap();
/// let back: Reading = codec.decode(value).unwrap();
/// assert_eq!(back, Reading { celsius: 21.0 });
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    _priv: (),
}

impl JsonCodec {
    /// Create a codec. The serialization context is fixed here, once, and
    /// never changed per call.
    pub fn new() -> Self {
        Self { _priv: () }
    }

    /// Encode a typed payload into its structured form.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Value, CodecError> {
        serde_json::to_value(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Decode a structured payload into `T`.
    ///
    /// Unknown fields are ignored; a missing required field or a type
    /// mismatch fails with [`CodecError::Decode`] naming the target type.
    pub fn decode<T: DeserializeOwned>(&self, value: Value) -> Result<T, CodecError> {
        serde_json::from_value(value).map_err(|e| CodecError::Decode {
            target: core::any::type_name::<T>(),
            reason: e.to_string(),
        })
    }
}

/// Error converting between a typed payload and its structured form.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// The typed value could not be represented as a JSON tree.
    Encode(String),
    /// The structured form does not satisfy the target shape.
    Decode {
        /// Name of the type that was being decoded.
        target: &'static str,
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(reason) => write!(f, "cannot encode payload: {reason}"),
            Self::Decode { target, reason } => {
                write!(f, "cannot decode payload as {target}: {reason}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        id: String,
        count: u32,
    }

    #[test]
    fn round_trip() {
        let codec = JsonCodec::new();
        let payload = Payload {
            id: "p-1".into(),
            count: 3,
        };
        let value = codec.encode(&payload).unwrap();
        let back: Payload = codec.decode(value).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let codec = JsonCodec::new();
        let value = json!({"id": "p-1", "count": 3, "added_later": true});
        let back: Payload = codec.decode(value).unwrap();
        assert_eq!(
            back,
            Payload {
                id: "p-1".into(),
                count: 3
            }
        );
    }

    #[test]
    fn missing_field_fails_with_target_type() {
        let codec = JsonCodec::new();
        let err = codec.decode::<Payload>(json!({"id": "p-1"})).unwrap_err();
        match err {
            CodecError::Decode { target, reason } => {
                assert!(target.contains("Payload"));
                assert!(reason.contains("count"));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn type_mismatch_fails() {
        let codec = JsonCodec::new();
        let err = codec
            .decode::<Payload>(json!({"id": "p-1", "count": "three"}))
            .unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn codec_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<JsonCodec>();
    }
}
