//! Versioned envelope around stored values.
//!
//! Every value is written as `{"version": N, "data": ...}`. Payloads written
//! by earlier storefront builds carry no envelope at all (a bare array or
//! object); those decode as version 0 and are re-wrapped on the next write.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StoreError;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u64 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T: ?Sized> {
    version: u64,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    version: u64,
    data: T,
}

/// Serialize `data` inside a current-version envelope.
///
/// # Errors
///
/// Returns [`StoreError::Encode`] if `data` cannot be represented as JSON.
pub fn encode<T: Serialize + ?Sized>(key: &str, data: &T) -> Result<String, StoreError> {
    serde_json::to_string(&EnvelopeRef {
        version: SCHEMA_VERSION,
        data,
    })
    .map_err(|source| StoreError::Encode {
        key: key.to_owned(),
        source,
    })
}

/// Decode a stored payload, accepting both enveloped and legacy bare values.
///
/// # Errors
///
/// - [`StoreError::UnsupportedVersion`] if the envelope is newer than [`SCHEMA_VERSION`]
/// - [`StoreError::Corrupt`] if the payload is not JSON or does not match `T`
pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StoreError> {
    let corrupt = |source| StoreError::Corrupt {
        key: key.to_owned(),
        source,
    };

    let value: Value = serde_json::from_str(raw).map_err(corrupt)?;

    let version = match &value {
        Value::Object(map) => map.get("version").map(Value::as_u64),
        _ => None,
    };

    match version {
        Some(Some(found)) if found > SCHEMA_VERSION => Err(StoreError::UnsupportedVersion {
            key: key.to_owned(),
            found,
            supported: SCHEMA_VERSION,
        }),
        Some(_) => serde_json::from_value::<Envelope<T>>(value)
            .map(|envelope| envelope.data)
            .map_err(corrupt),
        None => serde_json::from_value::<T>(value).map_err(corrupt),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wraps_in_envelope() {
        let raw = encode("cart", &[1, 2, 3]).unwrap();
        assert_eq!(raw, r#"{"version":1,"data":[1,2,3]}"#);
        let back: Vec<i32> = decode("cart", &raw).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_legacy_bare_array() {
        let items: Vec<i32> = decode("cart", "[4,5]").unwrap();
        assert_eq!(items, vec![4, 5]);
    }

    #[test]
    fn test_decode_rejects_newer_version() {
        let err = decode::<Vec<i32>>("cart", r#"{"version":2,"data":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedVersion {
                found: 2,
                supported: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_garbage_is_corrupt() {
        assert!(matches!(
            decode::<Vec<i32>>("cart", "{not json"),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            decode::<Vec<i32>>("cart", r#"{"version":1}"#),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            decode::<Vec<i32>>("cart", r#"{"version":"one","data":[]}"#),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
