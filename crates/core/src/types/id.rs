//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! IDs are numeric, but values persisted by older page scripts (or read from
//! form fields) may carry them as numeric text. Decoding accepts both forms
//! and normalizes to the integer, so `"5"` and `5` name the same entity.
//! Encoding always produces a JSON integer.

use core::fmt;

use serde::de::{self, Deserializer, Visitor};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize` as a plain integer, lenient `Deserialize` (integer or numeric string)
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`, `Default`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>`, `Into<i32>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use marketplus_core::define_id;
/// define_id!(ProductId);
/// define_id!(VariantId);
///
/// let product_id = ProductId::new(1);
/// let variant_id: VariantId = " 1 ".parse().unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = variant_id;
/// # let _ = (product_id, variant_id);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdParseError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                $crate::types::id::parse_numeric_id(s).map(Self)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::types::id::deserialize_numeric_id(deserializer).map(Self)
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(VariantId);

impl VariantId {
    /// The variant used when a product has no explicit variant.
    ///
    /// A missing variant and variant `0` are the same identity.
    pub const NONE: Self = Self(0);

    /// Returns true when this is the implicit default variant.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// Error returned when text does not hold a numeric ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("not a numeric id: {input:?}")]
pub struct IdParseError {
    /// The rejected input.
    pub input: String,
}

/// Parse trimmed decimal text into an ID value.
///
/// # Errors
///
/// Returns [`IdParseError`] if the trimmed text is not a valid `i32`.
#[doc(hidden)]
pub fn parse_numeric_id(s: &str) -> Result<i32, IdParseError> {
    s.trim().parse::<i32>().map_err(|_| IdParseError {
        input: s.to_owned(),
    })
}

/// Deserialize an ID from a JSON integer, an integral float, or numeric text.
///
/// # Errors
///
/// Returns the deserializer's error for any other value or for out-of-range numbers.
#[doc(hidden)]
pub fn deserialize_numeric_id<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(NumericIdVisitor)
}

struct NumericIdVisitor;

impl Visitor<'_> for NumericIdVisitor {
    type Value = i32;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer id or a string holding one")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i32, E> {
        i32::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i32, E> {
        i32::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i32, E> {
        let truncated = v.trunc();
        if truncated == v && truncated >= f64::from(i32::MIN) && truncated <= f64::from(i32::MAX)
        {
            Ok(truncated as i32)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i32, E> {
        parse_numeric_id(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_integer() {
        let id: ProductId = serde_json::from_str("5").unwrap();
        assert_eq!(id, ProductId::new(5));
    }

    #[test]
    fn test_deserialize_numeric_text() {
        let id: ProductId = serde_json::from_str("\" 12 \"").unwrap();
        assert_eq!(id, ProductId::new(12));
    }

    #[test]
    fn test_deserialize_integral_float() {
        let id: VariantId = serde_json::from_str("3.0").unwrap();
        assert_eq!(id, VariantId::new(3));
        assert!(serde_json::from_str::<VariantId>("3.5").is_err());
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<ProductId>("\"abc\"").is_err());
        assert!(serde_json::from_str::<ProductId>("true").is_err());
        assert!(serde_json::from_str::<ProductId>("4294967296").is_err());
    }

    #[test]
    fn test_serialize_is_integer() {
        assert_eq!(serde_json::to_string(&ProductId::new(7)).unwrap(), "7");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("42".parse::<ProductId>().unwrap(), ProductId::new(42));
        let err = "4x".parse::<ProductId>().unwrap_err();
        assert_eq!(err.input, "4x");
    }

    #[test]
    fn test_variant_none_is_zero() {
        assert_eq!(VariantId::NONE, VariantId::default());
        assert!(VariantId::new(0).is_none());
        assert!(!VariantId::new(2).is_none());
    }
}
