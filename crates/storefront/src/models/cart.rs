//! Cart line types and quantity input rules.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use marketplus_core::{Price, ProductId, VariantId};

use crate::collection::Entity;
use crate::models::product::Product;

/// Identity of a cart line: product plus variant.
pub type CartLineKey = (ProductId, VariantId);

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    #[serde(
        rename = "variantId",
        default,
        deserialize_with = "deserialize_variant"
    )]
    pub variant_id: VariantId,
    #[serde(
        rename = "variantName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub variant_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub seller: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
    /// Stock level seen the last time this line was added to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartItem {
    /// Price of this line (unit price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

impl Entity for CartItem {
    type Key = CartLineKey;

    fn key(&self) -> CartLineKey {
        (self.id, self.variant_id)
    }
}

/// A product as handed to "add to cart".
///
/// `quantity` is the raw text from the quantity field, if any; see
/// [`parse_add_quantity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartProductInput {
    pub id: ProductId,
    #[serde(
        rename = "variantId",
        default,
        deserialize_with = "deserialize_variant"
    )]
    pub variant_id: VariantId,
    #[serde(rename = "variantName", default)]
    pub variant_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub seller: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub stock_quantity: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_raw_quantity")]
    pub quantity: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartProductInput {
    /// Set the raw quantity text.
    #[must_use]
    pub fn with_quantity(mut self, raw: impl Into<String>) -> Self {
        self.quantity = Some(raw.into());
        self
    }

    /// Select a variant.
    #[must_use]
    pub const fn with_variant(mut self, variant_id: VariantId) -> Self {
        self.variant_id = variant_id;
        self
    }

    pub(crate) fn into_line(self, quantity: u32) -> CartItem {
        CartItem {
            id: self.id,
            variant_id: self.variant_id,
            variant_name: self.variant_name,
            name: self.name,
            seller: self.seller,
            price: self.price,
            quantity,
            image: self.image.unwrap_or_default(),
            stock_quantity: self.stock_quantity,
            extra: self.extra,
        }
    }
}

impl From<&Product> for CartProductInput {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            variant_id: VariantId::NONE,
            variant_name: None,
            name: product.name.clone(),
            seller: product.seller.clone(),
            price: product.price,
            image: product
                .extra
                .get("image")
                .and_then(Value::as_str)
                .map(str::to_owned),
            stock_quantity: product.stock_quantity,
            quantity: None,
            extra: Map::new(),
        }
    }
}

/// Quantity to add for a raw quantity input.
///
/// Takes the leading integer of the trimmed text (`"3 adet"` → 3). Absent,
/// unparsable and non-positive inputs all mean 1. Values too large for a
/// `u32` become `u32::MAX` so that stock checks still see them.
#[must_use]
pub fn parse_add_quantity(raw: Option<&str>) -> u32 {
    raw.and_then(leading_integer)
        .filter(|&n| n > 0)
        .map_or(1, clamp_quantity)
}

/// Narrow a positive requested quantity, saturating at `u32::MAX`.
#[must_use]
pub fn clamp_quantity(n: i64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Requested quantity for an explicit quantity update.
///
/// Unlike [`parse_add_quantity`], non-positive values are kept so the caller
/// can treat them as removal. Unparsable input means 1.
#[must_use]
pub fn parse_update_quantity(raw: &str) -> i64 {
    leading_integer(raw).unwrap_or(1)
}

/// Parse an optional sign followed by digits at the start of `raw`.
///
/// Digit runs beyond the `i64` range saturate.
fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, s.get(1..)?),
        Some(b'+') => (false, s.get(1..)?),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = digits.get(..end).filter(|d| !d.is_empty())?;
    let value: i64 = digits.parse().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Missing, null, empty and zero variants all decode to [`VariantId::NONE`].
fn deserialize_variant<'de, D>(deserializer: D) -> Result<VariantId, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(VariantId::NONE),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(VariantId::NONE),
        Some(value) => VariantId::deserialize(value).map_err(serde::de::Error::custom),
    }
}

/// Quantities arrive as numbers or as form text; keep them as text.
fn deserialize_raw_quantity<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_add_quantity_defaults_to_one() {
        assert_eq!(parse_add_quantity(None), 1);
        assert_eq!(parse_add_quantity(Some("")), 1);
        assert_eq!(parse_add_quantity(Some("abc")), 1);
        assert_eq!(parse_add_quantity(Some("0")), 1);
        assert_eq!(parse_add_quantity(Some("-4")), 1);
        assert_eq!(parse_add_quantity(Some("3")), 3);
        assert_eq!(parse_add_quantity(Some(" 2 adet")), 2);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        assert_eq!(parse_add_quantity(Some("5000000000")), u32::MAX);
        assert_eq!(parse_add_quantity(Some("99999999999999999999999")), u32::MAX);
        assert_eq!(parse_update_quantity("99999999999999999999999"), i64::MAX);
        assert_eq!(parse_update_quantity("-99999999999999999999999"), -i64::MAX);
        assert_eq!(clamp_quantity(5_000_000_000), u32::MAX);
        assert_eq!(clamp_quantity(7), 7);
    }

    #[test]
    fn test_update_quantity_keeps_non_positive() {
        assert_eq!(parse_update_quantity("0"), 0);
        assert_eq!(parse_update_quantity("-2"), -2);
        assert_eq!(parse_update_quantity("5"), 5);
        assert_eq!(parse_update_quantity("x"), 1);
        assert_eq!(parse_update_quantity("-"), 1);
    }

    #[test]
    fn test_variant_normalization() {
        let absent: CartItem = serde_json::from_value(
            json!({"id": "5", "name": "Kulaklık", "price": 100, "quantity": 1}),
        )
        .unwrap();
        let null: CartItem = serde_json::from_value(
            json!({"id": 5, "variantId": null, "name": "Kulaklık", "price": 100, "quantity": 1}),
        )
        .unwrap();
        let text: CartItem = serde_json::from_value(
            json!({"id": 5, "variantId": "0", "name": "Kulaklık", "price": 100, "quantity": 1}),
        )
        .unwrap();

        assert_eq!(absent.key(), (ProductId::new(5), VariantId::NONE));
        assert_eq!(absent.key(), null.key());
        assert_eq!(absent.key(), text.key());
    }

    #[test]
    fn test_input_quantity_accepts_number_or_text() {
        let numeric: CartProductInput = serde_json::from_value(
            json!({"id": 1, "name": "Kalem", "price": 10, "quantity": 2}),
        )
        .unwrap();
        let text: CartProductInput = serde_json::from_value(
            json!({"id": 1, "name": "Kalem", "price": 10, "quantity": "2"}),
        )
        .unwrap();
        assert_eq!(numeric.quantity.as_deref(), Some("2"));
        assert_eq!(text.quantity.as_deref(), Some("2"));
    }

    #[test]
    fn test_line_total() {
        let line = CartProductInput {
            id: ProductId::new(1),
            variant_id: VariantId::NONE,
            variant_name: None,
            name: "Defter".to_string(),
            seller: String::new(),
            price: Price::from(45),
            image: None,
            stock_quantity: None,
            quantity: None,
            extra: Map::new(),
        }
        .into_line(3);
        assert_eq!(line.line_total(), Price::from(135));
        assert_eq!(line.image, "");
    }
}
