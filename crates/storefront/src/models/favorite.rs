//! Favorite (wish list) entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use marketplus_core::{Price, ProductId};

use crate::collection::Entity;
use crate::models::product::Product;

/// A product the shopper marked as favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub seller: String,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

impl Entity for FavoriteItem {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.id
    }
}

/// The product fields copied into a new favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteInput {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl FavoriteInput {
    pub(crate) fn into_item(self, added_at: DateTime<Utc>) -> FavoriteItem {
        FavoriteItem {
            id: self.id,
            name: self.name,
            price: self.price,
            seller: self.seller.unwrap_or_default(),
            image: self.image.unwrap_or_default(),
            added_at,
        }
    }
}

impl From<&Product> for FavoriteInput {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            seller: Some(product.seller.clone()),
            image: product
                .extra
                .get("image")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_added_at_is_rfc3339() {
        let item = FavoriteInput {
            id: ProductId::new(2),
            name: "Saat".to_string(),
            price: Price::from(900),
            seller: None,
            image: None,
        }
        .into_item("2026-03-01T10:00:00Z".parse().unwrap());

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["addedAt"], json!("2026-03-01T10:00:00Z"));
        assert_eq!(value["seller"], json!(""));
    }

    #[test]
    fn test_decode_legacy_entry() {
        let item: FavoriteItem = serde_json::from_value(json!({
            "id": "11",
            "name": "Çanta",
            "price": 450.5,
            "seller": "Deri Dünyası",
            "image": "",
            "addedAt": "2025-11-20T08:15:30.123Z"
        }))
        .unwrap();
        assert_eq!(item.key(), ProductId::new(11));
    }
}
