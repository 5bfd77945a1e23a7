//! Catalog product types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use marketplus_core::{Price, ProductId};

use crate::collection::Entity;

/// A product listed in the local catalog.
///
/// Fields the storefront does not interpret (descriptions, image galleries,
/// specs) are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub seller: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Product {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.id
    }
}

/// Input for creating a product; the catalog assigns id, rating and reviews.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub seller: String,
    pub price: Price,
    #[serde(default)]
    pub stock_quantity: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewProduct {
    /// Build the stored product with a freshly assigned id.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            category: self.category,
            seller: self.seller,
            price: self.price,
            stock_quantity: self.stock_quantity,
            rating: 0.0,
            reviews: 0,
            extra: self.extra,
        }
    }
}

/// Partial product update. Unset fields are left alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub stock_quantity: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductPatch {
    /// Merge this patch into `product`. The id never changes.
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(seller) = self.seller {
            product.seller = seller;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock_quantity {
            product.stock_quantity = Some(stock);
        }
        if let Some(rating) = self.rating {
            product.rating = rating;
        }
        if let Some(reviews) = self.reviews {
            product.reviews = reviews;
        }
        // `id` is the identity key; a patch cannot move a product.
        product
            .extra
            .extend(self.extra.into_iter().filter(|(k, _)| k != "id"));
    }
}
