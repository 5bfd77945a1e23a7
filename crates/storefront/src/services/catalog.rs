//! Local product catalog.
//!
//! Sellers list products from the browser; the catalog lives entirely in the
//! `products` collection.
//!
//! # Id assignment
//!
//! A new product gets `max(existing ids) + 1`, or 1 for an empty catalog.
//! The highest id ever assigned is kept under its own key, so deleting the
//! newest product does not free its id either. Once `i32::MAX` has been
//! handed out, adding fails with [`StoreError::IdsExhausted`].

use std::sync::Arc;

use tracing::{info, instrument};

use marketplus_core::ProductId;

use crate::collection::{Collection, CorruptDataPolicy, Edit, Slot};
use crate::events::{Notifier, StateChange};
use crate::models::{NewProduct, Product, ProductPatch};
use crate::store::{KeyValueStore, StoreError, keys};

/// Demo products the first storefront build seeded into every browser.
const LEGACY_EXAMPLE_NAMES: &[&str] = &[
    "Kablosuz Kulaklık",
    "Akıllı Saat Seri 7",
    "Koşu Ayakkabısı",
    "Mekanik Klavye",
    "Laptop Pro X",
    "Akıllı Telefon 13",
    "4K Monitör",
    "Bluetooth Hoparlör",
    "Oyuncu Faresi",
    "USB-C Hub",
];

/// Product catalog service.
#[derive(Debug)]
pub struct ProductCatalog {
    products: Collection<Product>,
    last_id: Slot<i32>,
}

impl ProductCatalog {
    /// Create the catalog over `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Notifier,
        policy: CorruptDataPolicy,
    ) -> Self {
        Self {
            last_id: Slot::untracked(Arc::clone(&store), keys::PRODUCT_SEQUENCE, policy),
            products: Collection::new(
                store,
                keys::PRODUCTS,
                StateChange::Products,
                notifier,
                policy,
            ),
        }
    }

    /// All products, in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog cannot be read.
    pub fn products(&self) -> Result<Vec<Product>, StoreError> {
        self.products.load()
    }

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog cannot be read.
    pub fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.products.find(id)
    }

    /// Add a product, assigning its id and zeroing rating and review count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog cannot be read or written, or
    /// [`StoreError::IdsExhausted`] once `i32::MAX` has been assigned.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub fn add_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        let product = self.products.mutate(|items| {
            let last_assigned = match self.last_id.load() {
                Ok(last) => last.unwrap_or(0),
                Err(err) => return Edit::Discard(Err(err)),
            };
            let highest = items
                .iter()
                .map(|p| p.id.as_i32())
                .fold(last_assigned, i32::max);
            let Some(next) = highest.checked_add(1) else {
                return Edit::Discard(Err(StoreError::IdsExhausted {
                    key: keys::PRODUCTS.to_owned(),
                }));
            };
            if let Err(err) = self.last_id.save(&next) {
                return Edit::Discard(Err(err));
            }

            let product = new.into_product(ProductId::new(next));
            items.push(product.clone());
            Edit::Save(Ok(product))
        })??;

        info!(product_id = %product.id, "Product added");
        Ok(product)
    }

    /// Merge `patch` into the product with `id`.
    ///
    /// Returns the updated product, or `None` (and writes nothing) if no such
    /// product exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog cannot be read or written.
    #[instrument(skip(self, patch))]
    pub fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        self.products.mutate(|items| {
            match items.iter_mut().find(|p| p.id == id) {
                Some(product) => {
                    patch.apply(product);
                    Edit::Save(Some(product.clone()))
                }
                None => Edit::Discard(None),
            }
        })
    }

    /// Delete the product with `id`. Deleting a missing product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog cannot be read or written.
    #[instrument(skip(self))]
    pub fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        if self.products.remove(id)? {
            info!(product_id = %id, "Product deleted");
        }
        Ok(())
    }

    /// Products listed by `seller` (exact match).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog cannot be read.
    pub fn seller_products(&self, seller: &str) -> Result<Vec<Product>, StoreError> {
        self.products.query(|p| p.seller == seller)
    }

    /// Products in `category`, compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog cannot be read.
    pub fn products_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        let wanted = category.to_lowercase();
        self.products
            .query(|p| p.category.to_lowercase() == wanted)
    }

    /// Drop the demo products seeded by earlier storefront builds.
    ///
    /// Returns how many were removed; writes only when that is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog cannot be read or written.
    pub fn remove_legacy_examples(&self) -> Result<usize, StoreError> {
        let removed = self.products.mutate(|items| {
            let before = items.len();
            items.retain(|p| !LEGACY_EXAMPLE_NAMES.contains(&p.name.as_str()));
            match before - items.len() {
                0 => Edit::Discard(0),
                n => Edit::Save(n),
            }
        })?;

        if removed > 0 {
            info!(removed, "Removed legacy example products");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplus_core::Price;
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    fn catalog() -> (Arc<MemoryStore>, ProductCatalog) {
        let store = Arc::new(MemoryStore::new());
        let catalog = ProductCatalog::new(
            store.clone(),
            Notifier::default(),
            CorruptDataPolicy::Reset,
        );
        (store, catalog)
    }

    fn new_product(name: &str, category: &str, seller: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: category.to_string(),
            seller: seller.to_string(),
            price: Price::from(100),
            stock_quantity: Some(5),
            ..NewProduct::default()
        }
    }

    #[test]
    fn test_first_product_gets_id_one() {
        let (_, catalog) = catalog();
        let product = catalog
            .add_product(new_product("Masa", "Mobilya", "Ahşap Evi"))
            .unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert!(product.rating.abs() < f64::EPSILON);
        assert_eq!(product.reviews, 0);
    }

    #[test]
    fn test_ids_are_max_plus_one_after_deletions() {
        let (_, catalog) = catalog();
        for name in ["a", "b", "c"] {
            catalog.add_product(new_product(name, "x", "s")).unwrap();
        }
        catalog.delete_product(ProductId::new(2)).unwrap();

        let next = catalog.add_product(new_product("d", "x", "s")).unwrap();
        assert_eq!(next.id, ProductId::new(4));

        let ids: Vec<i32> = catalog
            .products()
            .unwrap()
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_deleted_highest_id_is_not_reused() {
        let (store, catalog) = catalog();
        catalog.add_product(new_product("a", "x", "s")).unwrap();
        let second = catalog.add_product(new_product("b", "x", "s")).unwrap();
        catalog.delete_product(second.id).unwrap();

        let third = catalog.add_product(new_product("c", "x", "s")).unwrap();
        assert_eq!(third.id, ProductId::new(3));
        assert!(store.get(keys::PRODUCT_SEQUENCE).unwrap().is_some());
    }

    #[test]
    fn test_legacy_catalog_without_sequence() {
        let (store, catalog) = catalog();
        store
            .set(keys::PRODUCTS, &json!([{"id": 8, "name": "Eski", "price": 5}]).to_string())
            .unwrap();
        let next = catalog.add_product(new_product("Yeni", "x", "s")).unwrap();
        assert_eq!(next.id, ProductId::new(9));
    }

    #[test]
    fn test_add_fails_when_ids_run_out() {
        let (store, catalog) = catalog();
        store
            .set(
                keys::PRODUCTS,
                &json!([{"id": i32::MAX, "name": "Son", "price": 5}]).to_string(),
            )
            .unwrap();

        let err = catalog.add_product(new_product("Fazla", "x", "s")).unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted { .. }));

        let ids: Vec<i32> = catalog
            .products()
            .unwrap()
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, vec![i32::MAX]);
    }

    #[test]
    fn test_add_emits_one_event() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Notifier::default();
        let catalog = ProductCatalog::new(store, notifier.clone(), CorruptDataPolicy::Reset);
        let mut events = notifier.subscribe();

        catalog.add_product(new_product("a", "x", "s")).unwrap();
        assert_eq!(events.try_recv().unwrap(), StateChange::Products);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_update_product() {
        let (_, catalog) = catalog();
        let product = catalog.add_product(new_product("Sandalye", "Mobilya", "s")).unwrap();

        let patch = ProductPatch {
            price: Some(Price::from(80)),
            ..ProductPatch::default()
        };
        let updated = catalog.update_product(product.id, patch).unwrap().unwrap();
        assert_eq!(updated.price, Price::from(80));
        assert_eq!(catalog.product(product.id).unwrap().unwrap().price, Price::from(80));

        let missing = catalog
            .update_product(ProductId::new(42), ProductPatch::default())
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let (_, catalog) = catalog();
        catalog.delete_product(ProductId::new(9)).unwrap();
        assert!(catalog.products().unwrap().is_empty());
    }

    #[test]
    fn test_queries() {
        let (_, catalog) = catalog();
        catalog.add_product(new_product("Kitap", "Kitap", "Okur")).unwrap();
        catalog.add_product(new_product("Roman", "KİTAP", "Okur")).unwrap();
        catalog.add_product(new_product("Kalem", "kırtasiye", "Yazar")).unwrap();

        assert_eq!(catalog.seller_products("Okur").unwrap().len(), 2);
        assert!(catalog.seller_products("okur").unwrap().is_empty());

        assert_eq!(catalog.products_by_category("KIRTASIYE").unwrap().len(), 0);
        assert_eq!(catalog.products_by_category("Kırtasiye").unwrap().len(), 1);
        assert_eq!(catalog.products_by_category("kitap").unwrap().len(), 1);
    }

    #[test]
    fn test_remove_legacy_examples() {
        let (store, catalog) = catalog();
        store
            .set(
                keys::PRODUCTS,
                &json!([
                    {"id": 1, "name": "Laptop Pro X", "price": 30000},
                    {"id": 2, "name": "El Yapımı Sabun", "price": 40},
                    {"id": 3, "name": "USB-C Hub", "price": 500}
                ])
                .to_string(),
            )
            .unwrap();

        assert_eq!(catalog.remove_legacy_examples().unwrap(), 2);
        let remaining = catalog.products().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "El Yapımı Sabun");

        assert_eq!(catalog.remove_legacy_examples().unwrap(), 0);
    }
}
