//! Storefront state shared by every screen of one session.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::events::{Notifier, StateChange};
use crate::services::{
    AuthApi, CartService, FavoritesService, HttpAuthApi, ProductCatalog, SessionManager,
};
use crate::store::{FileStore, KeyValueStore};

/// The storefront: catalog, cart, favorites and session over one store.
///
/// This struct is cheaply cloneable via `Arc`. Build it once and hand clones
/// to whatever needs it.
pub struct Storefront<A = HttpAuthApi> {
    inner: Arc<StorefrontInner<A>>,
}

struct StorefrontInner<A> {
    config: StorefrontConfig,
    store: Arc<dyn KeyValueStore>,
    notifier: Notifier,
    catalog: ProductCatalog,
    cart: CartService,
    favorites: FavoritesService,
    session: SessionManager<A>,
}

impl<A> Clone for Storefront<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> std::fmt::Debug for Storefront<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Storefront<HttpAuthApi> {
    /// Open the storefront described by `config`: a file store in
    /// `config.data_dir` and the HTTP auth API at `config.auth_api`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created, the HTTP
    /// client cannot be built or the catalog cannot be read.
    pub fn open(config: StorefrontConfig) -> Result<Self> {
        let store = FileStore::open(&config.data_dir)?;
        let api = HttpAuthApi::new(&config.auth_api)?;
        Self::new(config, Arc::new(store), api)
    }
}

impl<A: AuthApi> Storefront<A> {
    /// Assemble the storefront over `store` and `api`.
    ///
    /// Removes demo products left behind by earlier builds.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or written.
    pub fn new(config: StorefrontConfig, store: Arc<dyn KeyValueStore>, api: A) -> Result<Self> {
        let notifier = Notifier::new(config.event_capacity);
        let policy = config.corrupt_data;

        let catalog = ProductCatalog::new(Arc::clone(&store), notifier.clone(), policy);
        catalog.remove_legacy_examples()?;

        let cart = CartService::new(Arc::clone(&store), notifier.clone(), policy);
        let favorites = FavoritesService::new(Arc::clone(&store), notifier.clone(), policy);
        let session = SessionManager::new(api, Arc::clone(&store), notifier.clone(), policy);

        info!(policy = ?policy, "Storefront ready");

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                store,
                notifier,
                catalog,
                cart,
                favorites,
                session,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the underlying key-value store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.store
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the cart.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    /// Get a reference to the favorites set.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesService {
        &self.inner.favorites
    }

    /// Get a reference to the session manager.
    #[must_use]
    pub fn session(&self) -> &SessionManager<A> {
        &self.inner.session
    }

    /// Subscribe to state changes from every service.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.inner.notifier.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use marketplus_core::{Price, ProductId};

    use super::*;
    use crate::config::AuthApiConfig;
    use crate::models::{CartProductInput, FavoriteInput, NewProduct};
    use crate::services::CartAddOutcome;
    use crate::store::{MemoryStore, keys};

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            auth_api: AuthApiConfig {
                base_url: url::Url::parse("http://127.0.0.1:9/api/auth").unwrap(),
                timeout: None,
            },
            data_dir: std::path::PathBuf::from("unused"),
            corrupt_data: crate::collection::CorruptDataPolicy::Reset,
            event_capacity: 16,
            sentry_dsn: None,
        }
    }

    fn storefront(store: Arc<MemoryStore>) -> Storefront {
        let api = HttpAuthApi::new(&config().auth_api).unwrap();
        Storefront::new(config(), store, api).unwrap()
    }

    #[test]
    fn test_new_removes_legacy_examples() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                keys::PRODUCTS,
                &json!([
                    {"id": 1, "name": "Mekanik Klavye", "price": 1500},
                    {"id": 2, "name": "Örgü Bere", "price": 120}
                ])
                .to_string(),
            )
            .unwrap();

        let storefront = storefront(store);
        let names: Vec<String> = storefront
            .catalog()
            .products()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Örgü Bere".to_string()]);
    }

    #[test]
    fn test_services_share_one_notifier() {
        let storefront = storefront(Arc::new(MemoryStore::new()));
        let mut events = storefront.subscribe();

        let product = storefront
            .catalog()
            .add_product(NewProduct {
                name: "Seramik Kupa".to_string(),
                category: "Ev".to_string(),
                seller: "Atölye".to_string(),
                price: Price::from(90),
                stock_quantity: Some(3),
                ..NewProduct::default()
            })
            .unwrap();

        let outcome = storefront
            .cart()
            .add_item(CartProductInput::from(&product))
            .unwrap();
        assert!(matches!(outcome, CartAddOutcome::Added(_)));

        storefront
            .favorites()
            .add_item(FavoriteInput::from(&product))
            .unwrap();

        assert_eq!(events.try_recv().unwrap(), StateChange::Products);
        assert_eq!(events.try_recv().unwrap(), StateChange::Cart);
        assert_eq!(events.try_recv().unwrap(), StateChange::Favorites);
        assert!(events.try_recv().is_err());

        let clone = storefront.clone();
        assert!(clone.favorites().contains(ProductId::new(1)).unwrap());
        assert_eq!(clone.cart().total().unwrap(), Price::from(90));
    }
}
