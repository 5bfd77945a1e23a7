//! Favorites set.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use marketplus_core::ProductId;

use crate::collection::{Collection, CorruptDataPolicy, Edit};
use crate::events::{Notifier, StateChange};
use crate::models::{FavoriteInput, FavoriteItem};
use crate::store::{KeyValueStore, StoreError, keys};

/// Result of [`FavoritesService::add_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteAdd {
    Added(FavoriteItem),
    /// The product was already a favorite; nothing was written.
    AlreadyPresent,
}

/// Result of [`FavoritesService::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// True if the product is now a favorite.
    pub added: bool,
    /// Text for the shopper.
    pub message: &'static str,
}

/// Favorites service. At most one entry per product.
#[derive(Debug)]
pub struct FavoritesService {
    entries: Collection<FavoriteItem>,
}

impl FavoritesService {
    /// Create the favorites set over `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Notifier,
        policy: CorruptDataPolicy,
    ) -> Self {
        Self {
            entries: Collection::new(
                store,
                keys::FAVORITES,
                StateChange::Favorites,
                notifier,
                policy,
            ),
        }
    }

    /// All favorites, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the set cannot be read.
    pub fn items(&self) -> Result<Vec<FavoriteItem>, StoreError> {
        self.entries.load()
    }

    /// Number of favorites.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the set cannot be read.
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.items()?.len())
    }

    /// Whether `id` is a favorite.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the set cannot be read.
    pub fn contains(&self, id: ProductId) -> Result<bool, StoreError> {
        Ok(self.entries.find(id)?.is_some())
    }

    /// Add a product, stamping it with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the set cannot be read or written.
    #[instrument(skip(self, input), fields(product_id = %input.id))]
    pub fn add_item(&self, input: FavoriteInput) -> Result<FavoriteAdd, StoreError> {
        self.entries.mutate(|entries| {
            if entries.iter().any(|entry| entry.id == input.id) {
                debug!("Already a favorite");
                return Edit::Discard(FavoriteAdd::AlreadyPresent);
            }
            let item = input.into_item(Utc::now());
            entries.push(item.clone());
            Edit::Save(FavoriteAdd::Added(item))
        })
    }

    /// Remove a product. Removing a non-favorite is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the set cannot be read or written.
    #[instrument(skip(self))]
    pub fn remove_item(&self, id: ProductId) -> Result<(), StoreError> {
        self.entries.remove(id)?;
        Ok(())
    }

    /// Remove the product if it is a favorite, add it otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the set cannot be read or written.
    pub fn toggle(&self, input: FavoriteInput) -> Result<ToggleOutcome, StoreError> {
        if self.contains(input.id)? {
            self.remove_item(input.id)?;
            Ok(ToggleOutcome {
                added: false,
                message: "Favorilerden çıkarıldı",
            })
        } else {
            self.add_item(input)?;
            Ok(ToggleOutcome {
                added: true,
                message: "Favorilere eklendi",
            })
        }
    }
}
