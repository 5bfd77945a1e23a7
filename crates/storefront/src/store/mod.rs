//! Key-value storage adapter.
//!
//! The storefront keeps all of its client-side state in a flat string store,
//! one JSON document per key (the role the browser's local storage plays for
//! the web pages). Reading a key that was never written yields `None`, never
//! an error.
//!
//! # Implementations
//!
//! - [`MemoryStore`] - process-local map, for tests and throwaway sessions
//! - [`FileStore`] - one file per key inside a profile directory
//!
//! Values are wrapped in a versioned envelope by the [`envelope`] module
//! before they reach the store.

pub mod envelope;
mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Storage keys used by the storefront.
pub mod keys {
    /// Product catalog collection.
    pub const PRODUCTS: &str = "products";

    /// Shopping cart collection.
    pub const CART: &str = "cart";

    /// Favorites collection.
    pub const FAVORITES: &str = "favorites";

    /// Session slot holding the logged-in user.
    pub const USER: &str = "user";

    /// Highest product id ever assigned.
    pub const PRODUCT_SEQUENCE: &str = "product_sequence";

    /// Key under which an unreadable payload is preserved before a reset.
    #[must_use]
    pub fn quarantine(key: &str) -> String {
        format!("{key}.corrupt")
    }
}

/// Errors raised by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed.
    #[error("storage I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The key contains characters the backend cannot address.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// A value could not be serialized.
    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored payload is not valid for its schema.
    #[error("stored value under {key} is malformed: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored payload was written by a newer schema.
    #[error("stored value under {key} has schema version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        key: String,
        found: u64,
        supported: u64,
    },

    /// Every id a collection can hand out has been used.
    #[error("no ids left to assign under {key}")]
    IdsExhausted { key: String },
}

/// A persistent string store addressed by key.
///
/// Each `set` replaces the whole value in one step; there are no partial
/// writes and no cross-key transactions.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, or `None` if it was never set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete the value under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
