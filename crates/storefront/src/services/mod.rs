//! Storefront services.
//!
//! # Services
//!
//! - [`catalog`] - Local product catalog (seller listings)
//! - [`cart`] - Shopping cart with stock checks
//! - [`favorites`] - Favorites set
//! - [`auth`] - Session slot backed by the remote auth API
//!
//! The three collection services are thin wrappers around
//! [`Collection`](crate::collection::Collection); each method is one
//! read-modify-write cycle.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod favorites;

pub use auth::{AuthApi, AuthError, HttpAuthApi, SessionManager};
pub use cart::{CartAddOutcome, CartService, QuantityUpdate, StockWarning};
pub use catalog::ProductCatalog;
pub use favorites::{FavoriteAdd, FavoritesService, ToggleOutcome};
