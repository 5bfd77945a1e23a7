//! Domain models for the storefront.
//!
//! Each collection entity implements [`Entity`](crate::collection::Entity)
//! with its identity key:
//!
//! | model | key |
//! |---|---|
//! | [`Product`] | `ProductId` |
//! | [`CartItem`] | `(ProductId, VariantId)` |
//! | [`FavoriteItem`] | `ProductId` |
//!
//! [`SessionUser`] is not a collection; it fills the single session slot.

pub mod cart;
pub mod favorite;
pub mod product;
pub mod user;

pub use cart::{CartItem, CartLineKey, CartProductInput, clamp_quantity, parse_add_quantity, parse_update_quantity};
pub use favorite::{FavoriteInput, FavoriteItem};
pub use product::{NewProduct, Product, ProductPatch};
pub use user::{Registration, SessionUser};
