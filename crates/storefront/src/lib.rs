//! MarketPlus storefront library.
//!
//! Client-side state for the MarketPlus marketplace: a seller-managed product
//! catalog, the shopping cart, favorites and the logged-in session. All state
//! lives in a [`KeyValueStore`](store::KeyValueStore); only login, register
//! and logout talk to the network.
//!
//! Start from [`Storefront`], which wires every service to one store and one
//! change notifier.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod collection;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

pub use error::{Error, Result};
pub use state::Storefront;
