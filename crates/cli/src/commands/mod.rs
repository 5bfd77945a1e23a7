//! Command implementations.
//!
//! Every command writes its human-readable output to the supplied writer.

pub mod auth;
pub mod cart;
pub mod favorites;
pub mod products;
