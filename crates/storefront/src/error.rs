//! Top-level error type.
//!
//! Each layer has its own error enum; [`Error`] gathers them for callers that
//! drive the whole storefront (the CLI, integration tests).

use thiserror::Error;

use crate::config::ConfigError;
use crate::services::auth::AuthError;
use crate::store::StoreError;

/// Storefront error.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Result type alias using the storefront [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
