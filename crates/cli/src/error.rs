//! CLI error type.

use thiserror::Error;

use marketplus_core::ProductId;
use marketplus_storefront::services::AuthError;
use marketplus_storefront::store::StoreError;

/// Errors reported by `mp-cli` commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storefront(#[from] marketplus_storefront::Error),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Invalid field assignment {0:?}, expected key=value")]
    InvalidAssignment(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
