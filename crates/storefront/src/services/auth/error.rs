//! Authentication error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] marketplus_core::EmailError),

    /// Login was attempted without an email or username.
    #[error("Please provide both username/email and password")]
    MissingCredentials,

    /// The auth API answered with a non-success status. Holds the response
    /// body verbatim (a JSON string when the body was not JSON).
    #[error("auth API rejected the request: {0}")]
    Rejected(serde_json::Value),

    /// The auth API could not be reached.
    #[error("Network error or server down")]
    Unreachable,

    /// A successful login response did not contain a usable user.
    #[error("malformed auth API response: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A profile edit produced an invalid user record.
    #[error("invalid profile update: {0}")]
    InvalidProfile(#[source] serde_json::Error),

    /// Profile edits need a logged-in user.
    #[error("User not logged in")]
    NotLoggedIn,

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Session slot storage error.
    #[error("session storage error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// The server-provided error body, if the API rejected the request.
    #[must_use]
    pub const fn rejection(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Rejected(body) => Some(body),
            _ => None,
        }
    }
}
