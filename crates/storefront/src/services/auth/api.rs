//! Remote auth API.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, error};
use url::Url;

use super::AuthError;
use crate::config::AuthApiConfig;
use crate::models::{Registration, SessionUser};

/// The three calls the storefront makes to the auth backend.
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for the user record. `identity` is an email
    /// address or a username.
    fn login(
        &self,
        identity: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<SessionUser, AuthError>> + Send;

    /// Create an account. The response body is ignored.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Tell the backend the session ended.
    fn logout(&self) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// [`AuthApi`] over HTTP.
///
/// Endpoints are `POST {base}/login/`, `{base}/register/` and
/// `{base}/logout/`, all with JSON bodies.
#[derive(Clone)]
pub struct HttpAuthApi {
    inner: Arc<HttpAuthApiInner>,
}

struct HttpAuthApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpAuthApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthApi")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpAuthApi {
    /// Create a client for the API at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &AuthApiConfig) -> Result<Self, AuthError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(AuthError::Client)?;

        Ok(Self {
            inner: Arc::new(HttpAuthApiInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, name: &str) -> String {
        format!(
            "{}/{name}/",
            self.inner.base_url.as_str().trim_end_matches('/')
        )
    }

    /// POST `body` and return the response text of a 2xx answer.
    async fn post(&self, name: &str, body: &Value) -> Result<String, AuthError> {
        let url = self.endpoint(name);
        debug!(url = %url, "Calling auth API");

        let response = self
            .inner
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Auth API request failed");
                AuthError::Unreachable
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to read auth API response");
            AuthError::Unreachable
        })?;

        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Auth API rejected request");
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(AuthError::Rejected(body));
        }

        Ok(text)
    }
}

impl AuthApi for HttpAuthApi {
    async fn login(&self, identity: &str, password: &SecretString) -> Result<SessionUser, AuthError> {
        let body = json!({
            "email": identity,
            "username": identity,
            "password": password.expose_secret(),
        });
        let text = self.post("login", &body).await?;
        serde_json::from_str(&text).map_err(AuthError::Malformed)
    }

    async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        self.post("register", &registration.to_body()).await?;
        Ok(())
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.post("logout", &json!({})).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpAuthApi {
        HttpAuthApi::new(&AuthApiConfig {
            base_url: Url::parse(base).unwrap(),
            timeout: None,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_with_trailing_slash() {
        assert_eq!(
            api("http://127.0.0.1:8000/api/auth").endpoint("login"),
            "http://127.0.0.1:8000/api/auth/login/"
        );
        assert_eq!(
            api("http://127.0.0.1:8000/api/auth/").endpoint("logout"),
            "http://127.0.0.1:8000/api/auth/logout/"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let api = api("http://127.0.0.1:9/api/auth");
        let err = api.logout().await.unwrap_err();
        assert!(matches!(err, AuthError::Unreachable));
        assert_eq!(err.to_string(), "Network error or server down");
    }
}
