//! Session management.
//!
//! The auth backend owns accounts and credentials; the storefront only
//! caches the user record it returns in the session slot.

mod api;
mod error;

pub use api::{AuthApi, HttpAuthApi};
pub use error::AuthError;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use marketplus_core::Email;

use crate::collection::{CorruptDataPolicy, Slot};
use crate::events::{Notifier, StateChange};
use crate::models::{Registration, SessionUser};
use crate::store::{KeyValueStore, StoreError, keys};

/// Session manager.
///
/// Handles login, registration, logout and local profile edits.
#[derive(Debug)]
pub struct SessionManager<A> {
    api: A,
    user: Slot<SessionUser>,
}

impl<A: AuthApi> SessionManager<A> {
    /// Create a session manager over `store`, talking to `api`.
    #[must_use]
    pub fn new(
        api: A,
        store: Arc<dyn KeyValueStore>,
        notifier: Notifier,
        policy: CorruptDataPolicy,
    ) -> Self {
        Self {
            api,
            user: Slot::new(store, keys::USER, StateChange::Session, notifier, policy),
        }
    }

    /// The auth API this manager talks to.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Log in and cache the returned user.
    ///
    /// `identity` is a username or an email address; anything containing `@`
    /// must be a well-formed email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if the identity or password is
    /// blank, and `AuthError::InvalidEmail` if an email-looking identity is
    /// malformed. Neither reaches the API.
    /// Returns `AuthError::Rejected` with the server's error body if the
    /// credentials are refused.
    /// Returns `AuthError::Unreachable` if the API cannot be reached.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        identity: &str,
        password: &SecretString,
    ) -> Result<SessionUser, AuthError> {
        let identity = identity.trim();
        if identity.is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if identity.contains('@') {
            Email::parse(identity)?;
        }

        let user = self
            .api
            .login(identity, password)
            .await
            .inspect_err(|e| warn!(error = %e, "Login failed"))?;

        self.user.save(&user)?;
        info!(email = %user.email, "Logged in");
        Ok(user)
    }

    /// Create an account. Does not log the new user in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rejected` with the server's error body if the
    /// registration is refused, or `AuthError::Unreachable` if the API cannot
    /// be reached.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        self.api
            .register(registration)
            .await
            .inspect_err(|e| warn!(error = %e, "Registration failed"))?;

        info!("Registered");
        Ok(())
    }

    /// Clear the local session, then tell the API.
    ///
    /// The local session is gone even if the API call fails; that failure is
    /// only logged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the session slot cannot be cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.user.clear()?;
        info!("Logged out");

        if let Err(e) = self.api.logout().await {
            debug!(error = %e, "Auth API logout failed");
        }
        Ok(())
    }

    /// The cached user, if logged in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the session slot cannot be read.
    pub fn current_user(&self) -> Result<Option<SessionUser>, StoreError> {
        self.user.load()
    }

    /// Whether a user is cached.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the session slot cannot be read.
    pub fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.current_user()?.is_some())
    }

    /// Merge `patch` into the cached user. Local only; the next login
    /// replaces the record with the server's copy.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` if no user is cached, or
    /// `AuthError::InvalidProfile` if the merged record is not a valid user.
    #[instrument(skip(self, patch))]
    pub fn update_profile(&self, patch: Map<String, Value>) -> Result<SessionUser, AuthError> {
        let current = self.current_user()?.ok_or(AuthError::NotLoggedIn)?;
        let updated = current.merged(patch).map_err(AuthError::InvalidProfile)?;
        self.user.save(&updated)?;
        info!("Profile updated");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use marketplus_core::Role;
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    /// Canned API: logs in any password except "wrong".
    #[derive(Default)]
    struct FakeApi {
        offline: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeApi {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AuthApi for FakeApi {
        async fn login(&self, identity: &str, password: &SecretString) -> Result<SessionUser, AuthError> {
            self.record("login");
            if self.offline {
                return Err(AuthError::Unreachable);
            }
            if password.expose_secret() == "wrong" {
                return Err(AuthError::Rejected(
                    json!({"non_field_errors": ["Unable to log in with provided credentials."]}),
                ));
            }
            let email = if identity.contains('@') {
                identity
            } else {
                "elif@example.com"
            };
            Ok(serde_json::from_value(json!({
                "id": 12,
                "email": email,
                "first_name": "Elif",
                "last_name": "Demir",
                "role": "BUYER"
            }))
            .unwrap())
        }

        async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
            self.record("register");
            if registration.email.as_str() == "taken@example.com" {
                return Err(AuthError::Rejected(
                    json!({"email": ["user with this email already exists."]}),
                ));
            }
            Ok(())
        }

        async fn logout(&self) -> Result<(), AuthError> {
            self.record("logout");
            if self.offline {
                return Err(AuthError::Unreachable);
            }
            Ok(())
        }
    }

    fn new_manager(api: FakeApi) -> (Notifier, SessionManager<FakeApi>) {
        let notifier = Notifier::default();
        let manager = SessionManager::new(
            api,
            Arc::new(MemoryStore::new()),
            notifier.clone(),
            CorruptDataPolicy::Reset,
        );
        (notifier, manager)
    }

    fn password(value: &str) -> SecretString {
        SecretString::from(value)
    }

    #[tokio::test]
    async fn test_login_caches_user_and_notifies() {
        let (notifier, manager) = new_manager(FakeApi::default());
        let mut events = notifier.subscribe();

        let user = manager
            .login(" elif@example.com ", &password("parola"))
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "elif@example.com");
        assert_eq!(user.extra.get("id"), Some(&json!(12)));

        assert!(manager.is_authenticated().unwrap());
        assert_eq!(manager.current_user().unwrap(), Some(user));
        assert_eq!(events.try_recv().unwrap(), StateChange::Session);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_email_without_calling_api() {
        let (_, manager) = new_manager(FakeApi::default());
        let err = manager.login("elif@", &password("x")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));

        let err = manager.login("   ", &password("x")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));

        let err = manager.login("elif", &password("")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
        assert!(manager.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_with_username() {
        let (_, manager) = new_manager(FakeApi::default());
        let user = manager.login(" elif ", &password("parola")).await.unwrap();
        assert_eq!(user.email.as_str(), "elif@example.com");
        assert!(manager.is_authenticated().unwrap());
        assert_eq!(manager.api().calls(), vec!["login"]);
    }

    #[tokio::test]
    async fn test_login_failure_keeps_session_empty() {
        let (_, manager) = new_manager(FakeApi::default());
        let err = manager
            .login("elif@example.com", &password("wrong"))
            .await
            .unwrap_err();
        assert_eq!(
            err.rejection().unwrap()["non_field_errors"][0],
            json!("Unable to log in with provided credentials.")
        );
        assert!(!manager.is_authenticated().unwrap());

        let (_, offline) = new_manager(FakeApi {
            offline: true,
            ..FakeApi::default()
        });
        let err = offline
            .login("elif@example.com", &password("parola"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Network error or server down");
    }

    #[tokio::test]
    async fn test_register_does_not_log_in() {
        let (_, manager) = new_manager(FakeApi::default());
        let mut registration = Registration {
            email: Email::parse("yeni@example.com").unwrap(),
            password: password("parola123"),
            first_name: "Yeni".to_string(),
            last_name: "Satıcı".to_string(),
            role: Role::Seller,
            business_name: Some("Yeni Dükkan".to_string()),
            extra: Map::new(),
        };
        manager.register(&registration).await.unwrap();
        assert!(!manager.is_authenticated().unwrap());

        registration.email = Email::parse("taken@example.com").unwrap();
        let err = manager.register(&registration).await.unwrap_err();
        assert!(err.rejection().unwrap().get("email").is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_when_api_fails() {
        let (notifier, manager) = new_manager(FakeApi::default());
        manager
            .login("elif@example.com", &password("parola"))
            .await
            .unwrap();

        let mut events = notifier.subscribe();
        manager.logout().await.unwrap();
        assert!(!manager.is_authenticated().unwrap());
        assert_eq!(events.try_recv().unwrap(), StateChange::Session);
        assert_eq!(manager.api().calls(), vec!["login", "logout"]);

        let (_, offline) = new_manager(FakeApi {
            offline: true,
            ..FakeApi::default()
        });
        offline.logout().await.unwrap();
        assert!(!offline.is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (_, manager) = new_manager(FakeApi::default());

        let mut patch = Map::new();
        patch.insert("first_name".into(), json!("Ela"));
        assert!(matches!(
            manager.update_profile(patch.clone()),
            Err(AuthError::NotLoggedIn)
        ));

        manager
            .login("elif@example.com", &password("parola"))
            .await
            .unwrap();
        let updated = manager.update_profile(patch).unwrap();
        assert_eq!(updated.first_name, "Ela");
        assert_eq!(updated.last_name, "Demir");
        assert_eq!(manager.current_user().unwrap().unwrap().first_name, "Ela");

        let mut bad = Map::new();
        bad.insert("role".into(), json!("ADMIN"));
        assert!(matches!(
            manager.update_profile(bad),
            Err(AuthError::InvalidProfile(_))
        ));
    }
}
