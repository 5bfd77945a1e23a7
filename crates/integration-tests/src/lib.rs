//! Integration test support for MarketPlus.
//!
//! [`StubAuthServer`] runs a small axum app on an ephemeral local port that
//! answers like the MarketPlus auth API, so the real HTTP client can be
//! exercised end to end.
//!
//! # Canned accounts
//!
//! - Login succeeds for any email with password [`GOOD_PASSWORD`], except
//!   [`MALFORMED_EMAIL`], whose "successful" response is not a user.
//! - Registering [`TAKEN_EMAIL`] fails with a field error; registering
//!   [`CRASH_EMAIL`] fails with a plain-text 500.

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use marketplus_storefront::config::AuthApiConfig;

/// Password the stub accepts.
pub const GOOD_PASSWORD: &str = "dogru-parola";
/// Email whose login response body is not a user record.
pub const MALFORMED_EMAIL: &str = "bozuk@example.com";
/// Email the stub reports as already registered.
pub const TAKEN_EMAIL: &str = "kayitli@example.com";
/// Email whose registration crashes the stub.
pub const CRASH_EMAIL: &str = "hata@example.com";

/// A request received by the stub.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: &'static str,
    pub body: Value,
}

type Log = Arc<Mutex<Vec<RecordedRequest>>>;

/// Stub auth API server, stopped on drop.
pub struct StubAuthServer {
    base_url: Url,
    log: Log,
    handle: JoinHandle<()>,
}

impl StubAuthServer {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Errors
    ///
    /// Returns the bind error if no port is available.
    pub async fn start() -> std::io::Result<Self> {
        let log = Log::default();
        let app = Router::new()
            .route("/api/auth/login/", post(login))
            .route("/api/auth/register/", post(register))
            .route("/api/auth/logout/", post(logout))
            .with_state(log.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url =
            Url::parse(&format!("http://{addr}/api/auth")).map_err(std::io::Error::other)?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url,
            log,
            handle,
        })
    }

    /// Base URL of the stub's auth API.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client configuration pointing at this stub.
    #[must_use]
    pub fn config(&self) -> AuthApiConfig {
        AuthApiConfig {
            base_url: self.base_url.clone(),
            timeout: Some(std::time::Duration::from_secs(5)),
        }
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for StubAuthServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn record(log: &Log, path: &'static str, body: &Value) {
    log.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            path,
            body: body.clone(),
        });
}

async fn login(State(log): State<Log>, Json(body): Json<Value>) -> Response {
    record(&log, "login", &body);

    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != GOOD_PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"non_field_errors": ["Unable to log in with provided credentials."]})),
        )
            .into_response();
    }
    if email == MALFORMED_EMAIL {
        return (StatusCode::OK, "<html>maintenance</html>").into_response();
    }

    Json(json!({
        "id": 41,
        "email": email,
        "first_name": "Deniz",
        "last_name": "Kaya",
        "role": "SELLER",
        "seller_profile": {"business_name": "Deniz Seramik"}
    }))
    .into_response()
}

async fn register(State(log): State<Log>, Json(body): Json<Value>) -> Response {
    record(&log, "register", &body);

    match body["email"].as_str() {
        Some(TAKEN_EMAIL) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"email": ["user with this email already exists."]})),
        )
            .into_response(),
        Some(CRASH_EMAIL) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        _ => (StatusCode::CREATED, Json(json!({"id": 99}))).into_response(),
    }
}

async fn logout(State(log): State<Log>, Json(body): Json<Value>) -> Response {
    record(&log, "logout", &body);
    StatusCode::OK.into_response()
}
