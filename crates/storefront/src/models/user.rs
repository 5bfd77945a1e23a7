//! Session user types.
//!
//! The user record is whatever the auth API returned on login; the
//! storefront only interprets a handful of fields and keeps the rest.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use marketplus_core::{Email, Role};

/// The logged-in user cached in the session slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User's email address (as supplied by the server).
    pub email: Email,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Server-supplied fields the storefront does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionUser {
    /// "First Last", or the email when both names are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.to_string()
        } else {
            full.to_owned()
        }
    }

    /// Upper-cased initials, falling back to the email's first letter.
    #[must_use]
    pub fn initials(&self) -> String {
        let initials: String = [&self.first_name, &self.last_name]
            .iter()
            .filter_map(|name| name.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            self.email
                .as_str()
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_default()
        } else {
            initials
        }
    }

    /// Whether this account sells on the marketplace.
    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.role == Some(Role::Seller)
    }

    /// Account type label shown next to the user's name.
    #[must_use]
    pub fn account_label(&self) -> &'static str {
        if self.is_seller() {
            "Satıcı Hesabı"
        } else {
            "Müşteri Hesabı"
        }
    }

    /// Shallow-merge `patch` over this record.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the merged record is no longer a valid user
    /// (for example an unknown role).
    pub fn merged(&self, patch: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut fields = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.extend(patch);
        serde_json::from_value(Value::Object(fields))
    }
}

/// Fields sent to the register endpoint.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: Email,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Store name; only meaningful for sellers.
    pub business_name: Option<String>,
    /// Any further fields the API accepts.
    pub extra: Map<String, Value>,
}

impl Registration {
    /// JSON body for the register request. This is the only place the
    /// password is exposed.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = self.extra.clone();
        body.insert("email".into(), Value::String(self.email.to_string()));
        body.insert(
            "password".into(),
            Value::String(self.password.expose_secret().to_owned()),
        );
        body.insert("first_name".into(), Value::String(self.first_name.clone()));
        body.insert("last_name".into(), Value::String(self.last_name.clone()));
        body.insert("role".into(), Value::String(self.role.to_string()));
        if let Some(business_name) = &self.business_name {
            body.insert("business_name".into(), Value::String(business_name.clone()));
        }
        Value::Object(body)
    }
}
