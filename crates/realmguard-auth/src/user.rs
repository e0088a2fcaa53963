//! User identity type
//!
//! A `User` always denotes an identity. "No user" is expressed as
//! `Option<User>::None`, so an empty id is still a valid user.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An authenticated (or authenticatable) user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identifier assigned by the store
    id: String,
    /// Store-defined attributes (display name, roles, password material...)
    #[serde(default)]
    payload: Value,
    /// Realm the user was authenticated or restored under
    #[serde(skip)]
    auth_realm: Option<String>,
}

impl User {
    /// Create a user with an empty payload
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: Value::Null,
            auth_realm: None,
        }
    }

    /// Set the payload
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Tag the user with the realm it belongs to
    #[must_use]
    pub fn with_auth_realm(mut self, realm: impl Into<String>) -> Self {
        self.auth_realm = Some(realm.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Realm name, once the manager has set or restored this user
    pub fn auth_realm(&self) -> Option<&str> {
        self.auth_realm.as_deref()
    }

    /// Look up a payload field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// Look up a string payload field
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Serialize for storage in a session
    ///
    /// The realm tag is not stored; it is re-applied on restore.
    pub fn for_session(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "payload": self.payload,
        })
    }

    /// Rebuild a user from a value written by [`User::for_session`]
    pub fn from_session(value: &Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}
