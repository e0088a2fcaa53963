//! Per-request state
//!
//! A `RequestContext` lives for one request. It carries the session handle
//! the framework attached to the request and a typed property bag used to
//! stash the current user.

use crate::session::Session;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Request-scoped state consumed by the authentication manager
#[derive(Default)]
pub struct RequestContext {
    session: Option<Arc<dyn Session>>,
    session_id: Option<String>,
    properties: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Create a context with no session and no properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the session backend
    #[must_use]
    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the session id (usually taken from a cookie)
    #[must_use]
    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn session(&self) -> Option<&dyn Session> {
        self.session.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The session backend, if attached and valid for this request
    pub fn valid_session(&self) -> Option<&dyn Session> {
        self.session().filter(|session| session.is_valid(self))
    }

    /// Get a property by key, if present and of type `T`
    pub fn property<T: Any>(&self, key: &str) -> Option<&T> {
        self.properties.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Set a property, replacing any previous value
    pub fn set_property<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.properties.insert(key.into(), Box::new(value));
    }

    /// Remove a property; returns whether it was present
    pub fn remove_property(&mut self, key: &str) -> bool {
        self.properties.remove(key).is_some()
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("has_session", &self.session.is_some())
            .field("session_id", &self.session_id)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}
