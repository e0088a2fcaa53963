//! Session collaborator
//!
//! The manager never owns session storage. It reads and writes two keys
//! through the [`Session`] trait and degrades to no-ops when no valid
//! session is attached to the request.

use crate::context::RequestContext;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Session key holding the name of the realm the user authenticated under
pub const USER_REALM_KEY: &str = "Authentication::userRealm";

/// Session key holding the serialized user
pub const USER_KEY: &str = "Authentication::user";

/// Key/value store scoped to one logical user session
pub trait Session: Send + Sync {
    /// Whether the request carries a usable session
    fn is_valid(&self, ctx: &RequestContext) -> bool;

    /// Read a value from the request's session
    fn value(&self, ctx: &RequestContext, key: &str) -> Option<Value>;

    /// Write a value into the request's session
    fn set_value(&self, ctx: &RequestContext, key: &str, value: Value);

    /// Remove a value from the request's session
    fn remove_value(&self, ctx: &RequestContext, key: &str);
}

/// In-memory session store
///
/// Sessions are keyed by the request's session id. A request without a
/// session id has no valid session.
#[derive(Default)]
pub struct MemorySession {
    /// Values indexed by session id, then key
    sessions: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemorySession {
    /// Create an empty session store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions holding at least one value
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drop everything stored for a session id
    pub fn clear(&self, session_id: &str) {
        self.sessions.write().remove(session_id);
    }
}

impl Session for MemorySession {
    fn is_valid(&self, ctx: &RequestContext) -> bool {
        ctx.session_id().is_some()
    }

    fn value(&self, ctx: &RequestContext, key: &str) -> Option<Value> {
        let id = ctx.session_id()?;
        self.sessions
            .read()
            .get(id)
            .and_then(|values| values.get(key))
            .cloned()
    }

    fn set_value(&self, ctx: &RequestContext, key: &str, value: Value) {
        let Some(id) = ctx.session_id() else {
            return;
        };
        self.sessions
            .write()
            .entry(id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn remove_value(&self, ctx: &RequestContext, key: &str) {
        let Some(id) = ctx.session_id() else {
            return;
        };
        let mut sessions = self.sessions.write();
        if let Some(values) = sessions.get_mut(id) {
            values.remove(key);
            if values.is_empty() {
                sessions.remove(id);
            }
        }
    }
}
