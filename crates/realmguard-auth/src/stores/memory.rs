//! In-memory user store

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::config::MemoryStoreConfig;
use crate::context::RequestContext;
use crate::error::AuthError;
use crate::store::{Store, UserInfo};
use crate::user::User;

/// In-memory user store
///
/// Users are indexed by id. Lookups read the id from the `id_field` of the
/// supplied userinfo. The session form is `{"id": ...}` only, so payload
/// fields (including password material) never reach the session; restore
/// re-reads the record.
pub struct MemoryStore {
    /// Users indexed by id
    users: RwLock<HashMap<String, User>>,
    /// Userinfo field carrying the user id
    id_field: String,
    auto_create: bool,
    auto_update: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store looking users up by `username`
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            id_field: "username".to_string(),
            auto_create: false,
            auto_update: false,
        }
    }

    /// Build a store and seed it from config
    pub fn from_config(config: &MemoryStoreConfig) -> Result<Self, AuthError> {
        let store = Self::new()
            .with_id_field(config.id_field.clone())
            .with_auto_create(config.auto_create)
            .with_auto_update(config.auto_update);

        for user in &config.users {
            store.insert_user(
                User::new(user.id.as_str()).with_payload(Value::Object(user.fields.clone())),
            )?;
        }

        Ok(store)
    }

    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    #[must_use]
    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create = enabled;
        self
    }

    #[must_use]
    pub fn with_auto_update(mut self, enabled: bool) -> Self {
        self.auto_update = enabled;
        self
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    // =========== User Operations ===========

    /// Add a user; fails if the id is taken
    pub fn insert_user(&self, user: User) -> Result<(), AuthError> {
        let mut users = self.users.write();
        if users.contains_key(user.id()) {
            return Err(AuthError::UserAlreadyExists(user.id().to_string()));
        }
        users.insert(user.id().to_string(), user);
        Ok(())
    }

    /// Get user by id
    pub fn get_user(&self, id: &str) -> Option<User> {
        self.users.read().get(id).cloned()
    }

    /// List all users, sorted by id
    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.id().cmp(b.id()));
        users
    }

    /// Remove a user
    pub fn remove_user(&self, id: &str) -> Result<User, AuthError> {
        self.users
            .write()
            .remove(id)
            .ok_or_else(|| AuthError::UserNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// Userinfo fields other than the id, as JSON strings
    fn attributes(&self, userinfo: &UserInfo) -> Map<String, Value> {
        userinfo
            .iter()
            .filter(|(k, _)| **k != self.id_field)
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn find_user(
        &self,
        _ctx: &RequestContext,
        userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        Ok(userinfo
            .get(&self.id_field)
            .and_then(|id| self.get_user(id)))
    }

    fn can_auto_create_user(&self) -> bool {
        self.auto_create
    }

    fn auto_create_user(
        &self,
        _ctx: &RequestContext,
        userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        let Some(id) = userinfo.get(&self.id_field) else {
            return Ok(None);
        };

        // Lookup and insert race between requests; the first insert wins
        let mut users = self.users.write();
        match users.entry(id.clone()) {
            Entry::Occupied(entry) => Ok(Some(entry.get().clone())),
            Entry::Vacant(entry) => {
                let user =
                    User::new(id.as_str()).with_payload(Value::Object(self.attributes(userinfo)));
                entry.insert(user.clone());
                tracing::info!(user_id = %id, "Auto-created user");
                Ok(Some(user))
            }
        }
    }

    fn can_auto_update_user(&self) -> bool {
        self.auto_update
    }

    fn auto_update_user(
        &self,
        _ctx: &RequestContext,
        userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        let Some(id) = userinfo.get(&self.id_field) else {
            return Ok(None);
        };

        let mut users = self.users.write();
        let existing = users
            .get(id)
            .ok_or_else(|| AuthError::UserNotFound(id.clone()))?;

        let mut payload = existing.payload().as_object().cloned().unwrap_or_default();
        payload.extend(self.attributes(userinfo));
        let updated = User::new(id.as_str()).with_payload(Value::Object(payload));

        users.insert(id.clone(), updated.clone());
        Ok(Some(updated))
    }

    fn can_for_session(&self) -> bool {
        true
    }

    fn for_session(&self, _ctx: &RequestContext, user: &User) -> Value {
        serde_json::json!({ "id": user.id() })
    }

    fn can_from_session(&self) -> bool {
        true
    }

    fn from_session(
        &self,
        _ctx: &RequestContext,
        frozen: &Value,
    ) -> Result<Option<User>, AuthError> {
        Ok(frozen
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| self.get_user(id)))
    }
}
