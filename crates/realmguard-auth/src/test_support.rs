//! Fakes shared by the unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::context::RequestContext;
use crate::credential::Credential;
use crate::error::AuthError;
use crate::realm::Realm;
use crate::store::{Store, UserInfo};
use crate::user::User;

/// Build a `UserInfo` from string pairs
pub fn info(pairs: &[(&str, &str)]) -> UserInfo {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Store keyed by the `username` field with switchable capabilities
#[derive(Default)]
pub struct FakeStore {
    users: RwLock<HashMap<String, User>>,
    auto_create: bool,
    auto_update: bool,
    session_by_id: bool,
    failing: bool,
    auto_created: AtomicUsize,
    auto_updated: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.write().insert(user.id().to_string(), user);
        self
    }

    pub fn auto_create(mut self) -> Self {
        self.auto_create = true;
        self
    }

    pub fn auto_update(mut self) -> Self {
        self.auto_update = true;
        self
    }

    /// Persist only `{"id"}` and re-read the record on restore
    pub fn session_by_id(mut self) -> Self {
        self.session_by_id = true;
        self
    }

    /// Make every lookup fail
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.users.read().get(id).cloned()
    }

    pub fn auto_created(&self) -> usize {
        self.auto_created.load(Ordering::SeqCst)
    }

    pub fn auto_updated(&self) -> usize {
        self.auto_updated.load(Ordering::SeqCst)
    }

    fn fields(userinfo: &UserInfo) -> Map<String, Value> {
        userinfo
            .iter()
            .filter(|(k, _)| k.as_str() != "username")
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

impl Store for FakeStore {
    fn name(&self) -> &str {
        "fake"
    }

    fn find_user(
        &self,
        _ctx: &RequestContext,
        userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        if self.failing {
            return Err(AuthError::Store("backend down".to_string()));
        }
        Ok(userinfo.get("username").and_then(|name| self.user(name)))
    }

    fn can_auto_create_user(&self) -> bool {
        self.auto_create
    }

    fn auto_create_user(
        &self,
        _ctx: &RequestContext,
        userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        self.auto_created.fetch_add(1, Ordering::SeqCst);
        let Some(name) = userinfo.get("username") else {
            return Ok(None);
        };
        let user = User::new(name.as_str()).with_payload(Value::Object(Self::fields(userinfo)));
        self.users.write().insert(name.clone(), user.clone());
        Ok(Some(user))
    }

    fn can_auto_update_user(&self) -> bool {
        self.auto_update
    }

    fn auto_update_user(
        &self,
        _ctx: &RequestContext,
        userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        self.auto_updated.fetch_add(1, Ordering::SeqCst);
        let Some(name) = userinfo.get("username") else {
            return Ok(None);
        };
        let mut users = self.users.write();
        let Some(existing) = users.get(name) else {
            return Ok(None);
        };
        let mut payload = existing.payload().as_object().cloned().unwrap_or_default();
        payload.extend(Self::fields(userinfo));
        let updated = User::new(existing.id()).with_payload(Value::Object(payload));
        users.insert(name.clone(), updated.clone());
        Ok(Some(updated))
    }

    fn can_for_session(&self) -> bool {
        self.session_by_id
    }

    fn for_session(&self, _ctx: &RequestContext, user: &User) -> Value {
        serde_json::json!({ "id": user.id() })
    }

    fn can_from_session(&self) -> bool {
        self.session_by_id
    }

    fn from_session(
        &self,
        _ctx: &RequestContext,
        frozen: &Value,
    ) -> Result<Option<User>, AuthError> {
        if self.failing {
            return Err(AuthError::Store("backend down".to_string()));
        }
        Ok(frozen
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| self.user(id)))
    }
}

/// Credential with a canned answer
pub struct FixedCredential {
    answer: Option<User>,
}

impl FixedCredential {
    pub fn accept(user: User) -> Self {
        Self { answer: Some(user) }
    }

    pub fn reject() -> Self {
        Self { answer: None }
    }
}

impl Credential for FixedCredential {
    fn name(&self) -> &str {
        "fixed"
    }

    fn authenticate(
        &self,
        _ctx: &RequestContext,
        _realm: &Realm,
        _auth_info: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        Ok(self.answer.clone())
    }
}
