//! Authentication manager
//!
//! The manager owns the realm registry and drives the request-level
//! protocol:
//!
//! - `authenticate` resolves a realm (explicit name, else the default) and
//!   lets it verify credentials; success marks the user authenticated for
//!   the request and persists it into the session.
//! - `user` returns the request's user, restoring it from the session when
//!   the request has none yet. Restoration follows the realm hint stored in
//!   the session, or probes every realm in registration order.
//!
//! Realms are registered during start-up. Afterwards the manager is shared
//! read-only between requests (`Arc<Authentication>`); all per-request
//! state lives in the [`RequestContext`].

use std::collections::HashMap;

use serde_json::Value;

use crate::context::RequestContext;
use crate::error::AuthError;
use crate::realm::Realm;
use crate::session::{USER_KEY, USER_REALM_KEY};
use crate::store::UserInfo;
use crate::user::User;

/// Name used by [`Authentication::add_default_realm`]
pub const DEFAULT_REALM: &str = "default";

/// Request property holding the authenticated user
pub const USER_PROPERTY: &str = "user";

/// Registry of named realms and entry point for request handlers
#[derive(Debug)]
pub struct Authentication {
    realms: HashMap<String, Realm>,
    /// Registration order; also the probe order for restoration
    realms_order: Vec<String>,
    default_realm: Option<String>,
    use_session: bool,
}

impl Default for Authentication {
    fn default() -> Self {
        Self::new()
    }
}

impl Authentication {
    /// Create a manager with no realms that persists users in the session
    pub fn new() -> Self {
        Self {
            realms: HashMap::new(),
            realms_order: Vec::new(),
            default_realm: None,
            use_session: true,
        }
    }

    // =========== Registry ===========

    /// Register `realm` under `name`
    ///
    /// Names must be non-empty and unique.
    pub fn add_realm(
        &mut self,
        name: impl Into<String>,
        mut realm: Realm,
        make_default: bool,
    ) -> Result<(), AuthError> {
        let name = name.into();
        if name.is_empty() {
            return Err(AuthError::InvalidRealmName);
        }
        if self.realms.contains_key(&name) {
            return Err(AuthError::DuplicateRealm(name));
        }

        tracing::debug!(realm = %name, make_default, "Registering realm");
        realm.set_name(name.clone());
        self.realms.insert(name.clone(), realm);
        self.realms_order.push(name.clone());
        if make_default {
            self.default_realm = Some(name);
        }
        Ok(())
    }

    /// Register `realm` as the default realm, named [`DEFAULT_REALM`]
    pub fn add_default_realm(&mut self, realm: Realm) -> Result<(), AuthError> {
        self.add_realm(DEFAULT_REALM, realm, true)
    }

    /// Make an already registered realm the default
    pub fn set_default_realm(&mut self, name: &str) -> Result<(), AuthError> {
        if !self.realms.contains_key(name) {
            return Err(AuthError::UnknownDefaultRealm(name.to_string()));
        }
        self.default_realm = Some(name.to_string());
        Ok(())
    }

    pub fn default_realm(&self) -> Option<&str> {
        self.default_realm.as_deref()
    }

    /// Resolve a realm: an explicit non-empty name, else the default
    pub fn realm(&self, name: Option<&str>) -> Option<&Realm> {
        let name = name
            .filter(|n| !n.is_empty())
            .or(self.default_realm.as_deref())?;
        self.realms.get(name)
    }

    /// Realm names in registration order
    pub fn realm_names(&self) -> impl Iterator<Item = &str> {
        self.realms_order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.realms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realms.is_empty()
    }

    /// Enable or disable session persistence
    pub fn set_use_session(&mut self, use_session: bool) {
        self.use_session = use_session;
    }

    pub const fn use_session(&self) -> bool {
        self.use_session
    }

    // =========== Handler API ===========

    /// Verify `auth_info` against a realm
    ///
    /// On success the user becomes the request's user and is persisted.
    /// An unresolvable realm is logged and yields `Ok(None)`.
    pub fn authenticate(
        &self,
        ctx: &mut RequestContext,
        auth_info: &UserInfo,
        realm_name: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        let Some(realm) = self.realm(realm_name) else {
            tracing::warn!(realm = realm_name.unwrap_or(""), "Could not find realm");
            return Ok(None);
        };
        realm.authenticate(self, ctx, auth_info)
    }

    /// [`Authentication::authenticate`] with `username` / `password` fields
    pub fn authenticate_with_password(
        &self,
        ctx: &mut RequestContext,
        username: &str,
        password: &str,
        realm_name: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        let auth_info = UserInfo::from([
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ]);
        self.authenticate(ctx, &auth_info, realm_name)
    }

    /// Look a user up without authenticating it
    pub fn find_user(
        &self,
        ctx: &RequestContext,
        userinfo: &UserInfo,
        realm_name: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        let Some(realm) = self.realm(realm_name) else {
            tracing::warn!(realm = realm_name.unwrap_or(""), "Could not find realm");
            return Ok(None);
        };
        realm.find_user(ctx, userinfo)
    }

    /// The request's user, restoring it from the session if needed
    pub fn user(&self, ctx: &mut RequestContext) -> Option<User> {
        if let Some(user) = ctx.property::<User>(USER_PROPERTY) {
            return Some(user.clone());
        }
        self.restore_user(ctx, None, None)
    }

    pub fn user_exists(&self, ctx: &mut RequestContext) -> bool {
        self.user(ctx).is_some()
    }

    /// Whether the current (or restorable) user belongs to `realm_name`
    pub fn user_in_realm(&self, ctx: &mut RequestContext, realm_name: &str) -> bool {
        self.user(ctx)
            .is_some_and(|user| user.auth_realm() == Some(realm_name))
    }

    /// Forget the request's user and its persisted session entries
    pub fn logout(&self, ctx: &mut RequestContext) {
        let had_user = ctx.remove_property(USER_PROPERTY);
        tracing::debug!(had_user, "Logging out");

        if !self.use_session {
            return;
        }
        let Some(session) = ctx.valid_session() else {
            return;
        };

        match self.persisted_realm(ctx) {
            Some(realm) => realm.remove_persisted_user(ctx),
            None => session.remove_value(ctx, USER_KEY),
        }
        session.remove_value(ctx, USER_REALM_KEY);
    }

    /// Mark `user` as the request's authenticated user and persist it
    ///
    /// An unknown realm is logged; the user is still set for the request
    /// but cannot be persisted.
    pub fn set_authenticated(
        &self,
        ctx: &mut RequestContext,
        user: User,
        realm_name: Option<&str>,
    ) {
        let user = match self.realm(realm_name) {
            Some(realm) => user.with_auth_realm(realm.name()),
            None => {
                tracing::warn!(
                    realm = realm_name.unwrap_or(""),
                    user_id = user.id(),
                    "Called with invalid realm"
                );
                user
            }
        };

        tracing::debug!(
            user_id = user.id(),
            realm = user.auth_realm().unwrap_or(""),
            "User authenticated"
        );
        ctx.set_property(USER_PROPERTY, user.clone());
        self.persist_user(ctx, &user, realm_name);
    }

    // =========== Persistence protocol ===========

    /// Write `user` and its realm name into the session
    ///
    /// No-op unless the request already has an authenticated user.
    pub fn persist_user(&self, ctx: &RequestContext, user: &User, realm_name: Option<&str>) {
        if !ctx.has_property(USER_PROPERTY) {
            tracing::debug!(user_id = user.id(), "No authenticated user, not persisting");
            return;
        }
        if !self.use_session {
            return;
        }

        let Some(realm) = self.realm(realm_name) else {
            tracing::warn!(
                realm = realm_name.unwrap_or(""),
                "Cannot persist user for unknown realm"
            );
            // A previously persisted user must not outlive this one
            if let Some(session) = ctx.valid_session() {
                session.remove_value(ctx, USER_KEY);
                session.remove_value(ctx, USER_REALM_KEY);
            }
            return;
        };

        if let Some(session) = ctx.valid_session() {
            session.set_value(ctx, USER_REALM_KEY, Value::String(realm.name().to_string()));
        }
        realm.persist_user(ctx, user);
        tracing::debug!(user_id = user.id(), realm = realm.name(), "Persisted user");
    }

    /// Restore the request's user
    ///
    /// With `realm_name` the named realm (or the default for an empty name)
    /// restores; otherwise the realm is found from the session. A restored
    /// user becomes the request's user.
    pub fn restore_user(
        &self,
        ctx: &mut RequestContext,
        frozen_user: Option<User>,
        realm_name: Option<&str>,
    ) -> Option<User> {
        if frozen_user.is_none() && !self.use_session {
            return None;
        }

        let realm = match realm_name {
            Some(name) => {
                let realm = self.realm(Some(name));
                if realm.is_none() {
                    tracing::warn!(realm = name, "Could not find realm to restore user");
                }
                realm
            }
            None => self.find_realm_for_persisted_user(ctx),
        }?;

        let user = realm.restore_user(ctx, frozen_user)?;
        tracing::debug!(user_id = user.id(), realm = realm.name(), "Restored user");
        ctx.set_property(USER_PROPERTY, user.clone());
        Some(user)
    }

    /// Find the realm holding the session's persisted user
    ///
    /// A realm hint in the session is trusted exclusively: the hinted realm
    /// is returned if it can restore a user, and nothing else is tried.
    /// Without a hint every realm is probed in registration order.
    pub fn find_realm_for_persisted_user(&self, ctx: &RequestContext) -> Option<&Realm> {
        if !self.use_session {
            return None;
        }

        if let Some(name) = persisted_realm_name(ctx) {
            let realm = self.realms.get(&name)?;
            return realm.user_is_restorable(ctx).is_some().then_some(realm);
        }

        // No hint; ask each realm whether it has a persisted user
        self.realms_order
            .iter()
            .filter_map(|name| self.realms.get(name))
            .find(|realm| realm.user_is_restorable(ctx).is_some())
    }

    /// The realm named by the session hint, if registered
    fn persisted_realm(&self, ctx: &RequestContext) -> Option<&Realm> {
        persisted_realm_name(ctx).and_then(|name| self.realms.get(&name))
    }
}

fn persisted_realm_name(ctx: &RequestContext) -> Option<String> {
    let session = ctx.valid_session()?;
    match session.value(ctx, USER_REALM_KEY)? {
        Value::String(name) => Some(name),
        other => {
            tracing::warn!(hint = %other, "Ignoring non-string realm hint in session");
            None
        }
    }
}
