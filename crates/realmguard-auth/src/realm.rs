//! Realms: one store paired with one credential
//!
//! A realm owns the per-pairing half of the protocol: looking users up
//! (with auto-create / auto-update), verifying credentials, and moving the
//! user in and out of the session under [`USER_KEY`].

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::RequestContext;
use crate::credential::Credential;
use crate::error::AuthError;
use crate::manager::Authentication;
use crate::session::USER_KEY;
use crate::store::{Store, UserInfo};
use crate::user::User;

/// A named store + credential pair
pub struct Realm {
    /// Assigned by [`Authentication::add_realm`]
    name: String,
    store: Arc<dyn Store>,
    credential: Arc<dyn Credential>,
}

impl Realm {
    /// Create a realm from a store and a credential
    pub fn new<S, C>(store: S, credential: C) -> Self
    where
        S: Store + 'static,
        C: Credential + 'static,
    {
        Self::with_arc(Arc::new(store), Arc::new(credential))
    }

    /// Create a realm from Arc-wrapped parts (e.g. a store shared by realms)
    pub fn with_arc(store: Arc<dyn Store>, credential: Arc<dyn Credential>) -> Self {
        Self {
            name: String::new(),
            store,
            credential,
        }
    }

    /// Registered name; empty until the realm is added to a manager
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn credential(&self) -> &Arc<dyn Credential> {
        &self.credential
    }

    /// Look up a user, auto-creating on a miss or auto-updating on a hit
    /// when the store supports it
    pub fn find_user(
        &self,
        ctx: &RequestContext,
        userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        match self.store.find_user(ctx, userinfo)? {
            None if self.store.can_auto_create_user() => {
                tracing::debug!(realm = %self.name, store = self.store.name(), "Auto-creating user");
                self.store.auto_create_user(ctx, userinfo)
            }
            None => Ok(None),
            Some(_) if self.store.can_auto_update_user() => {
                tracing::debug!(realm = %self.name, store = self.store.name(), "Auto-updating user");
                self.store.auto_update_user(ctx, userinfo)
            }
            Some(user) => Ok(Some(user)),
        }
    }

    /// Verify `auth_info` and, on success, mark the user authenticated
    /// for this request through `auth`
    pub fn authenticate(
        &self,
        auth: &Authentication,
        ctx: &mut RequestContext,
        auth_info: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        tracing::debug!(
            realm = %self.name,
            credential = self.credential.name(),
            "Verifying credentials"
        );

        let user = self.credential.authenticate(ctx, self, auth_info)?;
        match &user {
            Some(user) => {
                tracing::debug!(realm = %self.name, user_id = user.id(), "Credentials accepted");
                auth.set_authenticated(ctx, user.clone(), Some(self.name.as_str()));
            }
            None => tracing::debug!(realm = %self.name, "Credentials rejected"),
        }

        Ok(user)
    }

    /// Write `user` into the session, if the request has a valid one
    pub fn persist_user(&self, ctx: &RequestContext, user: &User) {
        let Some(session) = ctx.valid_session() else {
            return;
        };

        let value = if self.store.can_for_session() {
            self.store.for_session(ctx, user)
        } else {
            user.for_session()
        };
        session.set_value(ctx, USER_KEY, value);
    }

    /// Restore the user for this realm
    ///
    /// An explicitly supplied `frozen_user` wins; otherwise the user is read
    /// back from the session. The result is tagged with this realm's name.
    pub fn restore_user(&self, ctx: &RequestContext, frozen_user: Option<User>) -> Option<User> {
        frozen_user
            .or_else(|| self.user_is_restorable(ctx))
            .map(|user| user.with_auth_realm(self.name.as_str()))
    }

    /// Read-only probe for a persisted user
    pub fn user_is_restorable(&self, ctx: &RequestContext) -> Option<User> {
        let session = ctx.valid_session()?;
        let frozen = session.value(ctx, USER_KEY)?;
        self.thaw(ctx, &frozen)
    }

    /// Remove the persisted user from the session
    pub fn remove_persisted_user(&self, ctx: &RequestContext) {
        if let Some(session) = ctx.valid_session() {
            session.remove_value(ctx, USER_KEY);
        }
    }

    fn thaw(&self, ctx: &RequestContext, frozen: &Value) -> Option<User> {
        if !self.store.can_from_session() {
            return User::from_session(frozen);
        }

        match self.store.from_session(ctx, frozen) {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(
                    realm = %self.name,
                    store = self.store.name(),
                    "Failed to restore user from session: {}",
                    e
                );
                None
            }
        }
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("name", &self.name)
            .field("store", &self.store.name())
            .field("credential", &self.credential.name())
            .finish()
    }
}
