//! Pluggable user store trait
//!
//! A store is the identity source of a realm (a database table, a directory,
//! a config file). Only `find_user` is required. The optional operations are
//! gated by capability flags which the realm checks before calling them, so
//! the default implementations are never reached through a `Realm`.

use crate::context::RequestContext;
use crate::error::AuthError;
use crate::user::User;
use serde_json::Value;
use std::collections::HashMap;

/// Lookup or authentication fields (`username`, `password`, ...)
pub type UserInfo = HashMap<String, String>;

/// Trait for pluggable user stores
pub trait Store: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &str;

    /// Look up a user matching `userinfo`
    fn find_user(
        &self,
        ctx: &RequestContext,
        userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError>;

    fn can_auto_create_user(&self) -> bool {
        false
    }

    /// Create a user for `userinfo` after a lookup miss
    fn auto_create_user(
        &self,
        _ctx: &RequestContext,
        _userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        Ok(None)
    }

    fn can_auto_update_user(&self) -> bool {
        false
    }

    /// Refresh a user's record from `userinfo` after a lookup hit
    fn auto_update_user(
        &self,
        _ctx: &RequestContext,
        _userinfo: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        Ok(None)
    }

    fn can_for_session(&self) -> bool {
        false
    }

    /// Store-specific session form of `user`
    fn for_session(&self, _ctx: &RequestContext, _user: &User) -> Value {
        Value::Null
    }

    fn can_from_session(&self) -> bool {
        false
    }

    /// Rebuild a user from a value written by [`Store::for_session`]
    fn from_session(
        &self,
        _ctx: &RequestContext,
        _frozen: &Value,
    ) -> Result<Option<User>, AuthError> {
        Ok(None)
    }
}
