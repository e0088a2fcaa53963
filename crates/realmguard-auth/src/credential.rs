//! Pluggable credential verification trait

use crate::context::RequestContext;
use crate::error::AuthError;
use crate::realm::Realm;
use crate::store::UserInfo;
use crate::user::User;

/// Trait for credential verification strategies
///
/// The realm passes itself in so the credential can look users up through
/// the realm's store (`realm.find_user`).
pub trait Credential: Send + Sync {
    /// Credential name for logging
    fn name(&self) -> &str;

    /// Verify `auth_info`
    ///
    /// Returns `Ok(None)` when the credentials do not match. `Err` is for
    /// backend failures only.
    fn authenticate(
        &self,
        ctx: &RequestContext,
        realm: &Realm,
        auth_info: &UserInfo,
    ) -> Result<Option<User>, AuthError>;
}
