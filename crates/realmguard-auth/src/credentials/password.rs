//! Password credential
//!
//! Looks the user up through the realm (with the password field removed
//! from the lookup info) and checks the supplied password against a field
//! of the user's payload.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::PasswordCredentialConfig;
use crate::context::RequestContext;
use crate::credential::Credential;
use crate::error::AuthError;
use crate::realm::Realm;
use crate::store::UserInfo;
use crate::user::User;

/// How the stored password is compared with the supplied one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordType {
    /// No password check; finding the user is enough
    None,
    /// Stored password is plain text
    #[default]
    Clear,
    /// Stored password is hex SHA-256 of `pre_salt + password + post_salt`
    Hashed,
    /// Stored password is an Argon2 PHC string
    #[cfg(feature = "argon2")]
    Argon2,
}

/// Username/password verification against the realm's store
#[derive(Debug, Clone)]
pub struct PasswordCredential {
    /// Field holding the password, in both auth info and user payload
    password_field: String,
    password_type: PasswordType,
    pre_salt: String,
    post_salt: String,
}

impl Default for PasswordCredential {
    fn default() -> Self {
        Self::new(PasswordType::default())
    }
}

impl PasswordCredential {
    /// Create a credential reading the `password` field
    pub fn new(password_type: PasswordType) -> Self {
        Self {
            password_field: "password".to_string(),
            password_type,
            pre_salt: String::new(),
            post_salt: String::new(),
        }
    }

    pub fn from_config(config: &PasswordCredentialConfig) -> Self {
        Self::new(config.password_type)
            .with_password_field(config.password_field.clone())
            .with_salts(config.pre_salt.clone(), config.post_salt.clone())
    }

    #[must_use]
    pub fn with_password_field(mut self, field: impl Into<String>) -> Self {
        self.password_field = field.into();
        self
    }

    /// Salts used by [`PasswordType::Hashed`]
    #[must_use]
    pub fn with_salts(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.pre_salt = pre.into();
        self.post_salt = post.into();
        self
    }

    pub fn password_field(&self) -> &str {
        &self.password_field
    }

    pub const fn password_type(&self) -> PasswordType {
        self.password_type
    }

    /// Produce the stored form of `password` for this credential's type
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        match self.password_type {
            PasswordType::None => Err(AuthError::PasswordHash(
                "password type 'none' stores no password".to_string(),
            )),
            PasswordType::Clear => Ok(password.to_string()),
            PasswordType::Hashed => Ok(sha256_hex(&self.pre_salt, password, &self.post_salt)),
            #[cfg(feature = "argon2")]
            PasswordType::Argon2 => argon2_phc(password),
        }
    }

    /// Compare `supplied` with the password stored on `user`
    pub fn check_password(&self, user: &User, supplied: Option<&str>) -> bool {
        if self.password_type == PasswordType::None {
            return true;
        }

        let (Some(supplied), Some(stored)) = (supplied, user.field_str(&self.password_field))
        else {
            return false;
        };

        match self.password_type {
            PasswordType::None => true,
            PasswordType::Clear => constant_time_eq(stored, supplied),
            PasswordType::Hashed => {
                let digest = sha256_hex(&self.pre_salt, supplied, &self.post_salt);
                constant_time_eq(&stored.to_ascii_lowercase(), &digest)
            }
            #[cfg(feature = "argon2")]
            PasswordType::Argon2 => argon2_verify(user.id(), stored, supplied),
        }
    }
}

impl Credential for PasswordCredential {
    fn name(&self) -> &str {
        "password"
    }

    fn authenticate(
        &self,
        ctx: &RequestContext,
        realm: &Realm,
        auth_info: &UserInfo,
    ) -> Result<Option<User>, AuthError> {
        let mut lookup = auth_info.clone();
        let supplied = lookup.remove(&self.password_field);

        let Some(user) = realm.find_user(ctx, &lookup)? else {
            tracing::debug!(realm = realm.name(), "Unable to locate user matching auth info");
            return Ok(None);
        };

        if self.check_password(&user, supplied.as_deref()) {
            Ok(Some(user))
        } else {
            tracing::debug!(realm = realm.name(), user_id = user.id(), "Password didn't match");
            Ok(None)
        }
    }
}

/// Hex SHA-256 of `pre + password + post`
pub fn sha256_hex(pre_salt: &str, password: &str, post_salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pre_salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.update(post_salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password into an Argon2 PHC string with a random salt
#[cfg(feature = "argon2")]
pub fn argon2_phc(password: &str) -> Result<String, AuthError> {
    use argon2::{Argon2, PasswordHasher};
    use password_hash::SaltString;

    let salt = SaltString::generate(&mut rand_core::OsRng);
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .to_string();
    Ok(phc)
}

#[cfg(feature = "argon2")]
fn argon2_verify(user_id: &str, phc: &str, password: &str) -> bool {
    use argon2::{Argon2, PasswordVerifier};
    use password_hash::PasswordHash;

    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(user_id, "Stored password is not a valid PHC string: {}", e);
            false
        }
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::test_support::info;
    use serde_json::json;
    use std::sync::Arc;

    fn realm(credential: PasswordCredential, stored: &str) -> Realm {
        let store = MemoryStore::new();
        store
            .insert_user(User::new("alice").with_payload(json!({"password": stored})))
            .unwrap();
        Realm::with_arc(Arc::new(store), Arc::new(credential))
    }

    fn check(credential: &PasswordCredential, realm: &Realm, password: &str) -> Option<User> {
        let ctx = RequestContext::new();
        credential
            .authenticate(&ctx, realm, &info(&[("username", "alice"), ("password", password)]))
            .unwrap()
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("hello", "hello!"));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex("", "hello", ""),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(sha256_hex("he", "l", "lo"), sha256_hex("", "hello", ""));
    }

    #[test]
    fn test_clear_password() {
        let credential = PasswordCredential::new(PasswordType::Clear);
        let realm = realm(credential.clone(), "secret");

        assert_eq!(check(&credential, &realm, "secret").unwrap().id(), "alice");
        assert!(check(&credential, &realm, "wrong").is_none());
    }

    #[test]
    fn test_hashed_password_with_salts() {
        let credential = PasswordCredential::new(PasswordType::Hashed).with_salts("pre-", "-post");
        let stored = credential.hash_password("secret").unwrap();
        let realm = realm(credential.clone(), &stored.to_ascii_uppercase());

        assert!(check(&credential, &realm, "secret").is_some());
        assert!(check(&credential, &realm, "pre-secret-post").is_none());
    }

    #[test]
    fn test_none_skips_password_check() {
        let credential = PasswordCredential::new(PasswordType::None);
        let realm = realm(credential.clone(), "secret");

        assert!(check(&credential, &realm, "anything").is_some());
        assert!(credential.hash_password("x").is_err());
    }

    #[test]
    fn test_unknown_user() {
        let credential = PasswordCredential::default();
        let realm = realm(credential.clone(), "secret");
        let ctx = RequestContext::new();

        let user = credential
            .authenticate(&ctx, &realm, &info(&[("username", "bob"), ("password", "secret")]))
            .unwrap();
        assert!(user.is_none());
    }

    #[test]
    fn test_missing_password_is_rejected() {
        let credential = PasswordCredential::default();
        let realm = realm(credential.clone(), "secret");
        let ctx = RequestContext::new();

        let user = credential
            .authenticate(&ctx, &realm, &info(&[("username", "alice")]))
            .unwrap();
        assert!(user.is_none());
        assert!(!credential.check_password(&User::new("nobody"), Some("secret")));
    }

    #[test]
    fn test_custom_password_field() {
        let credential = PasswordCredential::default().with_password_field("pin");
        let user = User::new("alice").with_payload(json!({"pin": "1234"}));

        assert!(credential.check_password(&user, Some("1234")));
        assert!(!credential.check_password(&user, Some("0000")));
    }

    #[cfg(feature = "argon2")]
    #[test]
    fn test_argon2_password() {
        let credential = PasswordCredential::new(PasswordType::Argon2);
        let phc = credential.hash_password("secret").unwrap();
        assert!(phc.starts_with("$argon2"));

        let realm = realm(credential.clone(), &phc);
        assert!(check(&credential, &realm, "secret").is_some());
        assert!(check(&credential, &realm, "wrong").is_none());
    }

    #[cfg(feature = "argon2")]
    #[test]
    fn test_argon2_rejects_malformed_hash() {
        let credential = PasswordCredential::new(PasswordType::Argon2);
        let user = User::new("alice").with_payload(json!({"password": "not-a-phc"}));
        assert!(!credential.check_password(&user, Some("not-a-phc")));
    }
}
