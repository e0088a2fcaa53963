//! Configuration types for realmguard
//!
//! Realms are described in TOML and built into an [`Authentication`]
//! manager at start-up. Scalar settings can be overridden from the
//! environment with the `REALMGUARD__` prefix (e.g.
//! `REALMGUARD__USE_SESSION=false`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::credentials::{PasswordCredential, PasswordType};
use crate::error::AuthError;
use crate::manager::Authentication;
use crate::realm::Realm;
use crate::stores::MemoryStore;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "REALMGUARD";

/// Root authentication configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Persist and restore users through the session
    pub use_session: bool,
    /// Name of the default realm (overrides per-realm `default` flags)
    pub default_realm: Option<String>,
    /// Realms in registration order
    pub realms: Vec<RealmConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            use_session: true,
            default_realm: None,
            realms: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Load from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(true))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse TOML text (no environment overrides)
    pub fn from_toml_str(text: &str) -> Result<Self, AuthError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Build the manager described by this config
    pub fn build(&self) -> Result<Authentication, AuthError> {
        Authentication::from_config(self)
    }
}

/// One realm: an in-memory store plus a password credential
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RealmConfig {
    /// Realm name (unique, case-sensitive)
    pub name: String,
    /// Make this the default realm
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub store: MemoryStoreConfig,
    #[serde(default)]
    pub credential: PasswordCredentialConfig,
}

/// In-memory store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStoreConfig {
    /// Userinfo field carrying the user id
    pub id_field: String,
    /// Create unknown users on lookup
    pub auto_create: bool,
    /// Merge lookup fields into known users
    pub auto_update: bool,
    /// Seed users
    pub users: Vec<UserConfig>,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            id_field: "username".to_string(),
            auto_create: false,
            auto_update: false,
            users: Vec::new(),
        }
    }
}

/// A seeded user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: String,
    /// Payload fields (password, display name, roles...)
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Password credential configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordCredentialConfig {
    /// Field holding the password in auth info and user payload
    pub password_field: String,
    pub password_type: PasswordType,
    /// Prepended to the password before hashing (`hashed` only)
    pub pre_salt: String,
    /// Appended to the password before hashing (`hashed` only)
    pub post_salt: String,
}

impl Default for PasswordCredentialConfig {
    fn default() -> Self {
        Self {
            password_field: "password".to_string(),
            password_type: PasswordType::default(),
            pre_salt: String::new(),
            post_salt: String::new(),
        }
    }
}

impl Authentication {
    /// Build a manager from config
    ///
    /// Fails on empty or duplicate realm names and on a default realm that
    /// is not configured.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let mut auth = Self::new();
        auth.set_use_session(config.use_session);

        for realm_config in &config.realms {
            let realm = Realm::new(
                MemoryStore::from_config(&realm_config.store)?,
                PasswordCredential::from_config(&realm_config.credential),
            );
            auth.add_realm(realm_config.name.clone(), realm, realm_config.default)?;
        }

        if let Some(name) = &config.default_realm {
            auth.set_default_realm(name)?;
        }

        tracing::debug!(
            realms = auth.len(),
            default_realm = auth.default_realm().unwrap_or(""),
            "Authentication configured"
        );
        Ok(auth)
    }
}
