//! Authentication error types

use thiserror::Error;

/// Authentication errors
///
/// Failed verification is not an error: credentials that do not match
/// produce `Ok(None)`. These variants cover registration mistakes and
/// backend failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("realm already registered: {0}")]
    DuplicateRealm(String),

    #[error("realm name must not be empty")]
    InvalidRealmName,

    #[error("default realm is not registered: {0}")]
    UnknownDefaultRealm(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("password hash error: {0}")]
    PasswordHash(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for AuthError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
