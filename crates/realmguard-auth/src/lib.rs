//! Realmguard Authentication
//!
//! This crate provides:
//! - A realm registry (`Authentication`) pairing pluggable stores with
//!   pluggable credential checks
//! - Per-request tracking of the authenticated user
//! - Persisting and restoring the user through a session collaborator
//! - An in-memory store, a password credential and an in-memory session
//!
//! # Features
//!
//! - `argon2` (default): Argon2 PHC passwords in `PasswordCredential`
//!
//! # Example
//!
//! ```rust,ignore
//! use realmguard_auth::{Authentication, MemorySession, MemoryStore, PasswordCredential, Realm, RequestContext};
//! use std::sync::Arc;
//!
//! let mut auth = Authentication::new();
//! auth.add_default_realm(Realm::new(MemoryStore::new(), PasswordCredential::default()))?;
//!
//! let sessions = Arc::new(MemorySession::new());
//! let mut ctx = RequestContext::new().with_session(sessions).with_session_id("cookie-value");
//! let user = auth.authenticate_with_password(&mut ctx, "alice", "secret", None)?;
//! ```

// Core modules
pub mod context;
pub mod credential;
pub mod error;
pub mod manager;
pub mod realm;
pub mod session;
pub mod store;
pub mod user;

// Pluggable implementations
pub mod config;
pub mod credentials;
pub mod stores;

#[cfg(test)]
mod test_support;

// Re-export core types
pub use context::RequestContext;
pub use credential::Credential;
pub use error::AuthError;
pub use manager::{Authentication, DEFAULT_REALM, USER_PROPERTY};
pub use realm::Realm;
pub use session::{MemorySession, Session, USER_KEY, USER_REALM_KEY};
pub use store::{Store, UserInfo};
pub use user::User;

// Re-export implementations
pub use config::{AuthConfig, MemoryStoreConfig, PasswordCredentialConfig, RealmConfig, UserConfig};
pub use credentials::{PasswordCredential, PasswordType};
pub use stores::MemoryStore;
