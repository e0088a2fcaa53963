//! Credential implementations
//!
//! This module contains implementations of the `Credential` trait:
//! - `password`: username/password check against the realm's store

pub mod password;

pub use password::{PasswordCredential, PasswordType};
