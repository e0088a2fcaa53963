//! Store implementations
//!
//! This module contains implementations of the `Store` trait:
//! - `memory`: in-memory store seeded from config

pub mod memory;

pub use memory::MemoryStore;
