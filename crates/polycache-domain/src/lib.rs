//! # polycache domain layer
//!
//! Core types for the polycache caching layer: the [`CacheEngine`] contract,
//! the [`Value`] codec, key normalization, TTL handling, and the engine
//! configuration surface. This crate is pure (no I/O, no logging), so the
//! contract and its leaf logic stay testable without a backend.
//!
//! Backend implementations live in `polycache-engines`; consumers usually
//! depend on the `polycache` façade instead of this crate directly.

/// Domain layer constants
pub mod constants;
/// Error handling types
pub mod error;
/// Boundary contracts implemented by backends
pub mod ports;
/// Immutable value objects
pub mod value_objects;

// Re-export the public surface
pub use error::{Error, Result};
pub use ports::{AddAtomicity, CacheEngine};
pub use value_objects::config::{EngineConfig, FailoverPolicy};
pub use value_objects::key::normalize;
pub use value_objects::ttl::Ttl;
pub use value_objects::value::Value;
