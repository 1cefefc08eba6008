//! Domain Port Interfaces
//!
//! Defines the boundary contract between the domain and the backend
//! implementations. The domain owns the interface; `polycache-engines`
//! implements it.

/// Cache engine contract
pub mod engine;

// Re-export the port for convenience
pub use engine::{AddAtomicity, CacheEngine};
