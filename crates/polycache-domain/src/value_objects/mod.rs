//! Domain Value Objects
//!
//! Immutable value objects shared by every backend. Value objects are
//! defined by their attributes and compared for equality.
//!
//! ## Value Objects
//!
//! | Value Object | Description |
//! |--------------|-------------|
//! | [`Value`] | Closed cacheable value type with its storage codec |
//! | [`Ttl`] | Time-to-live in seconds, zero = never expires |
//! | [`EngineConfig`] | Full recognized-option surface, built via `with_*` |
//! | [`FailoverPolicy`] | Read-failover behavior for the clustered backend |

/// Engine configuration and failover policy
pub mod config;
/// Key normalization
pub mod key;
/// Time-to-live parsing and expiry stamps
pub mod ttl;
/// Cache values and the storage codec
pub mod value;

// Re-export commonly used value objects
pub use config::{EngineConfig, FailoverPolicy};
pub use key::normalize;
pub use ttl::Ttl;
pub use value::Value;
