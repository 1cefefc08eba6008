//! Domain layer constants
//!
//! Defaults shared by every backend. Backend-specific tunables live in
//! `polycache-engines`.

/// Default key prefix applied by the normalizer
pub const DEFAULT_PREFIX: &str = "cache_";

/// Default entry duration in seconds (one hour)
pub const DEFAULT_DURATION_SECS: u64 = 3600;

/// Separator substituted for whitespace and path-like characters in keys
pub const KEY_SEPARATOR: char = '_';

/// Default single-node server address
pub const DEFAULT_SERVER: &str = "127.0.0.1";

/// Default Redis port
pub const DEFAULT_PORT: u16 = 6379;

/// Default cluster seed node
pub const DEFAULT_CLUSTER_SEED: &str = "127.0.0.1:7000";

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
