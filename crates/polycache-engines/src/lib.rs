//! # polycache engines
//!
//! Backend implementations of the [`CacheEngine`] contract defined in
//! `polycache-domain`:
//!
//! | Engine | Feature | Storage |
//! |--------|---------|---------|
//! | [`FileEngine`] | `engine-filesystem` | one file per key, embedded expiry stamp |
//! | [`RedisEngine`] | `engine-redis` | single-node Redis, native TTL and counters |
//! | [`RedisClusterEngine`] | `engine-redis-cluster` | sharded Redis Cluster |
//! | [`NullEngine`] | always | nothing; every read misses |
//!
//! Engines are constructed through [`build`] with a [`Backend`] tag and an
//! `EngineConfig`, or directly via each engine's `new`. Construction is
//! fallible; a live engine value means initialization succeeded.

/// Engine-specific constants
pub mod constants;
/// Backend selection and construction
pub mod factory;
/// No-op engine for tests and disabled caching
pub mod null;

/// Filesystem engine
#[cfg(feature = "engine-filesystem")]
pub mod filesystem;

/// Single-node Redis engine
#[cfg(feature = "engine-redis")]
pub mod redis;

/// Redis Cluster engine
#[cfg(feature = "engine-redis-cluster")]
pub mod redis_cluster;

pub use factory::{Backend, build};
pub use null::NullEngine;

#[cfg(feature = "engine-filesystem")]
pub use filesystem::FileEngine;
#[cfg(feature = "engine-redis")]
pub use redis::RedisEngine;
#[cfg(feature = "engine-redis-cluster")]
pub use redis_cluster::RedisClusterEngine;

// Re-export the contract so engine consumers need only this crate
pub use polycache_domain::ports::engine::{AddAtomicity, CacheEngine};
