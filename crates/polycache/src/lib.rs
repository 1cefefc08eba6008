//! # polycache
//!
//! A pluggable key-value caching layer: one abstract contract
//! ([`CacheEngine`]) implemented by interchangeable storage backends.
//! Callers write through one uniform API; the active backend determines
//! durability, latency, and failure characteristics.
//!
//! ## Backends
//!
//! - **Filesystem**: one file per key with an embedded expiry stamp,
//!   optional advisory locking, group sub-directories
//! - **Redis**: single node, native TTL, atomic counters, versioned
//!   group invalidation
//! - **Redis Cluster**: the same surface over a sharded topology with
//!   per-master bulk scans and a read-failover policy
//! - **Null**: stores nothing; for tests and disabled caching
//!
//! ## Example
//!
//! ```no_run
//! use polycache::{build, Backend, CacheEngine, EngineConfig, Ttl, Value};
//!
//! # async fn demo() -> polycache::Result<()> {
//! let config = EngineConfig::new()
//!     .with_prefix("app_")
//!     .with_duration(Ttl::from_secs(600))
//!     .with_path("/var/cache/app");
//! let cache = build(Backend::Filesystem, config).await?;
//!
//! cache.write("greeting", &Value::from("hello"), None).await?;
//! assert_eq!(cache.read("greeting").await?, Some(Value::from("hello")));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `polycache-domain`: the contract and pure leaf logic (errors,
//!   [`Value`] and its codec, key normalization, [`Ttl`], [`EngineConfig`])
//! - `polycache-engines`: the backend implementations and the closed-enum
//!   factory
//! - `polycache` (this crate): the façade consumers depend on, with all
//!   engines enabled by default

pub use polycache_domain::error::{Error, Result};
pub use polycache_domain::ports::engine::{AddAtomicity, CacheEngine};
pub use polycache_domain::value_objects::config::{EngineConfig, FailoverPolicy};
pub use polycache_domain::value_objects::key::normalize;
pub use polycache_domain::value_objects::ttl::Ttl;
pub use polycache_domain::value_objects::value::Value;

pub use polycache_engines::factory::{Backend, build};
pub use polycache_engines::null::NullEngine;

#[cfg(feature = "engine-filesystem")]
pub use polycache_engines::filesystem::FileEngine;
#[cfg(feature = "engine-redis")]
pub use polycache_engines::redis::RedisEngine;
#[cfg(feature = "engine-redis-cluster")]
pub use polycache_engines::redis_cluster::RedisClusterEngine;
