//! Engine factory
//!
//! The closed set of backends behind one polymorphic contract: a [`Backend`]
//! tag selected at configuration time plus [`build`], which constructs the
//! matching engine from an [`EngineConfig`]. No runtime registry, no
//! late-bound lookup.

use polycache_domain::error::{Error, Result};
use polycache_domain::ports::engine::CacheEngine;
use polycache_domain::value_objects::config::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// One file per key under a directory tree
    Filesystem,
    /// Single-node Redis
    Redis,
    /// Sharded Redis Cluster
    RedisCluster,
    /// Stores nothing; every read misses
    Null,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "filesystem" | "file" => Ok(Backend::Filesystem),
            "redis" => Ok(Backend::Redis),
            "redis-cluster" => Ok(Backend::RedisCluster),
            "null" => Ok(Backend::Null),
            other => Err(Error::initialization(format!(
                "unknown cache backend {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Filesystem => "filesystem",
            Backend::Redis => "redis",
            Backend::RedisCluster => "redis-cluster",
            Backend::Null => "null",
        };
        f.write_str(name)
    }
}

/// Construct the engine for `backend` from `config`.
///
/// Initialization failures (unreachable server, unwritable directory,
/// unsupported configuration) surface here; the returned engine is live.
/// Selecting a backend whose feature is not compiled in is an
/// initialization error, not a panic.
pub async fn build(backend: Backend, config: EngineConfig) -> Result<Arc<dyn CacheEngine>> {
    match backend {
        #[cfg(feature = "engine-filesystem")]
        Backend::Filesystem => Ok(Arc::new(crate::filesystem::FileEngine::new(config).await?)),
        #[cfg(not(feature = "engine-filesystem"))]
        Backend::Filesystem => Err(Error::initialization(
            "filesystem backend not compiled in; enable the engine-filesystem feature",
        )),

        #[cfg(feature = "engine-redis")]
        Backend::Redis => Ok(Arc::new(crate::redis::RedisEngine::new(config).await?)),
        #[cfg(not(feature = "engine-redis"))]
        Backend::Redis => Err(Error::initialization(
            "redis backend not compiled in; enable the engine-redis feature",
        )),

        #[cfg(feature = "engine-redis-cluster")]
        Backend::RedisCluster => Ok(Arc::new(
            crate::redis_cluster::RedisClusterEngine::new(config).await?,
        )),
        #[cfg(not(feature = "engine-redis-cluster"))]
        Backend::RedisCluster => Err(Error::initialization(
            "redis-cluster backend not compiled in; enable the engine-redis-cluster feature",
        )),

        Backend::Null => Ok(Arc::new(crate::null::NullEngine::new(config))),
    }
}
