//! Null cache engine
//!
//! Accepts every operation and stores nothing; every read is a miss.
//! Useful for tests and for disabling caching without touching call sites.

use async_trait::async_trait;
use polycache_domain::error::Result;
use polycache_domain::ports::engine::{AddAtomicity, CacheEngine};
use polycache_domain::value_objects::config::EngineConfig;
use polycache_domain::value_objects::key::normalize;
use polycache_domain::value_objects::ttl::Ttl;
use polycache_domain::value_objects::value::Value;

/// Null cache engine
///
/// Writes succeed, reads miss, deletes report the key as absent. Counters
/// behave as Redis does on a missing key (start from zero), so callers that
/// disable caching keep working.
#[derive(Debug, Clone)]
pub struct NullEngine {
    config: EngineConfig,
}

impl NullEngine {
    /// Create a null engine; construction cannot fail.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new(EngineConfig::new())
    }
}

#[async_trait]
impl CacheEngine for NullEngine {
    async fn write(&self, key: &str, _value: &Value, _ttl: Option<Ttl>) -> Result<()> {
        // the key still has to be valid, even if nothing is stored
        normalize(key, &self.config.prefix)?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Value>> {
        normalize(key, &self.config.prefix)?;
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        normalize(key, &self.config.prefix)?;
        Ok(false)
    }

    async fn clear(&self, _only_expired: bool) -> Result<()> {
        Ok(())
    }

    async fn increment(&self, key: &str, offset: i64) -> Result<i64> {
        normalize(key, &self.config.prefix)?;
        Ok(offset)
    }

    async fn decrement(&self, key: &str, offset: i64) -> Result<i64> {
        normalize(key, &self.config.prefix)?;
        Ok(-offset)
    }

    async fn groups(&self) -> Result<Vec<String>> {
        Ok(self.config.groups.clone())
    }

    async fn clear_group(&self, _group: &str) -> Result<()> {
        Ok(())
    }

    fn add_atomicity(&self) -> AddAtomicity {
        // no state, so there is nothing for concurrent adds to race on
        AddAtomicity::Atomic
    }

    fn engine_name(&self) -> &str {
        "null"
    }
}
