//! Cache Engine Port
//!
//! The contract every storage backend implements. Backends are
//! interchangeable through this trait; the active one determines
//! durability, latency, and failure characteristics.
//!
//! ## Initialization
//!
//! Constructing an engine is fallible: a backend that cannot initialize
//! (unreachable server, unwritable directory, unsupported configuration)
//! returns [`Error::Initialization`](crate::error::Error::Initialization)
//! from its constructor and no engine value exists. There is no failed
//! instance to guard against and no recovery path; construct a new engine
//! after fixing the cause.
//!
//! ## Default behavior
//!
//! `add`, `read_multiple`, and `write_multiple` ship generic
//! implementations in terms of `read`/`write`. The default `add` is
//! check-then-write and has a race window between the check and the write;
//! backends with a native set-if-absent MUST override it and every backend
//! states what it provides via [`CacheEngine::add_atomicity`].

use crate::error::Result;
use crate::value_objects::ttl::Ttl;
use crate::value_objects::value::Value;
use async_trait::async_trait;
use std::collections::HashMap;

/// Whether a backend's `add` is atomic or carries the documented race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddAtomicity {
    /// `add` maps to a native set-if-absent; concurrent callers cannot both
    /// succeed
    Atomic,
    /// `add` is read-then-write; two concurrent callers may both observe a
    /// miss and both write, last one winning
    CheckThenWrite,
}

/// Cache Engine Port
///
/// Uniform operation set over one backend's keyspace. Every operation
/// normalizes its raw key, applies the backend's own expiration and
/// atomicity mechanism, and reports failures through its `Result`. A
/// transient failure never poisons the engine, and no retry happens at
/// this layer.
///
/// # Implementations
///
/// - **Filesystem**: one file per key, embedded expiry stamp, advisory locks
/// - **Redis**: native TTL and atomic counters over one multiplexed connection
/// - **Redis Cluster**: same surface over a sharded topology
/// - **Null**: accepts everything, stores nothing
#[async_trait]
pub trait CacheEngine: Send + Sync + std::fmt::Debug {
    /// Store `value` under `key`.
    ///
    /// `ttl == None` uses the engine's configured default duration; a zero
    /// TTL stores the entry without expiry. The filesystem backend rejects
    /// an explicitly empty string value (ambiguous with "absent"); remote
    /// backends permit it.
    async fn write(&self, key: &str, value: &Value, ttl: Option<Ttl>) -> Result<()>;

    /// Fetch the value under `key`.
    ///
    /// `None` is returned uniformly whether the key never existed, has
    /// expired, or its payload failed to decode (corrupt entries are logged
    /// and reported as misses, never as errors).
    async fn read(&self, key: &str) -> Result<Option<Value>>;

    /// Remove the entry under `key`.
    ///
    /// Deleting an absent key is not an error; it returns `false`.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove entries owned by this engine's prefix.
    ///
    /// `only_expired = false` removes every key under the prefix.
    /// `only_expired = true` is a garbage-collection pass removing only
    /// entries past their expiry stamp; backends whose store already
    /// auto-expires treat it as a cheap no-op returning success.
    async fn clear(&self, only_expired: bool) -> Result<()>;

    /// Atomically add `offset` to the integer under `key`, returning the
    /// new value. Backends without native atomic counters return
    /// [`Error::Unsupported`](crate::error::Error::Unsupported).
    async fn increment(&self, key: &str, offset: i64) -> Result<i64>;

    /// Atomically subtract `offset` from the integer under `key`, returning
    /// the new value. Backends without native atomic counters return
    /// [`Error::Unsupported`](crate::error::Error::Unsupported).
    async fn decrement(&self, key: &str, offset: i64) -> Result<i64>;

    /// Store `value` under `key` only if the key is absent; `true` when the
    /// write happened.
    ///
    /// Default semantics are check-then-write with a race window between
    /// the check and the write. Backends with a native set-if-absent MUST
    /// override this; [`add_atomicity`](CacheEngine::add_atomicity) states
    /// which behavior the backend provides.
    async fn add(&self, key: &str, value: &Value, ttl: Option<Ttl>) -> Result<bool> {
        if self.read(key).await?.is_some() {
            return Ok(false);
        }
        self.write(key, value, ttl).await?;
        Ok(true)
    }

    /// Fetch several keys at once.
    ///
    /// Keys that miss (absent, expired, or corrupt) map to `default`, or
    /// are omitted when `default` is unset. The generic implementation
    /// loops [`read`](CacheEngine::read); backends with a native multi-get
    /// may override.
    async fn read_multiple(
        &self,
        keys: &[&str],
        default: Option<&Value>,
    ) -> Result<HashMap<String, Value>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            match self.read(key).await? {
                Some(value) => {
                    found.insert((*key).to_string(), value);
                }
                None => {
                    if let Some(fallback) = default {
                        found.insert((*key).to_string(), fallback.clone());
                    }
                }
            }
        }
        Ok(found)
    }

    /// Store several entries at once.
    ///
    /// All-or-nothing is NOT guaranteed: the first failure is returned and
    /// entries already written stay written, with no rollback. The generic
    /// implementation loops [`write`](CacheEngine::write); backends with a
    /// native multi-set may override, keeping the same partial-failure
    /// contract.
    async fn write_multiple(&self, entries: &[(String, Value)], ttl: Option<Ttl>) -> Result<()> {
        for (key, value) in entries {
            self.write(key, value, ttl).await?;
        }
        Ok(())
    }

    /// One label per configured group, used by upstream key composition.
    ///
    /// Remote backends return versioned labels (`groupName + counterValue`),
    /// lazily initializing each counter to 1; the filesystem backend
    /// returns the configured names as-is since its groups are physical
    /// sub-directories.
    async fn groups(&self) -> Result<Vec<String>>;

    /// Invalidate every entry tagged with `group`: by version-counter bump
    /// on remote backends (stale entries survive until their own expiry),
    /// by physical file deletion on the filesystem backend.
    async fn clear_group(&self, group: &str) -> Result<()>;

    /// Whether this backend's [`add`](CacheEngine::add) is atomic
    fn add_atomicity(&self) -> AddAtomicity;

    /// Stable identifier for the backend (`"filesystem"`, `"redis"`,
    /// `"redis-cluster"`, `"null"`)
    fn engine_name(&self) -> &str;
}
