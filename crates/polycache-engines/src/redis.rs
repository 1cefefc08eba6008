//! Redis cache engine
//!
//! Stores each key as a Redis entry with native TTL over one multiplexed
//! async connection opened at construction. Counters delegate to Redis's
//! atomic INCRBY/DECRBY, `add` maps to SET NX, and group invalidation is a
//! version-counter bump (INCR) rather than deletion; stale entries survive
//! under old group labels until their own TTL fires.
//!
//! With `persistent` enabled the connection lives in a process-wide slot
//! keyed by address, database, and timeout, amortizing connect cost across
//! engine instances; the slot is populated once and never re-authenticated
//! or re-pointed afterward.

use crate::constants::{GROUP_COUNTER_INITIAL, SCAN_BATCH_SIZE};
use async_trait::async_trait;
use dashmap::DashMap;
use polycache_domain::error::{Error, Result};
use polycache_domain::ports::engine::{AddAtomicity, CacheEngine};
use polycache_domain::value_objects::config::EngineConfig;
use polycache_domain::value_objects::key::normalize;
use polycache_domain::value_objects::ttl::Ttl;
use polycache_domain::value_objects::value::Value;
use redis::aio::MultiplexedConnection;
use redis::{Client, ConnectionAddr, IntoConnectionInfo, RedisConnectionInfo};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tokio::time::timeout;

/// Process-wide persistent-connection slots; lifetime = the process.
static PERSISTENT_CONNECTIONS: LazyLock<DashMap<String, MultiplexedConnection>> =
    LazyLock::new(DashMap::new);

/// Redis cache engine
///
/// One multiplexed connection per engine instance (or per persistent slot),
/// one round trip per logical operation, no client-side retry.
#[derive(Clone)]
pub struct RedisEngine {
    config: EngineConfig,
    connection: MultiplexedConnection,
}

impl fmt::Debug for RedisEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisEngine")
            .field("server", &self.config.server)
            .field("port", &self.config.port)
            .field("database", &self.config.database)
            .field("prefix", &self.config.prefix)
            .field("persistent", &self.config.persistent)
            .finish()
    }
}

impl RedisEngine {
    /// Create a Redis engine, connecting (or attaching to the persistent
    /// slot) within the configured timeout. Authentication and database
    /// selection travel in the connection parameters.
    pub async fn new(config: EngineConfig) -> Result<Self> {
        let connection = if config.persistent {
            let slot = persistent_slot_key(&config);
            match PERSISTENT_CONNECTIONS.get(&slot) {
                Some(existing) => existing.clone(),
                None => {
                    let fresh = connect(&config).await?;
                    PERSISTENT_CONNECTIONS.insert(slot, fresh.clone());
                    fresh
                }
            }
        } else {
            connect(&config).await?
        };

        Ok(Self { config, connection })
    }

    fn key(&self, raw: &str) -> Result<String> {
        normalize(raw, &self.config.prefix)
    }

    fn conn(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Fetch a group counter, lazily initializing it to 1 on first access.
    async fn group_version(&self, group: &str) -> Result<i64> {
        let counter_key = format!("{}{}", self.config.prefix, group);
        let mut conn = self.conn();

        let stored: Option<i64> = redis::cmd("GET")
            .arg(&counter_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis GET group counter failed", e))?;

        if let Some(version) = stored {
            return Ok(version);
        }

        // SET NX so a concurrent initializer cannot reset an existing counter
        redis::cmd("SET")
            .arg(&counter_key)
            .arg(GROUP_COUNTER_INITIAL)
            .arg("NX")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis group counter init failed", e))?;
        tracing::debug!(group, "initialized group counter");

        let version: i64 = redis::cmd("GET")
            .arg(&counter_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis GET group counter failed", e))?;
        Ok(version)
    }
}

#[async_trait]
impl CacheEngine for RedisEngine {
    async fn write(&self, key: &str, value: &Value, ttl: Option<Ttl>) -> Result<()> {
        let key = self.key(key)?;
        let payload = value.encode()?;
        let ttl = ttl.unwrap_or(self.config.duration);
        let mut conn = self.conn();

        if ttl.is_forever() {
            redis::cmd("SET")
                .arg(&key)
                .arg(payload)
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| Error::backend_with_source("redis SET failed", e))?;
        } else {
            redis::cmd("SETEX")
                .arg(&key)
                .arg(ttl.as_secs())
                .arg(payload)
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| Error::backend_with_source("redis SETEX failed", e))?;
        }
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Value>> {
        let key = self.key(key)?;
        let mut conn = self.conn();

        let fetched: Option<Vec<u8>> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis GET failed", e))?;

        let Some(payload) = fetched else {
            return Ok(None);
        };
        match Value::decode(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_corrupt_entry() => {
                tracing::warn!(key, error = %e, "corrupt cache entry treated as miss");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let key = self.key(key)?;
        let mut conn = self.conn();

        let removed: i64 = redis::cmd("DEL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis DEL failed", e))?;
        Ok(removed > 0)
    }

    async fn clear(&self, only_expired: bool) -> Result<()> {
        if only_expired {
            // Redis expires entries natively; nothing to collect.
            return Ok(());
        }

        let pattern = format!("{}*", self.config.prefix);
        let mut conn = self.conn();
        let mut cursor: u64 = 0;
        let mut keys: Vec<String> = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::backend_with_source("redis SCAN failed", e))?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        if !keys.is_empty() {
            let removed: i64 = redis::cmd("DEL")
                .arg(&keys)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::backend_with_source("redis DEL failed", e))?;
            tracing::debug!(removed, "cleared redis cache entries");
        }
        Ok(())
    }

    async fn increment(&self, key: &str, offset: i64) -> Result<i64> {
        let key = self.key(key)?;
        let mut conn = self.conn();

        redis::cmd("INCRBY")
            .arg(&key)
            .arg(offset)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis INCRBY failed", e))
    }

    async fn decrement(&self, key: &str, offset: i64) -> Result<i64> {
        let key = self.key(key)?;
        let mut conn = self.conn();

        redis::cmd("DECRBY")
            .arg(&key)
            .arg(offset)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis DECRBY failed", e))
    }

    async fn add(&self, key: &str, value: &Value, ttl: Option<Ttl>) -> Result<bool> {
        let key = self.key(key)?;
        let payload = value.encode()?;
        let ttl = ttl.unwrap_or(self.config.duration);
        let mut conn = self.conn();

        let mut cmd = redis::cmd("SET");
        cmd.arg(&key).arg(payload).arg("NX");
        if !ttl.is_forever() {
            cmd.arg("EX").arg(ttl.as_secs());
        }
        let reply: Option<String> = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis SET NX failed", e))?;
        Ok(reply.is_some())
    }

    async fn read_multiple(
        &self,
        keys: &[&str],
        default: Option<&Value>,
    ) -> Result<HashMap<String, Value>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut normalized = Vec::with_capacity(keys.len());
        for key in keys {
            normalized.push(self.key(key)?);
        }
        let mut conn = self.conn();

        let fetched: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(&normalized)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis MGET failed", e))?;

        let mut found = HashMap::with_capacity(keys.len());
        for (raw, payload) in keys.iter().zip(fetched) {
            let value = match payload {
                Some(bytes) => match Value::decode(&bytes) {
                    Ok(value) => Some(value),
                    Err(e) if e.is_corrupt_entry() => {
                        tracing::warn!(key = raw, error = %e,
                            "corrupt cache entry treated as miss");
                        None
                    }
                    Err(e) => return Err(e),
                },
                None => None,
            };
            if let Some(value) = value.or_else(|| default.cloned()) {
                found.insert((*raw).to_string(), value);
            }
        }
        Ok(found)
    }

    async fn write_multiple(&self, entries: &[(String, Value)], ttl: Option<Ttl>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let ttl = ttl.unwrap_or(self.config.duration);
        let mut pairs = Vec::with_capacity(entries.len());
        for (raw, value) in entries {
            pairs.push((self.key(raw)?, value.encode()?));
        }
        let mut conn = self.conn();

        let mut cmd = redis::cmd("MSET");
        for (key, payload) in &pairs {
            cmd.arg(key).arg(payload.as_slice());
        }
        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis MSET failed", e))?;

        // MSET carries no expiry; partial failure here leaves earlier keys
        // written without rollback, per the contract.
        if !ttl.is_forever() {
            for (key, _) in &pairs {
                redis::cmd("EXPIRE")
                    .arg(key)
                    .arg(ttl.as_secs())
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| Error::backend_with_source("redis EXPIRE failed", e))?;
            }
        }
        Ok(())
    }

    async fn groups(&self) -> Result<Vec<String>> {
        let mut labels = Vec::with_capacity(self.config.groups.len());
        for group in &self.config.groups {
            let version = self.group_version(group).await?;
            labels.push(format!("{group}{version}"));
        }
        Ok(labels)
    }

    async fn clear_group(&self, group: &str) -> Result<()> {
        let counter_key = format!("{}{}", self.config.prefix, group);
        let mut conn = self.conn();

        let version: i64 = redis::cmd("INCR")
            .arg(&counter_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("redis INCR group counter failed", e))?;
        tracing::debug!(group, version, "bumped group version");
        Ok(())
    }

    fn add_atomicity(&self) -> AddAtomicity {
        AddAtomicity::Atomic
    }

    fn engine_name(&self) -> &str {
        "redis"
    }
}

/// Slot identity for persistent connections: two engines share a handle
/// only when address, database, and timeout all match.
fn persistent_slot_key(config: &EngineConfig) -> String {
    match &config.unix_socket {
        Some(path) => format!(
            "unix:{}|{}|{}",
            path.display(),
            config.database,
            config.timeout.as_secs()
        ),
        None => format!(
            "tcp:{}:{}|{}|{}",
            config.server,
            config.port,
            config.database,
            config.timeout.as_secs()
        ),
    }
}

/// Open a multiplexed connection, bounded by the configured connect
/// timeout (zero waits indefinitely), and verify it with a PING.
async fn connect(config: &EngineConfig) -> Result<MultiplexedConnection> {
    let addr = match &config.unix_socket {
        Some(path) => ConnectionAddr::Unix(path.clone()),
        None => ConnectionAddr::Tcp(config.server.clone(), config.port),
    };
    let mut redis_info = RedisConnectionInfo::default().set_db(config.database);
    if let Some(password) = &config.password {
        redis_info = redis_info.set_password(password);
    }
    let info = addr
        .into_connection_info()
        .map_err(|e| Error::initialization_with_source("failed to create redis client", e))?
        .set_redis_settings(redis_info);

    let client = Client::open(info)
        .map_err(|e| Error::initialization_with_source("failed to create redis client", e))?;

    let connecting = client.get_multiplexed_async_connection();
    let mut conn = if config.timeout.is_zero() {
        connecting.await
    } else {
        timeout(config.timeout, connecting).await.map_err(|_| {
            Error::initialization(format!(
                "redis connection to {}:{} timed out after {:?}",
                config.server, config.port, config.timeout
            ))
        })?
    }
    .map_err(|e| {
        Error::initialization_with_source(
            format!("failed to connect to redis at {}:{}", config.server, config.port),
            e,
        )
    })?;

    let pong: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| Error::initialization_with_source("redis ping failed", e))?;
    if pong != "PONG" {
        return Err(Error::initialization("redis ping did not return PONG"));
    }

    tracing::debug!(
        server = %config.server,
        port = config.port,
        database = config.database,
        "redis connection established"
    );
    Ok(conn)
}
