//! Redis Cluster cache engine
//!
//! Same contract surface as the single-node engine over a sharded
//! topology. Single-key commands (GET, SETEX, INCRBY, SET NX) route to the
//! slot owner through the cluster client, so counters and group versioning
//! work exactly as on a single node. Multi-key reads and writes keep the
//! looped trait defaults because cross-slot MGET/MSET is not uniformly
//! available.
//!
//! Bulk clear is topology-aware: no single node holds the whole keyspace,
//! so the engine discovers every shard-owning master via CLUSTER SLOTS and
//! runs a cursor-based SCAN against each one by address, deleting matches
//! per batch until that shard's cursor returns to zero.

use crate::constants::{GROUP_COUNTER_INITIAL, SCAN_BATCH_SIZE};
use async_trait::async_trait;
use dashmap::DashMap;
use polycache_domain::error::{Error, Result};
use polycache_domain::ports::engine::{AddAtomicity, CacheEngine};
use polycache_domain::value_objects::config::EngineConfig;
use polycache_domain::value_objects::key::normalize;
use polycache_domain::value_objects::ttl::Ttl;
use polycache_domain::value_objects::value::Value as CacheValue;
use redis::cluster::ClusterClientBuilder;
use redis::cluster_async::ClusterConnection;
use redis::cluster_routing::{RoutingInfo, SingleNodeRoutingInfo};
use std::fmt;
use std::sync::LazyLock;
use tokio::time::timeout;

/// Process-wide persistent-connection slots keyed by the seed list.
static PERSISTENT_CONNECTIONS: LazyLock<DashMap<String, ClusterConnection>> =
    LazyLock::new(DashMap::new);

/// Redis Cluster cache engine
#[derive(Clone)]
pub struct RedisClusterEngine {
    config: EngineConfig,
    connection: ClusterConnection,
}

impl fmt::Debug for RedisClusterEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisClusterEngine")
            .field("seeds", &self.config.seeds)
            .field("prefix", &self.config.prefix)
            .field("failover", &self.config.failover)
            .field("persistent", &self.config.persistent)
            .finish()
    }
}

impl RedisClusterEngine {
    /// Create a cluster engine from the configured seed nodes.
    ///
    /// A non-zero `database` is rejected at construction: Redis Cluster has
    /// no SELECT, and failing fast beats a runtime surprise. The failover
    /// policy's `distribute` variants enable replica reads in the client.
    pub async fn new(config: EngineConfig) -> Result<Self> {
        if config.database != 0 {
            return Err(Error::initialization(
                "redis cluster does not support database selection; leave database at 0",
            ));
        }
        if config.seeds.is_empty() {
            return Err(Error::initialization("no cluster seed nodes configured"));
        }

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

    fn conn(&self) -> ClusterConnection {
        self.connection.clone()
    }

    async fn group_version(&self, group: &str) -> Result<i64> {
        let counter_key = format!("{}{}", self.config.prefix, group);
        let mut conn = self.conn();

        let stored: Option<i64> = redis::cmd("GET")
            .arg(&counter_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("cluster GET group counter failed", e))?;

        if let Some(version) = stored {
            return Ok(version);
        }

        redis::cmd("SET")
            .arg(&counter_key)
            .arg(GROUP_COUNTER_INITIAL)
            .arg("NX")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("cluster group counter init failed", e))?;
        tracing::debug!(group, "initialized group counter");

        let version: i64 = redis::cmd("GET")
            .arg(&counter_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("cluster GET group counter failed", e))?;
        Ok(version)
    }

    /// Addresses of every shard-owning master, from CLUSTER SLOTS.
    async fn master_addresses(&self) -> Result<Vec<(String, u16)>> {
        let mut conn = self.conn();
        let mut slots_cmd = redis::cmd("CLUSTER");
        slots_cmd.arg("SLOTS");
        let reply = conn
            .route_command(
                slots_cmd,
                RoutingInfo::SingleNode(SingleNodeRoutingInfo::Random),
            )
            .await
            .map_err(|e| Error::backend_with_source("CLUSTER SLOTS failed", e))?;

        let mut masters = parse_master_addresses(&reply)?;
        masters.sort();
        masters.dedup();
        Ok(masters)
    }

    /// Incremental SCAN against one master by address, deleting each
    /// matched key per batch, until the cursor returns to its start value.
    async fn clear_master(&self, host: &str, port: u16, pattern: &str) -> Result<usize> {
        let routing = RoutingInfo::SingleNode(SingleNodeRoutingInfo::ByAddress {
            host: host.to_string(),
            port,
        });
        let mut conn = self.conn();
        let mut cursor: u64 = 0;
        let mut removed = 0usize;

        loop {
            let mut scan = redis::cmd("SCAN");
            scan.arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE);
            let reply = conn
                .route_command(scan, routing.clone())
                .await
                .map_err(|e| Error::backend_with_source("cluster SCAN failed", e))?;
            let (next, batch): (u64, Vec<String>) = redis::from_redis_value(reply)
                .map_err(|e| Error::backend_with_source("unexpected SCAN reply shape", e))?;

            // DEL per key: multi-key DEL is slot-constrained in a cluster
            for key in batch {
                redis::cmd("DEL")
                    .arg(&key)
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| Error::backend_with_source("cluster DEL failed", e))?;
                removed += 1;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        tracing::debug!(host, port, removed, "cleared cluster shard");
        Ok(removed)
    }
}

#[async_trait]
impl CacheEngine for RedisClusterEngine {
    async fn write(&self, key: &str, value: &CacheValue, ttl: Option<Ttl>) -> Result<()> {
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
                .map_err(|e| Error::backend_with_source("cluster SET failed", e))?;
        } else {
            redis::cmd("SETEX")
                .arg(&key)
                .arg(ttl.as_secs())
                .arg(payload)
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| Error::backend_with_source("cluster SETEX failed", e))?;
        }
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<CacheValue>> {
        let key = self.key(key)?;
        let mut conn = self.conn();

        let fetched: Option<Vec<u8>> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("cluster GET failed", e))?;

        let Some(payload) = fetched else {
            return Ok(None);
        };
        match CacheValue::decode(&payload) {
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
            .map_err(|e| Error::backend_with_source("cluster DEL failed", e))?;
        Ok(removed > 0)
    }

    async fn clear(&self, only_expired: bool) -> Result<()> {
        if only_expired {
            // native expiry, nothing to collect
            return Ok(());
        }

        let pattern = format!("{}*", self.config.prefix);
        let mut removed = 0usize;
        for (host, port) in self.master_addresses().await? {
            removed += self.clear_master(&host, port, &pattern).await?;
        }
        tracing::debug!(removed, "cleared cluster cache entries");
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
            .map_err(|e| Error::backend_with_source("cluster INCRBY failed", e))
    }

    async fn decrement(&self, key: &str, offset: i64) -> Result<i64> {
        let key = self.key(key)?;
        let mut conn = self.conn();

        redis::cmd("DECRBY")
            .arg(&key)
            .arg(offset)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source("cluster DECRBY failed", e))
    }

    async fn add(&self, key: &str, value: &CacheValue, ttl: Option<Ttl>) -> Result<bool> {
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
            .map_err(|e| Error::backend_with_source("cluster SET NX failed", e))?;
        Ok(reply.is_some())
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
            .map_err(|e| Error::backend_with_source("cluster INCR group counter failed", e))?;
        tracing::debug!(group, version, "bumped group version");
        Ok(())
    }

    fn add_atomicity(&self) -> AddAtomicity {
        AddAtomicity::Atomic
    }

    fn engine_name(&self) -> &str {
        "redis-cluster"
    }
}

fn persistent_slot_key(config: &EngineConfig) -> String {
    format!(
        "cluster:{}|{}",
        config.seeds.join(","),
        config.timeout.as_secs()
    )
}

/// Build the cluster client from the seed list and open one shared async
/// connection, bounded by the configured connect timeout.
async fn connect(config: &EngineConfig) -> Result<ClusterConnection> {
    let nodes: Vec<String> = config
        .seeds
        .iter()
        .map(|seed| format!("redis://{seed}"))
        .collect();

    let mut builder = ClusterClientBuilder::new(nodes);
    if let Some(password) = &config.password {
        builder = builder.password(password.clone());
    }
    if config.failover.reads_from_replicas() {
        builder = builder.read_from_replicas();
    }
    if !config.timeout.is_zero() {
        builder = builder.connection_timeout(config.timeout);
    }

    let client = builder
        .build()
        .map_err(|e| Error::initialization_with_source("failed to create cluster client", e))?;

    let connecting = client.get_async_connection();
    let mut conn = if config.timeout.is_zero() {
        connecting.await
    } else {
        timeout(config.timeout, connecting).await.map_err(|_| {
            Error::initialization(format!(
                "cluster connection to [{}] timed out after {:?}",
                config.seeds.join(", "),
                config.timeout
            ))
        })?
    }
    .map_err(|e| {
        Error::initialization_with_source(
            format!("failed to connect to cluster at [{}]", config.seeds.join(", ")),
            e,
        )
    })?;

    let pong: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| Error::initialization_with_source("cluster ping failed", e))?;
    if pong != "PONG" {
        return Err(Error::initialization("cluster ping did not return PONG"));
    }

    tracing::debug!(seeds = ?config.seeds, "cluster connection established");
    Ok(conn)
}

/// Extract `(host, port)` of each slot range's master from a CLUSTER SLOTS
/// reply: `[[start, end, [host, port, id, ...], replica...], ...]`.
fn parse_master_addresses(reply: &redis::Value) -> Result<Vec<(String, u16)>> {
    let redis::Value::Array(slots) = reply else {
        return Err(Error::backend("CLUSTER SLOTS reply is not an array"));
    };

    let mut masters = Vec::with_capacity(slots.len());
    for slot in slots {
        let redis::Value::Array(fields) = slot else {
            return Err(Error::backend("CLUSTER SLOTS slot entry is not an array"));
        };
        // fields[0..2] are the slot range; fields[2] is the master node
        let Some(redis::Value::Array(node)) = fields.get(2) else {
            return Err(Error::backend("CLUSTER SLOTS entry has no master node"));
        };
        let host = match node.first() {
            Some(redis::Value::BulkString(bytes)) => String::from_utf8(bytes.clone())
                .map_err(|e| Error::backend_with_source("master host is not UTF-8", e))?,
            Some(redis::Value::SimpleString(text)) => text.clone(),
            _ => return Err(Error::backend("master node entry has no host")),
        };
        let port = match node.get(1) {
            Some(redis::Value::Int(port)) => u16::try_from(*port)
                .map_err(|e| Error::backend_with_source("master port out of range", e))?,
            _ => return Err(Error::backend("master node entry has no port")),
        };
        masters.push((host, port));
    }
    Ok(masters)
}
