//! Engine configuration
//!
//! One explicit config value built up front with chained `with_*` calls and
//! handed to the engine constructor, which keeps its own copy. Configuration
//! is fixed for the engine's lifetime; changing it means constructing a new
//! engine. Engines ignore options that do not apply to them (a filesystem
//! engine never reads `server`).
//!
//! # Example
//!
//! ```
//! use polycache_domain::value_objects::config::EngineConfig;
//! use polycache_domain::value_objects::ttl::Ttl;
//!
//! let config = EngineConfig::new()
//!     .with_prefix("app_")
//!     .with_duration(Ttl::from_secs(600))
//!     .with_groups(["posts", "comments"]);
//! ```

use crate::constants::{
    DEFAULT_CLUSTER_SEED, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DURATION_SECS, DEFAULT_PORT,
    DEFAULT_PREFIX, DEFAULT_SERVER,
};
use crate::error::{Error, Result};
use crate::value_objects::ttl::Ttl;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Read-failover policy for the clustered backend
///
/// Governs whether reads may be served by a non-primary replica when a
/// primary is unreachable. The two `distribute` policies enable replica
/// reads in the cluster client; `none` and `error-on-failure` keep reads
/// on primaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailoverPolicy {
    /// Reads stay on primaries; failures surface as errors
    #[default]
    None,
    /// Like `None`, with the failure contract stated explicitly
    ErrorOnFailure,
    /// Reads may be served by any replica
    DistributeToReplicas,
    /// Reads may be served by any replica, preferring secondaries
    DistributeToReplicasPreferringSecondaries,
}

impl FailoverPolicy {
    /// True when the policy allows reads from replica nodes
    pub fn reads_from_replicas(self) -> bool {
        matches!(
            self,
            FailoverPolicy::DistributeToReplicas
                | FailoverPolicy::DistributeToReplicasPreferringSecondaries
        )
    }
}

impl FromStr for FailoverPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(FailoverPolicy::None),
            "error-on-failure" => Ok(FailoverPolicy::ErrorOnFailure),
            "distribute-to-replicas" => Ok(FailoverPolicy::DistributeToReplicas),
            "distribute-to-replicas-preferring-secondaries" => {
                Ok(FailoverPolicy::DistributeToReplicasPreferringSecondaries)
            }
            other => Err(Error::invalid_value(format!(
                "unknown failover policy {other:?}"
            ))),
        }
    }
}

/// Engine configuration
///
/// The full recognized-option surface. Field applicability:
///
/// | Option | Backends |
/// |--------|----------|
/// | `prefix`, `duration`, `groups` | all |
/// | `path`, `lock`, `serialize` | filesystem |
/// | `server`, `port`, `unix_socket`, `database` | redis |
/// | `seeds`, `failover` | redis-cluster |
/// | `password`, `timeout`, `persistent` | redis, redis-cluster |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Key prefix namespacing every entry owned by this engine
    pub prefix: String,
    /// Default TTL used when an operation passes no explicit TTL
    pub duration: Ttl,
    /// Group names this engine participates in
    pub groups: Vec<String>,
    /// Filesystem root for the file backend
    pub path: PathBuf,
    /// Advisory file locking around read/write sequences
    pub lock: bool,
    /// Encode values through the codec (raw text/decimal payloads when off)
    pub serialize: bool,
    /// Single-node server host
    pub server: String,
    /// Cluster seed nodes, `host:port` each
    pub seeds: Vec<String>,
    /// Single-node server port
    pub port: u16,
    /// AUTH password, carried in connection parameters
    pub password: Option<String>,
    /// Database index (single-node only; non-zero is rejected by the
    /// clustered backend)
    pub database: i64,
    /// Connect timeout; zero waits indefinitely
    pub timeout: Duration,
    /// Reuse a process-wide connection slot keyed by address/database/timeout
    pub persistent: bool,
    /// Unix domain socket path, preferred over host/port when set
    pub unix_socket: Option<PathBuf>,
    /// Read-failover policy for the clustered backend
    pub failover: FailoverPolicy,
}

impl EngineConfig {
    /// Create a configuration with the documented defaults
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            duration: Ttl::from_secs(DEFAULT_DURATION_SECS),
            groups: Vec::new(),
            path: std::env::temp_dir().join("polycache"),
            lock: false,
            serialize: true,
            server: DEFAULT_SERVER.to_string(),
            seeds: vec![DEFAULT_CLUSTER_SEED.to_string()],
            port: DEFAULT_PORT,
            password: None,
            database: 0,
            timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            persistent: true,
            unix_socket: None,
            failover: FailoverPolicy::None,
        }
    }

    /// Set the key prefix
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the default TTL
    pub fn with_duration(mut self, duration: Ttl) -> Self {
        self.duration = duration;
        self
    }

    /// Set the default TTL in seconds
    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.duration = Ttl::from_secs(secs);
        self
    }

    /// Set the group names
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Set the filesystem root
    pub fn with_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    /// Enable or disable advisory file locking
    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    /// Enable or disable value serialization (filesystem backend)
    pub fn with_serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }

    /// Set the single-node server host
    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = server.into();
        self
    }

    /// Set the cluster seed nodes
    pub fn with_seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seeds = seeds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the single-node server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the AUTH password
    pub fn with_password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the database index
    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    /// Set the connect timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable the persistent connection slot
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Connect through a unix domain socket
    pub fn with_unix_socket<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.unix_socket = Some(path.into());
        self
    }

    /// Set the read-failover policy
    pub fn with_failover(mut self, failover: FailoverPolicy) -> Self {
        self.failover = failover;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
