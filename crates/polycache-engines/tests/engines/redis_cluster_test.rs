//! Redis Cluster engine integration tests
//!
//! These require a live cluster with seed nodes on 127.0.0.1:7000-7002
//! and are ignored by default. Run with:
//!
//! ```sh
//! cargo test -p polycache-engines --test integration \
//!     --features engine-redis-cluster -- --ignored
//! ```

use polycache_domain::error::Error;
use polycache_domain::ports::engine::{AddAtomicity, CacheEngine};
use polycache_domain::value_objects::config::{EngineConfig, FailoverPolicy};
use polycache_domain::value_objects::value::Value;
use polycache_engines::redis_cluster::RedisClusterEngine;
use std::time::Duration;

const SEEDS: [&str; 3] = ["127.0.0.1:7000", "127.0.0.1:7001", "127.0.0.1:7002"];

async fn engine_with_prefix(prefix: &str) -> RedisClusterEngine {
    let config = EngineConfig::new()
        .with_seeds(SEEDS)
        .with_prefix(format!("pcc_{prefix}_"))
        .with_persistent(false)
        .with_duration_secs(60);
    RedisClusterEngine::new(config)
        .await
        .expect("redis cluster should be reachable on 127.0.0.1:7000-7002")
}

#[tokio::test]
#[ignore = "requires a live Redis Cluster on 127.0.0.1:7000-7002"]
async fn write_then_read_round_trips() {
    let engine = engine_with_prefix("roundtrip").await;
    engine.clear(false).await.unwrap();

    engine.write("entry", &Value::from("hello"), None).await.unwrap();
    assert_eq!(
        engine.read("entry").await.unwrap(),
        Some(Value::from("hello"))
    );
    engine.clear(false).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live Redis Cluster on 127.0.0.1:7000-7002"]
async fn counters_route_to_the_slot_owner() {
    let engine = engine_with_prefix("counters").await;
    engine.clear(false).await.unwrap();

    engine.write("n", &Value::Int(10), None).await.unwrap();
    assert_eq!(engine.increment("n", 5).await.unwrap(), 15);
    assert_eq!(engine.decrement("n", 5).await.unwrap(), 10);
    engine.clear(false).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live Redis Cluster on 127.0.0.1:7000-7002"]
async fn add_is_atomic_set_if_absent() {
    let engine = engine_with_prefix("add").await;
    engine.clear(false).await.unwrap();

    assert_eq!(engine.add_atomicity(), AddAtomicity::Atomic);
    assert!(engine.add("slot", &Value::from("first"), None).await.unwrap());
    assert!(!engine.add("slot", &Value::from("second"), None).await.unwrap());
    engine.clear(false).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live Redis Cluster on 127.0.0.1:7000-7002"]
async fn clear_scans_every_master() {
    let engine = engine_with_prefix("clear").await;
    engine.clear(false).await.unwrap();

    // enough keys to land on several shards
    for i in 0..50 {
        engine
            .write(&format!("key{i}"), &Value::Int(i), None)
            .await
            .unwrap();
    }
    engine.clear(false).await.unwrap();
    for i in 0..50 {
        assert_eq!(engine.read(&format!("key{i}")).await.unwrap(), None);
    }
}

#[tokio::test]
#[ignore = "requires a live Redis Cluster on 127.0.0.1:7000-7002"]
async fn group_labels_bump_without_deleting_entries() {
    let config = EngineConfig::new()
        .with_seeds(SEEDS)
        .with_prefix("pcc_groups_")
        .with_persistent(false)
        .with_groups(["blog"]);
    let engine = RedisClusterEngine::new(config).await.unwrap();
    engine.clear(false).await.unwrap();

    assert_eq!(engine.groups().await.unwrap(), vec!["blog1".to_string()]);
    engine.write("post", &Value::Int(1), None).await.unwrap();
    engine.clear_group("blog").await.unwrap();
    assert_eq!(engine.groups().await.unwrap(), vec!["blog2".to_string()]);
    assert_eq!(engine.read("post").await.unwrap(), Some(Value::Int(1)));

    engine.clear(false).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live Redis Cluster on 127.0.0.1:7000-7002"]
async fn replica_read_policy_connects() {
    let config = EngineConfig::new()
        .with_seeds(SEEDS)
        .with_prefix("pcc_failover_")
        .with_persistent(false)
        .with_failover(FailoverPolicy::DistributeToReplicas);
    let engine = RedisClusterEngine::new(config).await.unwrap();

    engine.write("k", &Value::Int(1), None).await.unwrap();
    assert_eq!(engine.read("k").await.unwrap(), Some(Value::Int(1)));
    engine.clear(false).await.unwrap();
}

#[tokio::test]
async fn database_selection_is_rejected_at_construction() {
    // no SELECT in cluster topology; fail fast instead of at runtime
    let config = EngineConfig::new()
        .with_seeds(SEEDS)
        .with_database(2)
        .with_timeout(Duration::from_secs(1));
    let err = RedisClusterEngine::new(config).await.unwrap_err();
    assert!(matches!(err, Error::Initialization { .. }));
}

#[tokio::test]
async fn empty_seed_list_is_rejected_at_construction() {
    let config = EngineConfig::new()
        .with_seeds(Vec::<String>::new())
        .with_timeout(Duration::from_secs(1));
    let err = RedisClusterEngine::new(config).await.unwrap_err();
    assert!(matches!(err, Error::Initialization { .. }));
}
