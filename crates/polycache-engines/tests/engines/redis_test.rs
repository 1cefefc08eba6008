//! Redis engine integration tests
//!
//! These require a live Redis server on 127.0.0.1:6379 and are ignored by
//! default. Run with:
//!
//! ```sh
//! cargo test -p polycache-engines --test integration -- --ignored
//! ```
//!
//! Each test uses its own key prefix, so concurrent runs do not collide.

use polycache_domain::ports::engine::{AddAtomicity, CacheEngine};
use polycache_domain::value_objects::config::EngineConfig;
use polycache_domain::value_objects::ttl::Ttl;
use polycache_domain::value_objects::value::Value;
use polycache_engines::redis::RedisEngine;
use std::time::Duration;

async fn engine_with_prefix(prefix: &str) -> RedisEngine {
    super::init_tracing();
    let config = EngineConfig::new()
        .with_prefix(format!("pct_{prefix}_"))
        .with_persistent(false)
        .with_duration_secs(60);
    RedisEngine::new(config)
        .await
        .expect("redis server should be reachable on 127.0.0.1:6379")
}

#[tokio::test]
#[ignore = "requires a live Redis server on 127.0.0.1:6379"]
async fn write_then_read_round_trips() {
    let engine = engine_with_prefix("roundtrip").await;
    engine.clear(false).await.unwrap();

    for value in [
        Value::from("hello"),
        Value::Int(-42),
        Value::Bool(true),
        Value::from(""), // remote backends permit empty strings
        Value::Array(vec![Value::Int(1), Value::from("two")]),
    ] {
        engine.write("entry", &value, None).await.unwrap();
        assert_eq!(engine.read("entry").await.unwrap(), Some(value));
    }
}

#[tokio::test]
#[ignore = "requires a live Redis server on 127.0.0.1:6379"]
async fn entries_expire_after_their_ttl() {
    let engine = engine_with_prefix("expiry").await;
    engine.clear(false).await.unwrap();

    engine
        .write("a", &Value::from("x"), Some(Ttl::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(engine.read("a").await.unwrap(), Some(Value::from("x")));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(engine.read("a").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a live Redis server on 127.0.0.1:6379"]
async fn counters_are_atomic_and_reversible() {
    let engine = engine_with_prefix("counters").await;
    engine.clear(false).await.unwrap();

    engine.write("n", &Value::Int(10), None).await.unwrap();
    assert_eq!(engine.increment("n", 5).await.unwrap(), 15);
    assert_eq!(engine.decrement("n", 5).await.unwrap(), 10);
    // the codec stores Int as decimal text, so the counter result reads back
    let stored = engine.read("n").await.unwrap().unwrap();
    assert_eq!(stored.as_int(), Some(10));
}

#[tokio::test]
#[ignore = "requires a live Redis server on 127.0.0.1:6379"]
async fn add_is_atomic_set_if_absent() {
    let engine = engine_with_prefix("add").await;
    engine.clear(false).await.unwrap();

    assert_eq!(engine.add_atomicity(), AddAtomicity::Atomic);
    assert!(engine.add("slot", &Value::from("first"), None).await.unwrap());
    assert!(!engine.add("slot", &Value::from("second"), None).await.unwrap());
    assert_eq!(
        engine.read("slot").await.unwrap(),
        Some(Value::from("first"))
    );
}

#[tokio::test]
#[ignore = "requires a live Redis server on 127.0.0.1:6379"]
async fn delete_reports_prior_presence() {
    let engine = engine_with_prefix("delete").await;
    engine.clear(false).await.unwrap();

    engine.write("gone", &Value::Int(1), None).await.unwrap();
    assert!(engine.delete("gone").await.unwrap());
    assert!(!engine.delete("gone").await.unwrap());
    assert_eq!(engine.read("gone").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a live Redis server on 127.0.0.1:6379"]
async fn clear_only_touches_this_engines_prefix() {
    let ours = engine_with_prefix("clear_ours").await;
    let theirs = engine_with_prefix("clear_theirs").await;
    ours.clear(false).await.unwrap();
    theirs.clear(false).await.unwrap();

    ours.write("k1", &Value::Int(1), None).await.unwrap();
    theirs.write("k1", &Value::Int(3), None).await.unwrap();

    ours.clear(false).await.unwrap();

    assert_eq!(ours.read("k1").await.unwrap(), None);
    assert_eq!(theirs.read("k1").await.unwrap(), Some(Value::Int(3)));

    // expired-only clear is a no-op for a store with native expiry
    theirs.clear(true).await.unwrap();
    assert_eq!(theirs.read("k1").await.unwrap(), Some(Value::Int(3)));
    theirs.clear(false).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live Redis server on 127.0.0.1:6379"]
async fn group_labels_bump_without_deleting_entries() {
    let config = EngineConfig::new()
        .with_prefix("pct_groups_")
        .with_persistent(false)
        .with_groups(["blog"]);
    let engine = RedisEngine::new(config).await.unwrap();
    engine.clear(false).await.unwrap();

    // counters initialize lazily to 1 on first access
    assert_eq!(engine.groups().await.unwrap(), vec!["blog1".to_string()]);

    engine.write("post", &Value::Int(1), None).await.unwrap();
    engine.clear_group("blog").await.unwrap();

    // the label changed, but the physical entry survives under its own TTL
    assert_eq!(engine.groups().await.unwrap(), vec!["blog2".to_string()]);
    assert_eq!(engine.read("post").await.unwrap(), Some(Value::Int(1)));

    engine.clear(false).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live Redis server on 127.0.0.1:6379"]
async fn multi_key_operations_use_one_round_trip() {
    let engine = engine_with_prefix("multi").await;
    engine.clear(false).await.unwrap();

    engine
        .write_multiple(
            &[
                ("one".to_string(), Value::Int(1)),
                ("two".to_string(), Value::from("2")),
            ],
            Some(Ttl::from_secs(60)),
        )
        .await
        .unwrap();

    let fallback = Value::Null;
    let found = engine
        .read_multiple(&["one", "two", "three"], Some(&fallback))
        .await
        .unwrap();
    assert_eq!(found.get("one"), Some(&Value::Int(1)));
    assert_eq!(found.get("two"), Some(&Value::from("2")));
    assert_eq!(found.get("three"), Some(&Value::Null));

    engine.clear(false).await.unwrap();
}

#[tokio::test]
async fn unreachable_server_is_an_initialization_error() {
    let config = EngineConfig::new()
        .with_server("127.0.0.1")
        .with_port(1) // nothing listens here
        .with_persistent(false)
        .with_timeout(Duration::from_secs(1));
    let err = RedisEngine::new(config).await.unwrap_err();
    assert!(matches!(
        err,
        polycache_domain::error::Error::Initialization { .. }
    ));
}
