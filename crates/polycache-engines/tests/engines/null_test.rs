//! Null engine integration tests

use polycache_domain::error::Error;
use polycache_domain::ports::engine::CacheEngine;
use polycache_domain::value_objects::config::EngineConfig;
use polycache_domain::value_objects::value::Value;
use polycache_engines::null::NullEngine;

#[tokio::test]
async fn accepts_writes_and_always_misses() {
    let engine = NullEngine::default();

    engine.write("k", &Value::from("v"), None).await.unwrap();
    assert_eq!(engine.read("k").await.unwrap(), None);
    assert!(!engine.delete("k").await.unwrap());
    engine.clear(false).await.unwrap();
    engine.clear(true).await.unwrap();
    engine.clear_group("anything").await.unwrap();
}

#[tokio::test]
async fn counters_behave_as_on_an_absent_key() {
    let engine = NullEngine::default();

    assert_eq!(engine.increment("n", 5).await.unwrap(), 5);
    assert_eq!(engine.decrement("n", 5).await.unwrap(), -5);
}

#[tokio::test]
async fn add_always_reports_a_fresh_write() {
    let engine = NullEngine::default();

    assert!(engine.add("slot", &Value::Int(1), None).await.unwrap());
    assert!(engine.add("slot", &Value::Int(2), None).await.unwrap());
}

#[tokio::test]
async fn keys_are_still_validated() {
    let engine = NullEngine::default();

    assert!(matches!(
        engine.write("", &Value::Int(1), None).await.unwrap_err(),
        Error::InvalidKey { .. }
    ));
}

#[tokio::test]
async fn group_labels_are_the_configured_names() {
    let engine = NullEngine::new(EngineConfig::new().with_groups(["a", "b"]));
    assert_eq!(
        engine.groups().await.unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
}
