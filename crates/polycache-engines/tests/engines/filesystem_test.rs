//! Filesystem engine integration tests
//!
//! Each test gets its own `TempDir`, so tests never share state and the
//! tree is removed on drop.

use polycache_domain::error::Error;
use polycache_domain::ports::engine::{AddAtomicity, CacheEngine};
use polycache_domain::value_objects::config::EngineConfig;
use polycache_domain::value_objects::ttl::Ttl;
use polycache_domain::value_objects::value::Value;
use polycache_engines::filesystem::FileEngine;
use std::collections::BTreeMap;
use std::time::Duration;
use tempfile::TempDir;

async fn engine_in(dir: &TempDir) -> FileEngine {
    super::init_tracing();
    FileEngine::new(EngineConfig::new().with_path(dir.path()))
        .await
        .expect("filesystem engine should initialize in a tempdir")
}

#[tokio::test]
async fn write_then_read_round_trips() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    let mut map = BTreeMap::new();
    map.insert("count".to_string(), Value::Int(3));
    for value in [
        Value::from("hello"),
        Value::Int(-42),
        Value::Bool(true),
        Value::Array(vec![Value::Int(1), Value::from("two")]),
        Value::Map(map),
    ] {
        engine.write("entry", &value, None).await.unwrap();
        assert_eq!(engine.read("entry").await.unwrap(), Some(value));
    }
}

#[tokio::test]
async fn missing_key_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    assert_eq!(engine.read("never written").await.unwrap(), None);
}

#[tokio::test]
async fn entries_expire_after_their_ttl() {
    let dir = TempDir::new().unwrap();
    let engine = FileEngine::new(
        EngineConfig::new()
            .with_path(dir.path())
            .with_duration_secs(2),
    )
    .await
    .unwrap();

    engine.write("a", &Value::from("x"), None).await.unwrap();
    assert_eq!(engine.read("a").await.unwrap(), Some(Value::from("x")));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(engine.read("a").await.unwrap(), None);
}

#[tokio::test]
async fn zero_ttl_never_expires() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    engine
        .write("pinned", &Value::Int(1), Some(Ttl::FOREVER))
        .await
        .unwrap();
    assert_eq!(engine.read("pinned").await.unwrap(), Some(Value::Int(1)));
}

#[tokio::test]
async fn delete_reports_prior_presence() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    engine.write("gone", &Value::Int(1), None).await.unwrap();
    assert!(engine.delete("gone").await.unwrap());
    assert_eq!(engine.read("gone").await.unwrap(), None);
    // deleting an absent key is a no-op, not an error
    assert!(!engine.delete("gone").await.unwrap());
}

#[tokio::test]
async fn empty_string_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    let err = engine
        .write("ambiguous", &Value::from(""), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
}

#[tokio::test]
async fn empty_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    assert!(matches!(
        engine.write("", &Value::Int(1), None).await.unwrap_err(),
        Error::InvalidKey { .. }
    ));
    assert!(matches!(
        engine.read("   ").await.unwrap_err(),
        Error::InvalidKey { .. }
    ));
}

#[tokio::test]
async fn counters_are_unsupported() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    assert!(matches!(
        engine.increment("n", 1).await.unwrap_err(),
        Error::Unsupported { .. }
    ));
    assert!(matches!(
        engine.decrement("n", 1).await.unwrap_err(),
        Error::Unsupported { .. }
    ));
}

#[tokio::test]
async fn add_is_check_then_write() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    assert_eq!(engine.add_atomicity(), AddAtomicity::CheckThenWrite);
    assert!(engine.add("slot", &Value::from("first"), None).await.unwrap());
    assert!(!engine.add("slot", &Value::from("second"), None).await.unwrap());
    assert_eq!(
        engine.read("slot").await.unwrap(),
        Some(Value::from("first"))
    );
}

#[tokio::test]
async fn clear_only_touches_this_engines_prefix() {
    let dir = TempDir::new().unwrap();
    let ours = FileEngine::new(
        EngineConfig::new()
            .with_path(dir.path())
            .with_prefix("ours_"),
    )
    .await
    .unwrap();
    let theirs = FileEngine::new(
        EngineConfig::new()
            .with_path(dir.path())
            .with_prefix("theirs_"),
    )
    .await
    .unwrap();

    ours.write("k1", &Value::Int(1), None).await.unwrap();
    ours.write("k2", &Value::Int(2), None).await.unwrap();
    theirs.write("k1", &Value::Int(3), None).await.unwrap();

    ours.clear(false).await.unwrap();

    assert_eq!(ours.read("k1").await.unwrap(), None);
    assert_eq!(ours.read("k2").await.unwrap(), None);
    assert_eq!(theirs.read("k1").await.unwrap(), Some(Value::Int(3)));
}

#[tokio::test]
async fn clear_expired_keeps_live_entries() {
    let dir = TempDir::new().unwrap();
    // short default duration so the mtime pre-filter lets 2s-old files through
    let engine = FileEngine::new(
        EngineConfig::new()
            .with_path(dir.path())
            .with_duration_secs(1),
    )
    .await
    .unwrap();

    engine
        .write("shortlived", &Value::Int(1), Some(Ttl::from_secs(1)))
        .await
        .unwrap();
    engine
        .write("pinned", &Value::Int(2), Some(Ttl::FOREVER))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;
    engine.clear(true).await.unwrap();

    assert_eq!(engine.read("shortlived").await.unwrap(), None);
    assert_eq!(engine.read("pinned").await.unwrap(), Some(Value::Int(2)));
}

#[tokio::test]
async fn groups_are_nested_directories() {
    let dir = TempDir::new().unwrap();
    let engine = FileEngine::new(
        EngineConfig::new()
            .with_path(dir.path())
            .with_groups(["blog", "posts"]),
    )
    .await
    .unwrap();

    engine.write("latest", &Value::Int(1), None).await.unwrap();
    // group directories appear lazily, one level per group in order
    let expected = dir.path().join("blog").join("posts").join("cache_latest");
    assert!(expected.is_file());

    // the filesystem engine's group labels are the plain names
    assert_eq!(
        engine.groups().await.unwrap(),
        vec!["blog".to_string(), "posts".to_string()]
    );
}

#[tokio::test]
async fn clear_group_deletes_tagged_entries_only() {
    let dir = TempDir::new().unwrap();
    let grouped = FileEngine::new(
        EngineConfig::new()
            .with_path(dir.path())
            .with_groups(["blog"]),
    )
    .await
    .unwrap();
    let ungrouped = engine_in(&dir).await;

    grouped.write("post", &Value::Int(1), None).await.unwrap();
    ungrouped.write("other", &Value::Int(2), None).await.unwrap();

    grouped.clear_group("blog").await.unwrap();

    assert_eq!(grouped.read("post").await.unwrap(), None);
    assert_eq!(ungrouped.read("other").await.unwrap(), Some(Value::Int(2)));
}

#[tokio::test]
async fn raw_mode_round_trips_text_and_integers() {
    let dir = TempDir::new().unwrap();
    let engine = FileEngine::new(
        EngineConfig::new()
            .with_path(dir.path())
            .with_serialize(false),
    )
    .await
    .unwrap();

    engine.write("text", &Value::from("plain"), None).await.unwrap();
    let stored = engine.read("text").await.unwrap().unwrap();
    assert_eq!(stored.as_str(), Some("plain"));

    engine.write("number", &Value::Int(7), None).await.unwrap();
    assert_eq!(engine.read("number").await.unwrap(), Some(Value::Int(7)));

    // structured values do not round-trip as raw text
    let err = engine
        .write("list", &Value::Array(vec![Value::Int(1)]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
}

#[tokio::test]
async fn corrupt_files_read_as_misses() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    engine.write("entry", &Value::Int(1), None).await.unwrap();
    // clobber the file: no stamp boundary at all
    std::fs::write(dir.path().join("cache_entry"), b"garbage").unwrap();
    assert_eq!(engine.read("entry").await.unwrap(), None);

    // valid stamp, unparseable payload
    std::fs::write(dir.path().join("cache_entry"), b"0\nnot json").unwrap();
    assert_eq!(engine.read("entry").await.unwrap(), None);
}

#[tokio::test]
async fn locking_mode_round_trips() {
    let dir = TempDir::new().unwrap();
    let engine = FileEngine::new(
        EngineConfig::new().with_path(dir.path()).with_lock(true),
    )
    .await
    .unwrap();

    engine.write("locked", &Value::from("v"), None).await.unwrap();
    assert_eq!(engine.read("locked").await.unwrap(), Some(Value::from("v")));
    assert!(engine.delete("locked").await.unwrap());
}

#[tokio::test]
async fn missing_base_directory_is_created_at_init() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let engine = FileEngine::new(EngineConfig::new().with_path(&nested))
        .await
        .unwrap();

    engine.write("k", &Value::Int(1), None).await.unwrap();
    assert!(nested.is_dir());
}

#[tokio::test]
async fn multi_key_defaults_apply() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir).await;

    engine
        .write_multiple(
            &[
                ("one".to_string(), Value::Int(1)),
                ("two".to_string(), Value::Int(2)),
            ],
            None,
        )
        .await
        .unwrap();

    let fallback = Value::from("absent");
    let found = engine
        .read_multiple(&["one", "two", "three"], Some(&fallback))
        .await
        .unwrap();
    assert_eq!(found.get("one"), Some(&Value::Int(1)));
    assert_eq!(found.get("two"), Some(&Value::Int(2)));
    assert_eq!(found.get("three"), Some(&fallback));

    // without a default, misses are omitted
    let found = engine.read_multiple(&["one", "three"], None).await.unwrap();
    assert_eq!(found.len(), 1);
}
