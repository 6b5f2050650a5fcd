//! # Integration Tests
//!
//! Stores exercised through their public API only.

use careerguard_clock::ManualClock;
use careerguard_store::{LocalCache, StoreError, TemporaryFileStorage};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DraftLetter {
    company: String,
    paragraphs: Vec<String>,
}

fn draft() -> DraftLetter {
    DraftLetter {
        company: "Acme".to_string(),
        paragraphs: vec!["Dear hiring team,".to_string(), "I am applying...".to_string()],
    }
}

// ============================================================================
// LocalCache
// ============================================================================

#[test]
fn test_struct_roundtrip_before_expiry() {
    let clock = ManualClock::epoch();
    let cache = LocalCache::temporary("cover-letters")
        .unwrap()
        .with_clock(clock.shared());

    assert!(cache.set("acme", &draft(), Duration::minutes(30)));
    clock.advance(Duration::minutes(29));
    assert_eq!(cache.get::<DraftLetter>("acme"), Some(draft()));
}

#[test]
fn test_namespaces_isolated_on_shared_store() {
    let db = sled::Config::new().temporary(true).open().unwrap();
    let resumes = LocalCache::from_db(&db, "resumes").unwrap();
    let scans = LocalCache::from_db(&db, "scans").unwrap();

    resumes.set_default("a", &1);
    resumes.set_default("b", &2);
    scans.set_default("a", &"scan");

    let mut keys = resumes.get_keys();
    keys.sort();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(scans.get_keys(), vec!["a"]);

    assert_eq!(resumes.clear(), 2);
    assert!(resumes.get_keys().is_empty());
    assert_eq!(scans.get::<String>("a").as_deref(), Some("scan"));
}

#[test]
fn test_prefix_namespace_not_confused() {
    let db = sled::Config::new().temporary(true).open().unwrap();
    let short = LocalCache::from_db(&db, "app").unwrap();
    let long = LocalCache::from_db(&db, "app2").unwrap();

    long.set_default("k", &1);
    assert!(short.get_keys().is_empty());
    assert_eq!(short.clear(), 0);
    assert_eq!(long.get_keys(), vec!["k"]);
}

#[test]
fn test_cache_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");

    {
        let cache = LocalCache::open(&path, "app").unwrap();
        assert!(cache.set("k", &"persisted", Duration::hours(1)));
        cache.flush().unwrap();
    }

    let cache = LocalCache::open(&path, "app").unwrap();
    assert_eq!(cache.get::<String>("k").as_deref(), Some("persisted"));
}

// ============================================================================
// TemporaryFileStorage
// ============================================================================

#[tokio::test]
async fn test_zero_ttl_file_reports_expired() {
    let dir = TempDir::new().unwrap();
    let storage = TemporaryFileStorage::with_root(dir.path()).with_clock(ManualClock::epoch().shared());

    let record = storage
        .store_file(b"%PDF", "x.pdf", Duration::zero())
        .await
        .unwrap();
    let err = storage.get_file(&record.filepath).await.unwrap_err();

    assert!(matches!(err, StoreError::Expired(_)));
    assert!(err.to_string().starts_with("File expired"));
}

#[tokio::test]
async fn test_distinct_paths_for_same_name() {
    let dir = TempDir::new().unwrap();
    let storage = TemporaryFileStorage::with_root(dir.path());

    let a = storage.store_file(b"1", "resume.pdf", Duration::hours(1)).await.unwrap();
    let b = storage.store_file(b"2", "resume.pdf", Duration::hours(1)).await.unwrap();

    assert_ne!(a.filepath, b.filepath);
    assert_eq!(storage.get_file(&a.filepath).await.unwrap().data, b"1");
    assert_eq!(storage.get_file(&b.filepath).await.unwrap().data, b"2");
}

#[tokio::test]
async fn test_sweep_after_teardown_leaves_no_files() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::epoch();
    let storage = TemporaryFileStorage::with_root(dir.path()).with_clock(clock.shared());

    for i in 0..5 {
        storage
            .store_file(b"data", &format!("f{}.bin", i), Duration::minutes(i))
            .await
            .unwrap();
    }

    clock.advance(Duration::minutes(10));
    assert_eq!(storage.cleanup().await, 5);
    assert!(storage.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
