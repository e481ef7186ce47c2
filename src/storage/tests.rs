//! Tests for storage, retries and input discovery

use super::*;
use crate::config::Credentials;
use crate::error::Error;
use crate::types::BackoffType;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use std::time::Duration;
use tempfile::tempdir;
use test_case::test_case;

fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        backoff_type: BackoffType::Constant,
    }
}

// ============================================================================
// Storage Tests
// ============================================================================

#[test]
fn test_open_local_read_requires_existing_root() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = Storage::local(&missing, AccessMode::Read).unwrap_err();
    assert!(err.to_string().contains("not reachable"));
}

#[test]
fn test_open_local_write_creates_root() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out/nested");
    let storage = Storage::local(&out, AccessMode::Write).unwrap();
    assert!(out.is_dir());
    assert_eq!(storage.scheme(), "file");
}

#[test]
fn test_open_file_url() {
    let dir = tempdir().unwrap();
    let url = format!("file://{}", dir.path().display());
    let storage = Storage::open(&url, &Credentials::default(), AccessMode::Read).unwrap();
    assert_eq!(storage.scheme(), "file");
}

#[test]
fn test_open_s3_requires_bucket() {
    let err = Storage::open("s3://", &Credentials::default(), AccessMode::Read).unwrap_err();
    assert!(err.to_string().contains("Missing bucket"));
}

#[tokio::test]
async fn test_put_get_list_exists() {
    let dir = tempdir().unwrap();
    let storage = Storage::local(dir.path(), AccessMode::Write).unwrap();

    storage
        .put(&ObjectPath::from("t/b.txt"), Bytes::from_static(b"two"))
        .await
        .unwrap();
    storage
        .put(&ObjectPath::from("t/a.txt"), Bytes::from_static(b"one"))
        .await
        .unwrap();

    let listed = storage.list(&ObjectPath::from("t")).await.unwrap();
    assert_eq!(
        listed,
        vec![ObjectPath::from("t/a.txt"), ObjectPath::from("t/b.txt")]
    );

    let body = storage.get(&ObjectPath::from("t/a.txt")).await.unwrap();
    assert_eq!(body.as_ref(), b"one");

    assert!(storage.exists(&ObjectPath::from("t/a.txt")).await.unwrap());
    assert!(!storage.exists(&ObjectPath::from("t/c.txt")).await.unwrap());
}

#[tokio::test]
async fn test_get_missing_is_not_retried() {
    let dir = tempdir().unwrap();
    let storage = Storage::local(dir.path(), AccessMode::Write)
        .unwrap()
        .with_retry(quick_policy(3));

    let err = storage.get(&ObjectPath::from("missing")).await.unwrap_err();
    assert!(matches!(err, Error::ObjectStore(_)));
}

#[tokio::test]
async fn test_rename_and_delete_prefix() {
    let dir = tempdir().unwrap();
    let storage = Storage::local(dir.path(), AccessMode::Write).unwrap();

    let staged = ObjectPath::from("_temporary/run/x/year=2000/part-00000.parquet");
    let target = ObjectPath::from("x/year=2000/part-00000.parquet");
    storage.put(&staged, Bytes::from_static(b"data")).await.unwrap();
    storage.rename(&staged, &target).await.unwrap();

    assert!(!storage.exists(&staged).await.unwrap());
    assert!(storage.exists(&target).await.unwrap());
    assert!(dir.path().join("x/year=2000/part-00000.parquet").is_file());

    let removed = storage.delete_prefix(&ObjectPath::from("x")).await.unwrap();
    assert_eq!(removed, 1);
    assert!(!dir.path().join("x").exists());
}

// ============================================================================
// Retry Tests
// ============================================================================

#[tokio::test]
async fn test_retry_recovers_from_transient_errors() {
    let mut calls = 0;
    let result = retry(&quick_policy(3), "flaky", || {
        calls += 1;
        let attempt = calls;
        async move {
            if attempt < 3 {
                Err(Error::transient_storage("p", "unavailable"))
            } else {
                Ok(attempt)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls, 3);
}

#[tokio::test]
async fn test_retry_is_bounded() {
    let mut calls = 0;
    let result: crate::Result<()> = retry(&quick_policy(2), "always down", || {
        calls += 1;
        async { Err(Error::transient_storage("p", "unavailable")) }
    })
    .await;

    assert!(matches!(result, Err(Error::RetriesExhausted { max_attempts: 2, .. })));
    assert_eq!(calls, 2);
}

#[tokio::test]
async fn test_retry_skips_permanent_errors() {
    let mut calls = 0;
    let result: crate::Result<()> = retry(&quick_policy(5), "bad data", || {
        calls += 1;
        async { Err(Error::record_parse("p", 1, "bad")) }
    })
    .await;

    assert!(matches!(result, Err(Error::RecordParse { .. })));
    assert_eq!(calls, 1);
}

#[test_case(BackoffType::Constant, &[100, 100, 100] ; "constant")]
#[test_case(BackoffType::Linear, &[100, 200, 300] ; "linear")]
#[test_case(BackoffType::Exponential, &[100, 200, 400] ; "exponential")]
fn test_calculate_backoff(backoff_type: BackoffType, expected_ms: &[u64]) {
    let policy = RetryPolicy {
        max_attempts: 5,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_secs(10),
        backoff_type,
    };
    for (attempt, ms) in expected_ms.iter().enumerate() {
        assert_eq!(
            policy.calculate_backoff(attempt as u32),
            Duration::from_millis(*ms)
        );
    }
}

#[test]
fn test_backoff_is_capped() {
    let policy = RetryPolicy {
        max_attempts: 5,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(250),
        backoff_type: BackoffType::Exponential,
    };
    assert_eq!(policy.calculate_backoff(10), Duration::from_millis(250));
}

// ============================================================================
// Glob Tests
// ============================================================================

#[test_case("song_data/*/*/*/*.json", "song_data/A/B/C/TRABCEI128F424C983.json", true ; "catalog file")]
#[test_case("song_data/*/*/*/*.json", "song_data/A/B/TRABC.json", false ; "too shallow")]
#[test_case("song_data/*/*/*/*.json", "song_data/A/B/C/D/TRABC.json", false ; "too deep")]
#[test_case("log_data/*/*/*.json", "log_data/2018/11/2018-11-01-events.json", true ; "log file")]
#[test_case("log_data/*/*/*.json", "log_data/2018/11/notes.txt", false ; "wrong extension")]
#[test_case("log_data/*/*/*", "log_data/2018/11/anything", true ; "bare wildcard")]
#[test_case("log_data/2018/??/*.json", "log_data/2018/11/x.json", true ; "question mark")]
#[test_case("data.v1/*.json", "dataXv1/a.json", false ; "dot is literal")]
fn test_glob_matches(pattern: &str, path: &str, expected: bool) {
    assert_eq!(GlobPattern::new(pattern).unwrap().matches(path), expected);
}

#[test]
fn test_glob_literal_prefix() {
    let glob = GlobPattern::new("/song_data/*/*/*/*.json").unwrap();
    assert_eq!(glob.literal_prefix(), "song_data");

    let glob = GlobPattern::new("log_data/2018/*/*.json").unwrap();
    assert_eq!(glob.literal_prefix(), "log_data/2018");

    assert!(GlobPattern::new("/").is_err());
}

// ============================================================================
// Record Source Tests
// ============================================================================

#[tokio::test]
async fn test_source_discovers_and_streams_in_order() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for (path, body) in [
        ("song_data/B/A/A/TRBAA.json", "{\"song_id\": \"S2\"}"),
        ("song_data/A/A/A/TRAAA.json", "{\"song_id\": \"S1\"}"),
        ("song_data/A/A/TRAA.json", "{\"song_id\": \"shallow\"}"),
        ("log_data/2018/11/events.json", "{}"),
    ] {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, body).unwrap();
    }

    let source = RecordSource::new(Storage::local(root, AccessMode::Read).unwrap());
    let glob = GlobPattern::new("song_data/*/*/*/*.json").unwrap();
    let paths = source.discover(&glob).await.unwrap();
    assert_eq!(paths.len(), 2);

    let files: Vec<RawFile> = source.files(paths).try_collect().await.unwrap();
    assert_eq!(files[0].path, "song_data/A/A/A/TRAAA.json");
    assert_eq!(files[0].body.as_ref(), b"{\"song_id\": \"S1\"}");
    assert_eq!(files[1].path, "song_data/B/A/A/TRBAA.json");
}
