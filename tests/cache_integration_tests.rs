//! Integration Tests for the Cache Library
//!
//! Exercises the public API the way a request-serving layer would: keys
//! built from request parameters, reads going through the wrapper, and
//! writes invalidating whole entity families.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::RwLock;

use coursecache::{
    build_key, spawn_sweep_task, CacheStore, Config, KeyPart, ReadThrough, SharedCache,
    TracingObserver, Ttl, VerificationStore, VerifyOutcome,
};

// == Helper Functions ==

fn shared_store(default_ttl: u64) -> SharedCache<Value> {
    Arc::new(RwLock::new(CacheStore::new(default_ttl)))
}

fn lesson_list_key(module_id: &str, published: bool, page: u64, limit: u64) -> String {
    build_key(
        "lessons",
        &[
            "module".into(),
            module_id.into(),
            published.into(),
            page.into(),
            limit.into(),
        ],
    )
    .unwrap()
}

// == Read-Through Flow ==

#[tokio::test]
async fn test_lesson_listing_flow() {
    let rt = ReadThrough::new(shared_store(300));
    let db_queries = AtomicUsize::new(0);
    let db_queries = &db_queries;

    let key = lesson_list_key("m1", true, 1, 10);
    assert_eq!(key, "lessons:module:m1:true:1:10");

    let fetch = || async move {
        db_queries.fetch_add(1, Ordering::SeqCst);
        Ok::<_, std::io::Error>(json!({
            "lessons": [{"id": "l1", "title": "Intro"}],
            "total": 1,
        }))
    };

    // First request hits the database
    let (page, from_cache) = rt
        .get_or_populate(&key, Ttl::Seconds(300), fetch)
        .await
        .unwrap();
    assert!(!from_cache);
    assert_eq!(page["total"], 1);

    // Same request parameters rebuild the same key and hit the cache
    let key_again = lesson_list_key("m1", true, 1, 10);
    let (page, from_cache) = rt
        .get_or_populate(&key_again, Ttl::Seconds(300), || async move {
            db_queries.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(json!({"lessons": [], "total": 0}))
        })
        .await
        .unwrap();
    assert!(from_cache);
    assert_eq!(page["total"], 1);
    assert_eq!(db_queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_write_invalidates_entity_family() {
    let rt = ReadThrough::new(shared_store(300));

    // Populate several views of the lessons and modules collections
    for key in [
        lesson_list_key("m1", true, 1, 10),
        lesson_list_key("m1", true, 2, 10),
        build_key("lessons", &["id".into(), "l7".into()]).unwrap(),
        build_key("modules", &["all".into(), 1u64.into(), 10u64.into()]).unwrap(),
    ] {
        rt.get_or_populate(&key, Ttl::Default, || async {
            Ok::<_, std::io::Error>(json!({"cached": true}))
        })
        .await
        .unwrap();
    }

    // A lesson write invalidates every cached lessons view, modules survive
    let removed = rt.invalidate_pattern("lessons").await;
    assert_eq!(removed, 3);

    let modules_key = build_key("modules", &["all".into(), 1u64.into(), 10u64.into()]).unwrap();
    let (_, from_cache) = rt
        .get_or_populate(&modules_key, Ttl::Default, || async {
            Ok::<_, std::io::Error>(json!({"cached": false}))
        })
        .await
        .unwrap();
    assert!(from_cache, "Non-matching entity family must survive");
}

#[tokio::test]
async fn test_fetch_error_reaches_caller_unchanged() {
    let rt = ReadThrough::new(shared_store(300));
    let key = build_key("modules", &["id".into(), "m9".into()]).unwrap();

    let result = rt
        .get_or_populate(&key, Ttl::Default, || async {
            Err::<Value, _>(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "query timed out",
            ))
        })
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
    assert_eq!(err.to_string(), "query timed out");

    // The failed fetch left no entry behind
    assert_eq!(rt.store().write().await.get(&key), None);
}

#[tokio::test]
async fn test_expiry_without_sweep() {
    let rt = ReadThrough::new(shared_store(300));
    let fetches = AtomicUsize::new(0);
    let fetches = &fetches;

    let fetch = || async move {
        let n = fetches.fetch_add(1, Ordering::SeqCst);
        Ok::<_, std::io::Error>(json!({"version": n}))
    };

    let (v, _) = rt.get_or_populate("k", Ttl::Seconds(1), fetch).await.unwrap();
    assert_eq!(v["version"], 0);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    // No sweep is running; the lazy read check alone must refuse the stale
    // entry and refetch
    let (v, from_cache) = rt
        .get_or_populate("k", Ttl::Seconds(1), || async move {
            let n = fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(json!({"version": n}))
        })
        .await
        .unwrap();
    assert!(!from_cache);
    assert_eq!(v["version"], 1);
}

#[tokio::test]
async fn test_clear_all_then_repopulate() {
    let rt = ReadThrough::new(shared_store(300));

    rt.get_or_populate("a", Ttl::Default, || async {
        Ok::<_, std::io::Error>(json!(1))
    })
    .await
    .unwrap();
    rt.get_or_populate("b", Ttl::Default, || async {
        Ok::<_, std::io::Error>(json!(2))
    })
    .await
    .unwrap();

    rt.clear_all().await;
    assert!(rt.store().write().await.keys().is_empty());

    // Clearing an already-empty store is fine
    rt.clear_all().await;

    let (_, from_cache) = rt
        .get_or_populate("a", Ttl::Default, || async {
            Ok::<_, std::io::Error>(json!(3))
        })
        .await
        .unwrap();
    assert!(!from_cache);
}

#[tokio::test]
async fn test_tracing_observer_log_path() {
    // Install a real subscriber so observer events flow through the logging
    // stack end to end; try_init because other tests may have installed one
    let _ = tracing_subscriber::fmt()
        .with_env_filter("coursecache=debug")
        .with_test_writer()
        .try_init();

    let cache: SharedCache<Value> = Arc::new(RwLock::new(CacheStore::with_observer(
        300,
        Arc::new(TracingObserver),
    )));
    let rt = ReadThrough::new(cache);

    // Drive every event the observer emits: set, delete, expired, clear
    rt.get_or_populate("modules:all:1:10", Ttl::Default, || async {
        Ok::<_, std::io::Error>(json!({"modules": []}))
    })
    .await
    .unwrap();
    rt.get_or_populate("modules:id:5", Ttl::Seconds(1), || async {
        Ok::<_, std::io::Error>(json!({"id": "m5"}))
    })
    .await
    .unwrap();

    assert_eq!(rt.invalidate("modules:all:1:10").await, 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let (_, from_cache) = rt
        .get_or_populate("modules:id:5", Ttl::Default, || async {
            Ok::<_, std::io::Error>(json!({"id": "m5", "refetched": true}))
        })
        .await
        .unwrap();
    assert!(!from_cache, "Expired entry must be refetched");

    rt.clear_all().await;
    assert!(rt.store().write().await.keys().is_empty());
}

#[tokio::test]
async fn test_stats_observability() {
    let rt = ReadThrough::new(shared_store(300));

    for _ in 0..3 {
        rt.get_or_populate("hot", Ttl::Default, || async {
            Ok::<_, std::io::Error>(json!("v"))
        })
        .await
        .unwrap();
    }

    let stats = rt.stats().await;
    assert_eq!(stats.hits, 2);
    // The cold path checks the store twice: once before and once after
    // taking the per-key guard
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.sets, 1);
    assert_eq!(stats.key_count, 1);
    assert!(stats.hit_rate() >= 0.5);
}

// == Key Construction ==

#[test]
fn test_key_parts_from_request_parameters() {
    // Optional parameters drop out of the key entirely
    let module_filter: Option<&str> = None;
    let key = build_key(
        "modules",
        &["all".into(), module_filter.into(), 1u64.into(), 10u64.into()],
    )
    .unwrap();
    assert_eq!(key, "modules:all:1:10");

    // A malformed parameter is rejected instead of producing an ambiguous key
    assert!(build_key("modules", &[KeyPart::Str("a:b".into())]).is_err());
}

// == Background Sweep ==

#[tokio::test]
async fn test_sweep_task_with_config() {
    let config = Config::default();
    assert_eq!(config.sweep_interval, 60);

    // Use a fast interval for the test rather than the production default
    let cache = shared_store(config.default_ttl);
    {
        let mut store = cache.write().await;
        store.set("stale", json!("old"), Ttl::Seconds(1));
        store.set("fresh", json!("new"), Ttl::Seconds(3600));
    }

    let handle = spawn_sweep_task(cache.clone(), 1);
    tokio::time::sleep(Duration::from_millis(2500)).await;

    {
        let store = cache.read().await;
        assert_eq!(store.len(), 1, "Sweep should have purged the stale entry");
    }

    handle.abort();
}

// == Verification Codes ==

#[tokio::test]
async fn test_verification_flow_is_isolated_from_content_cache() {
    // Two independent instantiations of the same store abstraction: one for
    // course content, one for verification codes
    let content = ReadThrough::new(shared_store(300));
    let codes = VerificationStore::with_defaults(Arc::new(RwLock::new(CacheStore::new(300))));

    content
        .get_or_populate("modules:all:1:10", Ttl::Default, || async {
            Ok::<_, std::io::Error>(json!({"modules": []}))
        })
        .await
        .unwrap();

    codes.issue("u42", "915533", "new-email@example.com").await.unwrap();

    // Clearing the content cache does not touch pending codes
    content.clear_all().await;

    let outcome = codes.verify("u42", "915533").await.unwrap();
    assert_eq!(
        outcome,
        VerifyOutcome::Confirmed("new-email@example.com".to_string())
    );
}
