use std::sync::Arc;

use futures_util::FutureExt;
use lectern::cache::{cache_key, key_path, pattern_matches, resolve_invalidation};
use lectern::{
    Cache, CacheEntry, CacheMode, CacheSelector, InMemorySession, LecternError, MemoryCache,
    Method, Params, SessionCache,
};
use serde_json::json;

#[tokio::test]
async fn memory_cache_basic_operations() {
    let cache = MemoryCache::new(CacheMode::ValueCache);
    assert!(cache.get("/a").await.unwrap().is_none());

    cache.set("/a", CacheEntry::Ready(json!(1))).await.unwrap();
    cache.set("/b", CacheEntry::Ready(json!(2))).await.unwrap();
    let value = cache.get("/a").await.unwrap().unwrap().resolve().await.unwrap();
    assert_eq!(value, json!(1));

    cache
        .delete_many(&["/a".to_string(), "/missing".to_string()])
        .await
        .unwrap();
    assert_eq!(cache.list_all_keys().await.unwrap(), vec!["/b".to_string()]);

    cache.delete("/b").await.unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn get_or_insert_keeps_the_first_entry() {
    let cache = MemoryCache::new(CacheMode::FutureCache);
    let first = async { Ok(json!("first")) }.boxed().shared();
    let second = async { Ok(json!("second")) }.boxed().shared();

    let (_, stored) = cache
        .get_or_insert("/k", CacheEntry::InFlight(first))
        .await
        .unwrap();
    assert!(stored);

    let (entry, stored) = cache
        .get_or_insert("/k", CacheEntry::InFlight(second))
        .await
        .unwrap();
    assert!(!stored);
    assert_eq!(entry.resolve().await.unwrap(), json!("first"));
}

#[tokio::test]
async fn session_cache_refuses_in_flight_entries() {
    let cache = SessionCache::new(Arc::new(InMemorySession::new()));
    assert_eq!(cache.mode(), CacheMode::ValueCache);

    let pending = async { Ok(json!(null)) }.boxed().shared();
    let err = cache
        .set("/k", CacheEntry::InFlight(pending))
        .await
        .unwrap_err();
    assert!(matches!(err, LecternError::Cache(_)));
}

#[tokio::test]
async fn session_cache_delete_many_in_one_write() {
    let cache = SessionCache::new(Arc::new(InMemorySession::new()));
    for key in ["/a", "/b", "/c"] {
        cache.set(key, CacheEntry::Ready(json!(key))).await.unwrap();
    }

    cache
        .delete_many(&["/a".to_string(), "/c".to_string()])
        .await
        .unwrap();

    assert_eq!(cache.list_all_keys().await.unwrap(), vec!["/b".to_string()]);
}

#[test]
fn selector_parsing() {
    assert_eq!("memory".parse::<CacheSelector>().unwrap(), CacheSelector::Memory);
    assert_eq!(" Session ".parse::<CacheSelector>().unwrap(), CacheSelector::Session);
    assert_eq!("".parse::<CacheSelector>().unwrap(), CacheSelector::None);
    assert!(matches!(
        "redis".parse::<CacheSelector>(),
        Err(LecternError::InvalidCacheConfiguration(_))
    ));
}

#[test]
fn keys_are_canonical_and_method_qualified() {
    let mut a = Params::new();
    a.insert("b".into(), json!(2));
    a.insert("a".into(), json!("x"));
    let mut b = Params::new();
    b.insert("a".into(), json!("x"));
    b.insert("b".into(), json!(2));

    let get = cache_key(Method::Get, "/api/v1/courses", &a);
    assert_eq!(get, cache_key(Method::Get, "/api/v1/courses", &b));
    assert_eq!(get, "/api/v1/courses?a=x&b=2");

    let post = cache_key(Method::Post, "/api/v1/courses", &a);
    assert_ne!(post, get);
    assert_eq!(key_path(&post), "/api/v1/courses");
}

#[test]
fn wildcard_expansion_against_a_snapshot() {
    let keys: Vec<String> = [
        "/api/v1/courses/42",
        "/api/v1/courses/42/users?per_page=10",
        "PUT /api/v1/courses/42/users",
        "/api/v1/courses/43",
    ]
    .map(String::from)
    .to_vec();

    let doomed = resolve_invalidation(&["/api/v1/courses/42/*".to_string()], &keys);
    assert_eq!(
        doomed,
        ["/api/v1/courses/42/users?per_page=10", "PUT /api/v1/courses/42/users"]
    );

    assert!(pattern_matches("/api/v1/courses/4*", "/api/v1/courses/43"));
    assert!(!pattern_matches("/api/v1/courses/4", "/api/v1/courses/43"));
}
