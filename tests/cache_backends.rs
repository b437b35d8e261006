//! The same store contract exercised against every backend.

use lastfm_api::cache::{unix_now, CacheKey, CacheStore, DiskCache, MemoryCache};
use std::sync::Arc;

fn key(n: u8) -> CacheKey {
    CacheKey::new(format!("{:040x}", n))
}

async fn round_trip(store: &dyn CacheStore) {
    let k = key(1);
    assert!(!store.contains(&k).await.unwrap());
    assert!(store.load(&k).await.unwrap().is_none());
    assert!(store.is_expired(&k).await.unwrap(), "{}: missing entry must be expired", store.name());

    store.store(&k, b"<lfm status=\"ok\"/>", unix_now() + 3600).await.unwrap();
    assert!(store.contains(&k).await.unwrap());
    assert!(!store.is_expired(&k).await.unwrap());
    assert_eq!(
        store.load(&k).await.unwrap().as_deref(),
        Some(&b"<lfm status=\"ok\"/>"[..])
    );

    // Overwrite replaces body and expiration.
    store.store(&k, b"second", unix_now() + 7200).await.unwrap();
    assert_eq!(store.load(&k).await.unwrap().as_deref(), Some(&b"second"[..]));
}

async fn expiry(store: &dyn CacheStore) {
    let stale = key(2);
    store.store(&stale, b"old", unix_now() - 1).await.unwrap();
    assert!(store.contains(&stale).await.unwrap());
    assert!(store.is_expired(&stale).await.unwrap(), "{}", store.name());
    // Expired entries stay loadable; freshness is the caller's decision.
    assert_eq!(store.load(&stale).await.unwrap().as_deref(), Some(&b"old"[..]));
}

async fn remove_and_clear(store: &dyn CacheStore) {
    let a = key(3);
    let b = key(4);
    store.store(&a, b"a", unix_now() + 60).await.unwrap();
    store.store(&b, b"b", unix_now() + 60).await.unwrap();

    store.remove(&a).await.unwrap();
    store.remove(&a).await.unwrap();
    assert!(!store.contains(&a).await.unwrap());
    assert!(store.contains(&b).await.unwrap());

    store.clear().await.unwrap();
    assert!(!store.contains(&b).await.unwrap());
}

async fn binary_bodies(store: &dyn CacheStore) {
    let k = key(5);
    let body: Vec<u8> = (0..=255u8).collect();
    store.store(&k, &body, unix_now() + 60).await.unwrap();
    assert_eq!(store.load(&k).await.unwrap(), Some(body));
}

async fn contract(store: Arc<dyn CacheStore>) {
    round_trip(store.as_ref()).await;
    expiry(store.as_ref()).await;
    remove_and_clear(store.as_ref()).await;
    binary_bodies(store.as_ref()).await;
}

#[tokio::test]
async fn memory_cache_contract() {
    contract(Arc::new(MemoryCache::new())).await;
}

#[tokio::test]
async fn bounded_memory_cache_evicts_least_recent() {
    let store = MemoryCache::with_capacity(2);
    store.store(&key(1), b"1", unix_now() + 60).await.unwrap();
    store.store(&key(2), b"2", unix_now() + 60).await.unwrap();
    store.store(&key(3), b"3", unix_now() + 60).await.unwrap();

    assert_eq!(store.len(), 2);
    assert!(!store.contains(&key(1)).await.unwrap());
    assert!(store.contains(&key(3)).await.unwrap());
}

#[tokio::test]
async fn disk_cache_contract() {
    let tmp = tempfile::tempdir().unwrap();
    contract(Arc::new(DiskCache::new(tmp.path().join("lastfm.cache")))).await;
}

#[tokio::test]
async fn disk_cache_is_shared_between_instances() {
    let tmp = tempfile::tempdir().unwrap();
    let writer = DiskCache::new(tmp.path());
    let reader = DiskCache::new(tmp.path());

    writer.store(&key(9), b"shared", unix_now() + 60).await.unwrap();
    assert_eq!(reader.load(&key(9)).await.unwrap().as_deref(), Some(&b"shared"[..]));
    assert!(!reader.is_expired(&key(9)).await.unwrap());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_cache_contract() {
    use lastfm_api::cache::SqliteCache;

    contract(Arc::new(SqliteCache::memory().unwrap())).await;

    let tmp = tempfile::tempdir().unwrap();
    contract(Arc::new(SqliteCache::open(tmp.path().join("cache.sqlite")).unwrap())).await;
}
