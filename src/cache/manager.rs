//! Response cache used by the client: the active store/policy pair plus
//! statistics.

use super::backend::CacheStore;
use super::key::CacheKey;
use super::policy::CachePolicy;
use super::unix_now;
use crate::protocol::Params;
use crate::transport::{expires, Expires};
use arc_swap::ArcSwap;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Bodies larger than this are never stored.
    pub max_entry_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entry_size: 10 * 1024 * 1024,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entry_size(mut self, bytes: usize) -> Self {
        self.max_entry_size = bytes;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    /// Responses not stored: policy said no, past `Expires`, or too large.
    pub skipped: u64,
    /// Backend failures absorbed by the caller.
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// The store and policy in effect for one call.
#[derive(Clone)]
pub struct CacheLayer {
    pub store: Option<Arc<dyn CacheStore>>,
    pub policy: Arc<dyn CachePolicy>,
}

/// Holds the active [`CacheLayer`] behind an `ArcSwap`.
///
/// A call loads a snapshot once and uses it throughout, so swapping the
/// store or policy never tears an in-flight request. Backend failures are
/// counted and logged, never returned.
pub struct ResponseCache {
    layer: ArcSwap<CacheLayer>,
    config: CacheConfig,
    stats: AtomicStats,
}

impl ResponseCache {
    pub fn new(
        config: CacheConfig,
        store: Option<Arc<dyn CacheStore>>,
        policy: Arc<dyn CachePolicy>,
    ) -> Self {
        Self {
            layer: ArcSwap::from_pointee(CacheLayer { store, policy }),
            config,
            stats: AtomicStats::default(),
        }
    }

    pub fn snapshot(&self) -> Arc<CacheLayer> {
        self.layer.load_full()
    }

    pub fn store(&self) -> Option<Arc<dyn CacheStore>> {
        self.layer.load().store.clone()
    }

    pub fn policy(&self) -> Arc<dyn CachePolicy> {
        self.layer.load().policy.clone()
    }

    /// Replace the store; `None` disables caching.
    pub fn set_store(&self, store: Option<Arc<dyn CacheStore>>) {
        info!(
            backend = store.as_ref().map(|s| s.name()).unwrap_or("none"),
            "cache store replaced"
        );
        self.layer.rcu(|current| CacheLayer {
            store: store.clone(),
            policy: current.policy.clone(),
        });
    }

    pub fn set_policy(&self, policy: Arc<dyn CachePolicy>) {
        info!(policy = policy.name(), "cache policy replaced");
        self.layer.rcu(|current| CacheLayer {
            store: current.store.clone(),
            policy: policy.clone(),
        });
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    /// Fresh cached body for `key`, if any.
    ///
    /// Expired entries and backend failures are both misses.
    pub async fn lookup(&self, layer: &CacheLayer, key: &CacheKey) -> Option<Vec<u8>> {
        let store = layer.store.as_ref()?;
        match Self::read_fresh(store.as_ref(), key).await {
            Ok(Some(body)) => {
                debug!(key = %key, backend = store.name(), "cache hit");
                AtomicStats::bump(&self.stats.hits);
                Some(body)
            }
            Ok(None) => {
                debug!(key = %key, backend = store.name(), "cache miss");
                AtomicStats::bump(&self.stats.misses);
                None
            }
            Err(e) => {
                warn!(key = %key, backend = store.name(), error = %e, "cache read failed");
                AtomicStats::bump(&self.stats.errors);
                AtomicStats::bump(&self.stats.misses);
                None
            }
        }
    }

    async fn read_fresh(
        store: &dyn CacheStore,
        key: &CacheKey,
    ) -> Result<Option<Vec<u8>>, super::CacheError> {
        if !store.contains(key).await? || store.is_expired(key).await? {
            return Ok(None);
        }
        store.load(key).await
    }

    /// Drop an entry, e.g. one whose body no longer parses.
    pub async fn evict(&self, layer: &CacheLayer, key: &CacheKey) {
        if let Some(store) = layer.store.as_ref() {
            if let Err(e) = store.remove(key).await {
                warn!(key = %key, backend = store.name(), error = %e, "cache remove failed");
                AtomicStats::bump(&self.stats.errors);
            }
        }
    }

    /// Absolute expiration for a response, `None` when it must not be stored.
    ///
    /// A parsable `Expires` header wins over the policy.
    pub fn expiration_for(
        &self,
        layer: &CacheLayer,
        method: &str,
        params: &Params,
        headers: &HeaderMap,
    ) -> Option<i64> {
        let now = unix_now();
        match expires(headers) {
            Some(Expires::At(at)) if at > now => return Some(at),
            Some(Expires::At(_)) => return None,
            Some(Expires::Unparsable(raw)) => {
                warn!(method, expires = %raw, "unparsable Expires header, using policy")
            }
            None => {}
        }
        let ttl = layer.policy.expiration_secs(method, params);
        if ttl > 0 {
            Some(now + ttl)
        } else {
            None
        }
    }

    /// Store a successful response if the header or policy allows it.
    ///
    /// Returns whether the body was written.
    pub async fn store_response(
        &self,
        layer: &CacheLayer,
        key: &CacheKey,
        method: &str,
        params: &Params,
        headers: &HeaderMap,
        body: &[u8],
    ) -> bool {
        let Some(store) = layer.store.as_ref() else {
            return false;
        };
        let Some(expires_at) = self.expiration_for(layer, method, params, headers) else {
            debug!(method, key = %key, "response not cacheable");
            AtomicStats::bump(&self.stats.skipped);
            return false;
        };
        if body.len() > self.config.max_entry_size {
            debug!(method, bytes = body.len(), "response too large to cache");
            AtomicStats::bump(&self.stats.skipped);
            return false;
        }
        match store.store(key, body, expires_at).await {
            Ok(()) => {
                debug!(method, key = %key, expires_at, backend = store.name(), "response cached");
                AtomicStats::bump(&self.stats.stores);
                true
            }
            Err(e) => {
                warn!(method, key = %key, backend = store.name(), error = %e, "cache write failed");
                AtomicStats::bump(&self.stats.errors);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, DefaultCachePolicy, MemoryCache, WEEK};
    use async_trait::async_trait;
    use reqwest::header::{HeaderValue, EXPIRES};

    fn memory_layer() -> (ResponseCache, Arc<MemoryCache>) {
        let store = Arc::new(MemoryCache::new());
        let cache = ResponseCache::new(
            CacheConfig::default(),
            Some(store.clone()),
            Arc::new(DefaultCachePolicy::new()),
        );
        (cache, store)
    }

    fn key() -> CacheKey {
        CacheKey::new("c".repeat(40))
    }

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn contains(&self, _: &CacheKey) -> Result<bool, CacheError> {
            Err(CacheError::Poisoned("broken"))
        }
        async fn load(&self, _: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Poisoned("broken"))
        }
        async fn store(&self, _: &CacheKey, _: &[u8], _: i64) -> Result<(), CacheError> {
            Err(CacheError::Poisoned("broken"))
        }
        async fn remove(&self, _: &CacheKey) -> Result<(), CacheError> {
            Err(CacheError::Poisoned("broken"))
        }
        async fn is_expired(&self, _: &CacheKey) -> Result<bool, CacheError> {
            Err(CacheError::Poisoned("broken"))
        }
        async fn clear(&self) -> Result<(), CacheError> {
            Ok(())
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn policy_ttl_drives_storage() {
        let (cache, store) = memory_layer();
        let layer = cache.snapshot();
        let headers = HeaderMap::new();

        assert!(
            !cache
                .store_response(&layer, &key(), "album.getInfo", &Params::new(), &headers, b"x")
                .await
        );
        assert!(store.is_empty());

        let before = unix_now();
        assert!(
            cache
                .store_response(&layer, &key(), "artist.getSimilar", &Params::new(), &headers, b"x")
                .await
        );
        let at = cache
            .expiration_for(&layer, "artist.getSimilar", &Params::new(), &headers)
            .unwrap();
        assert!(at >= before + WEEK);
        assert_eq!(cache.lookup(&layer, &key()).await.as_deref(), Some(&b"x"[..]));

        let stats = cache.stats();
        assert_eq!((stats.stores, stats.skipped, stats.hits), (1, 1, 1));
    }

    #[test]
    fn expires_header_overrides_policy() {
        let (cache, _) = memory_layer();
        let layer = cache.snapshot();
        let mut headers = HeaderMap::new();

        headers.insert(EXPIRES, HeaderValue::from_static("Sat, 06 Nov 2094 08:49:37 GMT"));
        let at = cache.expiration_for(&layer, "album.getInfo", &Params::new(), &headers);
        assert_eq!(at, Some(3_939_871_777));

        headers.insert(EXPIRES, HeaderValue::from_static("Sun, 06 Nov 1994 08:49:37 GMT"));
        assert_eq!(
            cache.expiration_for(&layer, "artist.getSimilar", &Params::new(), &headers),
            None
        );

        headers.insert(EXPIRES, HeaderValue::from_static("-1"));
        assert_eq!(
            cache.expiration_for(&layer, "album.getInfo", &Params::new(), &headers),
            None
        );
        assert!(cache
            .expiration_for(&layer, "artist.getSimilar", &Params::new(), &headers)
            .is_some());
    }

    #[tokio::test]
    async fn oversized_bodies_are_skipped() {
        let store = Arc::new(MemoryCache::new());
        let cache = ResponseCache::new(
            CacheConfig::new().with_max_entry_size(4),
            Some(store.clone()),
            Arc::new(DefaultCachePolicy::new()),
        );
        let layer = cache.snapshot();
        assert!(
            !cache
                .store_response(&layer, &key(), "tag.getTopTags", &Params::new(), &HeaderMap::new(), b"12345")
                .await
        );
        assert!(store.is_empty());
        assert_eq!(cache.stats().skipped, 1);
    }

    #[tokio::test]
    async fn backend_failures_are_absorbed() {
        let cache = ResponseCache::new(
            CacheConfig::default(),
            Some(Arc::new(BrokenStore)),
            Arc::new(DefaultCachePolicy::new()),
        );
        let layer = cache.snapshot();
        assert!(cache.lookup(&layer, &key()).await.is_none());
        assert!(
            !cache
                .store_response(&layer, &key(), "tag.getTopTags", &Params::new(), &HeaderMap::new(), b"x")
                .await
        );
        cache.evict(&layer, &key()).await;

        let stats = cache.stats();
        assert_eq!(stats.errors, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stores, 0);
    }

    #[tokio::test]
    async fn swapping_store_leaves_old_snapshot_intact() {
        let (cache, first) = memory_layer();
        let old = cache.snapshot();
        cache.set_store(None);

        assert!(cache.store().is_none());
        assert!(old.store.is_some());
        assert!(
            cache
                .store_response(&old, &key(), "tag.getTopTags", &Params::new(), &HeaderMap::new(), b"x")
                .await
        );
        assert_eq!(first.len(), 1);

        let current = cache.snapshot();
        assert!(cache.lookup(&current, &key()).await.is_none());
        assert_eq!(cache.policy().name(), "default");
    }

    #[test]
    fn hit_ratio_handles_empty_stats() {
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_ratio(), 0.75);
    }
}
