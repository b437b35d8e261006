//! Cache store trait and the in-memory backend.

use super::error::CacheError;
use super::key::CacheKey;
use super::unix_now;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Storage for raw response bodies with an absolute expiration.
///
/// Expirations are unix seconds. Implementations never sweep in the
/// background; callers check [`CacheStore::is_expired`] on lookup.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Stored body, `None` when absent. Does not check expiration.
    async fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Insert or overwrite the entry for `key`.
    async fn store(&self, key: &CacheKey, body: &[u8], expires_at: i64) -> Result<(), CacheError>;

    /// Delete the entry; deleting a missing key is not an error.
    async fn remove(&self, key: &CacheKey) -> Result<(), CacheError>;

    /// `true` once the current time is strictly past the stored expiration,
    /// and for entries with no readable expiration at all.
    async fn is_expired(&self, key: &CacheKey) -> Result<bool, CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;

    fn name(&self) -> &'static str;
}

#[derive(Clone)]
struct MemoryEntry {
    body: Vec<u8>,
    expires_at: i64,
}

/// Process-lifetime cache, lost on restart.
///
/// Unbounded by default; [`MemoryCache::with_capacity`] evicts the least
/// recently loaded entry once the limit is reached.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, MemoryEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, MemoryEntry>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::Poisoned("memory"))
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.lock()?.contains(key.as_str()))
    }

    async fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.lock()?.get(key.as_str()).map(|e| e.body.clone()))
    }

    async fn store(&self, key: &CacheKey, body: &[u8], expires_at: i64) -> Result<(), CacheError> {
        self.lock()?.put(
            key.hash.clone(),
            MemoryEntry {
                body: body.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.lock()?.pop(key.as_str());
        Ok(())
    }

    async fn is_expired(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let entries = self.lock()?;
        Ok(entries
            .peek(key.as_str())
            .map(|e| unix_now() > e.expires_at)
            .unwrap_or(true))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.lock()?.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
