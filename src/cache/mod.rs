//! # Response Caching Module
//!
//! Pluggable storage for raw response bodies, keyed by a hash of the request
//! parameters and governed by an expiration policy.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheStore`] | Trait implemented by every backend |
//! | [`MemoryCache`] | Process-lifetime map, optionally LRU bounded |
//! | [`DiskCache`] | One `.body` + `.meta` file pair per key |
//! | [`SqliteCache`] | Single-table embedded database (feature `sqlite`) |
//! | [`CachePolicy`] | Decides how long a method's response may be reused |
//! | [`CacheKeyGenerator`] | Stable 40-hex-char key from request parameters |
//! | [`ResponseCache`] | Swappable store/policy pair used by the client, with statistics |
//!
//! ## Example
//!
//! ```rust
//! use lastfm_api::cache::{CacheKey, CacheStore, MemoryCache, unix_now};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> lastfm_api::Result<()> {
//! let store = MemoryCache::new();
//! let key = CacheKey::new("0123456789abcdef0123456789abcdef01234567");
//! store.store(&key, b"<lfm status=\"ok\"/>", unix_now() + 60).await?;
//!
//! assert!(store.contains(&key).await?);
//! assert!(!store.is_expired(&key).await?);
//! # Ok(())
//! # }
//! ```
//!
//! Expiration is checked lazily on lookup; nothing sweeps stale entries in
//! the background.

mod backend;
mod disk;
mod error;
mod key;
mod manager;
mod policy;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use backend::{CacheStore, MemoryCache};
pub use disk::DiskCache;
pub use error::CacheError;
pub use key::{CacheKey, CacheKeyGenerator, AUTH_PARAMS};
pub use manager::{CacheConfig, CacheLayer, CacheStats, ResponseCache};
pub use policy::{
    CachePolicy, DefaultCachePolicy, DAY, HOUR, MINUTE, MONTH_IN_WEEKS, NOT_CACHEABLE, WEEK,
    WEEKLY_METHODS, YEAR,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCache;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as unix seconds, the unit every backend stores expirations in.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
