use thiserror::Error;

/// Failure inside a cache backend.
///
/// The client treats these as misses on read and ignores them on write.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "sqlite")]
    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid cache key {0:?}")]
    InvalidKey(String),

    #[error("cache lock poisoned in {0} backend")]
    Poisoned(&'static str),

    #[error("cache task failed: {0}")]
    TaskFailed(String),
}
