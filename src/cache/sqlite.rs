//! Embedded SQLite cache: one row per key in a single `cache` table.

use super::backend::CacheStore;
use super::error::CacheError;
use super::key::CacheKey;
use super::unix_now;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache (
    hash       TEXT PRIMARY KEY,
    body       BLOB NOT NULL,
    expiration INTEGER NOT NULL
);
"#;

/// SQLite-backed cache.
#[derive(Clone)]
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCache {
    /// Open (or create) a file-backed cache database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory database (for testing and short-lived jobs).
    pub fn memory() -> Result<Self, CacheError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, creating the table if needed.
    pub fn from_connection(conn: Connection) -> Result<Self, CacheError> {
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_connection(conn: &Connection) -> Result<(), CacheError> {
        // WAL mode for file-backed DBs (no-op for in-memory)
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(CACHE_SCHEMA)?;
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, CacheError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| CacheError::Poisoned("sqlite"))?;
            f(&guard)
        })
        .await
        .map_err(|e| CacheError::TaskFailed(e.to_string()))?
    }
}

#[async_trait]
impl CacheStore for SqliteCache {
    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let hash = key.as_str().to_owned();
        self.with_conn(move |conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM cache WHERE hash = ?1", [hash], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let hash = key.as_str().to_owned();
        self.with_conn(move |conn| {
            let body = conn
                .query_row("SELECT body FROM cache WHERE hash = ?1", [hash], |row| {
                    row.get::<_, Vec<u8>>(0)
                })
                .optional()?;
            Ok(body)
        })
        .await
    }

    async fn store(&self, key: &CacheKey, body: &[u8], expires_at: i64) -> Result<(), CacheError> {
        let hash = key.as_str().to_owned();
        let body = body.to_vec();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cache (hash, body, expiration) VALUES (?1, ?2, ?3)",
                params![hash, body, expires_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        let hash = key.as_str().to_owned();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM cache WHERE hash = ?1", [hash])?;
            Ok(())
        })
        .await
    }

    async fn is_expired(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let hash = key.as_str().to_owned();
        self.with_conn(move |conn| {
            let expiration: Option<i64> = conn
                .query_row(
                    "SELECT expiration FROM cache WHERE hash = ?1",
                    [hash],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(expiration.map(|e| unix_now() > e).unwrap_or(true))
        })
        .await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM cache", [])?;
            Ok(())
        })
        .await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
