//! On-disk cache: `<hash>.body` holds the raw response, `<hash>.meta` the
//! expiration as decimal unix seconds.
//!
//! Several processes may share a directory. There is no locking; each file is
//! written to a temporary name and renamed into place, so the last writer
//! wins and readers never observe a partial body.

use super::backend::CacheStore;
use super::error::CacheError;
use super::key::CacheKey;
use super::unix_now;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

const BODY_EXT: &str = "body";
const META_EXT: &str = "meta";
const TMP_EXT: &str = "tmp";

pub struct DiskCache {
    directory: PathBuf,
}

impl DiskCache {
    /// Cache rooted at `directory`, created on first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// `lastfm.cache` under the system temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("lastfm.cache"))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &CacheKey, ext: &str) -> Result<PathBuf, CacheError> {
        let hash = key.as_str();
        let valid = !hash.is_empty()
            && hash
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CacheError::InvalidKey(hash.to_string()));
        }
        Ok(self.directory.join(format!("{}.{}", hash, ext)))
    }

    async fn write_atomic(&self, target: &Path, data: &[u8]) -> Result<(), CacheError> {
        // create_dir_all succeeds when another process created it first.
        fs::create_dir_all(&self.directory).await?;
        let tmp = target.with_extension(format!("{}.{}", Uuid::new_v4().simple(), TMP_EXT));
        fs::write(&tmp, data).await?;
        if let Err(e) = fs::rename(&tmp, target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

impl Default for DiskCache {
    fn default() -> Self {
        Self::in_temp_dir()
    }
}

async fn remove_if_present(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        match fs::metadata(self.path_for(key, BODY_EXT)?).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path_for(key, BODY_EXT)?).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, key: &CacheKey, body: &[u8], expires_at: i64) -> Result<(), CacheError> {
        let body_path = self.path_for(key, BODY_EXT)?;
        let meta_path = self.path_for(key, META_EXT)?;
        self.write_atomic(&body_path, body).await?;
        self.write_atomic(&meta_path, expires_at.to_string().as_bytes())
            .await
    }

    async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        remove_if_present(&self.path_for(key, BODY_EXT)?).await?;
        remove_if_present(&self.path_for(key, META_EXT)?).await
    }

    async fn is_expired(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let raw = match fs::read_to_string(self.path_for(key, META_EXT)?).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::InvalidData => {
                return Ok(true)
            }
            Err(e) => return Err(e.into()),
        };
        match raw.trim().parse::<i64>() {
            Ok(expires_at) => Ok(unix_now() > expires_at),
            Err(_) => {
                debug!(key = %key, "unreadable cache meta, treating as expired");
                Ok(true)
            }
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut dir = match fs::read_dir(&self.directory).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let ours = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some(BODY_EXT) | Some(META_EXT) | Some(TMP_EXT)
            );
            if ours {
                remove_if_present(&path).await?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}
