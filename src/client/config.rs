//! File-based client configuration.
//!
//! ```yaml
//! api_key: 0123456789abcdef
//! api_secret: fedcba9876543210
//! timeout_secs: 10
//! cache:
//!   backend: disk
//!   path: /var/cache/lastfm
//!   weekly_charts_ttl_secs: 86400
//! ```
//!
//! Every field is optional; anything left out falls back to the builder's
//! environment lookup or defaults.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub proxy_url: Option<String>,
    /// Wire mechanism; `http` when absent.
    pub transport: Option<TransportKind>,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// reqwest client, TLS and proxies supported.
    #[default]
    Http,
    /// HTTP/1.1 over a raw TCP socket, plain `http://` only.
    Socket,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Backend to open; when absent the builder keeps its own choice.
    pub backend: Option<CacheBackendKind>,
    /// Directory (`disk`) or database file (`sqlite`). Disk defaults to the
    /// system temp directory.
    pub path: Option<PathBuf>,
    /// Entry limit for the memory backend; unbounded when absent.
    pub capacity: Option<usize>,
    pub weekly_charts_ttl_secs: Option<i64>,
    pub max_entry_size: Option<usize>,
    pub key_salt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// Explicitly disable caching.
    None,
    Memory,
    Disk,
    Sqlite,
}

impl ClientConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                "invalid client configuration",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("client_config"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                "cannot read client configuration",
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_details(e.to_string())
                    .with_source("client_config"),
            )
        })?;
        Self::from_yaml_str(&raw)
    }
}
