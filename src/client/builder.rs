use super::config::{CacheBackendKind, ClientConfig, TransportKind};
use super::core::LastFmClient;
use crate::cache::{
    CacheConfig, CacheKeyGenerator, CachePolicy, CacheStore, DefaultCachePolicy, DiskCache,
    MemoryCache, ResponseCache,
};
use crate::transport::{HttpTransport, HttpTransportConfig, SocketTransport, Transport};
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const KEYRING_SERVICE: &str = "lastfm-api";
const KEYRING_USER: &str = "api_key";

enum CacheChoice {
    None,
    Store(Arc<dyn CacheStore>),
    Memory(Option<usize>),
    Disk(Option<PathBuf>),
    Sqlite(PathBuf),
}

/// Builder for [`LastFmClient`].
///
/// Unset values fall back to the environment at [`build`](Self::build) time:
/// - `LASTFM_API_KEY` (after the OS keyring, service `lastfm-api`)
/// - `LASTFM_API_SECRET`
/// - `LASTFM_BASE_URL`, `LASTFM_HTTP_TIMEOUT_SECS` (default 30), `LASTFM_PROXY_URL`
pub struct LastFmClientBuilder {
    api_key: Option<String>,
    api_secret: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    proxy_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    transport_kind: TransportKind,
    cache: CacheChoice,
    policy: Option<Arc<dyn CachePolicy>>,
    weekly_charts_ttl: Option<i64>,
    cache_config: CacheConfig,
    key_salt: Option<String>,
    use_keyring: bool,
}

impl LastFmClientBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            base_url: None,
            timeout: None,
            user_agent: None,
            proxy_url: None,
            transport: None,
            transport_kind: TransportKind::Http,
            cache: CacheChoice::None,
            policy: None,
            weekly_charts_ttl: None,
            cache_config: CacheConfig::default(),
            key_salt: None,
            use_keyring: true,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn api_secret(mut self, secret: impl Into<String>) -> Self {
        self.api_secret = Some(secret.into());
        self
    }

    /// Override the endpoint (primarily for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Use a custom transport. Endpoint, timeout, user agent and proxy
    /// settings are then ignored.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Built-in transport to construct when no custom one is given.
    pub fn transport_kind(mut self, kind: TransportKind) -> Self {
        self.transport_kind = kind;
        self
    }

    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache = CacheChoice::Store(store);
        self
    }

    pub fn memory_cache(mut self) -> Self {
        self.cache = CacheChoice::Memory(None);
        self
    }

    /// Memory cache evicting the least recently used entry past `max_entries`.
    pub fn bounded_memory_cache(mut self, max_entries: usize) -> Self {
        self.cache = CacheChoice::Memory(Some(max_entries));
        self
    }

    pub fn disk_cache(mut self, directory: impl Into<PathBuf>) -> Self {
        self.cache = CacheChoice::Disk(Some(directory.into()));
        self
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlite_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache = CacheChoice::Sqlite(path.into());
        self
    }

    pub fn cache_policy(mut self, policy: Arc<dyn CachePolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// TTL for current-week chart methods under the default policy.
    pub fn weekly_charts_ttl(mut self, secs: i64) -> Self {
        self.weekly_charts_ttl = Some(secs);
        self
    }

    pub fn max_cache_entry_size(mut self, bytes: usize) -> Self {
        self.cache_config.max_entry_size = bytes;
        self
    }

    /// Namespace cache keys, for applications sharing one store.
    pub fn cache_key_salt(mut self, salt: impl Into<String>) -> Self {
        self.key_salt = Some(salt.into());
        self
    }

    /// Whether to look the API key up in the OS keyring. On by default.
    pub fn keyring(mut self, enable: bool) -> Self {
        self.use_keyring = enable;
        self
    }

    /// Apply a loaded [`ClientConfig`]. Values already set on the builder are
    /// replaced by those present in the config.
    pub fn config(mut self, config: ClientConfig) -> Self {
        if config.api_key.is_some() {
            self.api_key = config.api_key;
        }
        if config.api_secret.is_some() {
            self.api_secret = config.api_secret;
        }
        if config.base_url.is_some() {
            self.base_url = config.base_url;
        }
        if let Some(secs) = config.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs.max(1)));
        }
        if config.user_agent.is_some() {
            self.user_agent = config.user_agent;
        }
        if config.proxy_url.is_some() {
            self.proxy_url = config.proxy_url;
        }
        if let Some(kind) = config.transport {
            self.transport_kind = kind;
        }

        let cache = config.cache;
        if let Some(backend) = cache.backend {
            self.cache = match backend {
                CacheBackendKind::None => CacheChoice::None,
                CacheBackendKind::Memory => CacheChoice::Memory(cache.capacity),
                CacheBackendKind::Disk => CacheChoice::Disk(cache.path),
                CacheBackendKind::Sqlite => CacheChoice::Sqlite(
                    cache.path.unwrap_or_else(|| PathBuf::from("lastfm.sqlite")),
                ),
            };
        }
        if cache.weekly_charts_ttl_secs.is_some() {
            self.weekly_charts_ttl = cache.weekly_charts_ttl_secs;
        }
        if let Some(bytes) = cache.max_entry_size {
            self.cache_config.max_entry_size = bytes;
        }
        if cache.key_salt.is_some() {
            self.key_salt = cache.key_salt;
        }
        self
    }

    pub fn build(self) -> Result<LastFmClient> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => Self::lookup_api_key(self.use_keyring).ok_or_else(|| {
                Error::configuration_with_context(
                    "no API key configured",
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_details("set it on the builder, in the keyring or in LASTFM_API_KEY")
                        .with_source("client_builder"),
                )
            })?,
        };
        let api_secret = self
            .api_secret
            .or_else(|| env::var("LASTFM_API_SECRET").ok())
            .filter(|s| !s.is_empty());

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => {
                let mut cfg = HttpTransportConfig::from_env();
                if let Some(url) = self.base_url {
                    cfg.base_url = url;
                }
                if let Some(timeout) = self.timeout {
                    cfg.timeout = timeout;
                }
                if let Some(agent) = self.user_agent {
                    cfg.user_agent = agent;
                }
                if self.proxy_url.is_some() {
                    cfg.proxy_url = self.proxy_url;
                }
                let built: Arc<dyn Transport> = match self.transport_kind {
                    TransportKind::Http => Arc::new(HttpTransport::new(cfg)?),
                    TransportKind::Socket => Arc::new(SocketTransport::new(cfg)?),
                };
                built
            }
        };

        let store = Self::open_store(self.cache)?;
        let policy: Arc<dyn CachePolicy> = match self.policy {
            Some(p) => p,
            None => {
                let mut p = DefaultCachePolicy::new();
                if let Some(ttl) = self.weekly_charts_ttl {
                    p = p.with_weekly_charts_expiration(ttl);
                }
                Arc::new(p)
            }
        };

        let keys = match self.key_salt {
            Some(salt) => CacheKeyGenerator::new().with_salt(salt),
            None => CacheKeyGenerator::new(),
        };

        info!(
            transport = transport.name(),
            cache = store.as_ref().map(|s| s.name()).unwrap_or("none"),
            policy = policy.name(),
            signed = api_secret.is_some(),
            "lastfm client ready"
        );

        Ok(LastFmClient {
            api_key,
            api_secret,
            transport,
            cache: ResponseCache::new(self.cache_config, store, policy),
            keys,
        })
    }

    fn lookup_api_key(use_keyring: bool) -> Option<String> {
        // 1. Keyring
        if use_keyring {
            if let Ok(entry) = Entry::new(KEYRING_SERVICE, KEYRING_USER) {
                if let Ok(key) = entry.get_password() {
                    return Some(key);
                }
            }
        }

        // 2. Environment
        env::var("LASTFM_API_KEY").ok().filter(|s| !s.is_empty())
    }

    fn open_store(choice: CacheChoice) -> Result<Option<Arc<dyn CacheStore>>> {
        let store: Option<Arc<dyn CacheStore>> = match choice {
            CacheChoice::None => None,
            CacheChoice::Store(store) => Some(store),
            CacheChoice::Memory(None) => Some(Arc::new(MemoryCache::new())),
            CacheChoice::Memory(Some(n)) => Some(Arc::new(MemoryCache::with_capacity(n))),
            CacheChoice::Disk(Some(dir)) => Some(Arc::new(DiskCache::new(dir))),
            CacheChoice::Disk(None) => Some(Arc::new(DiskCache::in_temp_dir())),
            #[cfg(feature = "sqlite")]
            CacheChoice::Sqlite(path) => {
                let store = crate::cache::SqliteCache::open(&path).map_err(|e| {
                    Error::configuration_with_context(
                        "cannot open SQLite cache",
                        ErrorContext::new()
                            .with_field_path(path.display().to_string())
                            .with_details(e.to_string())
                            .with_source("client_builder"),
                    )
                })?;
                Some(Arc::new(store))
            }
            #[cfg(not(feature = "sqlite"))]
            CacheChoice::Sqlite(_) => {
                return Err(Error::configuration(
                    "SQLite cache requested but the `sqlite` feature is disabled",
                ))
            }
        };
        Ok(store)
    }
}

impl Default for LastFmClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
