use super::{HttpMethod, Transport, TransportError, TransportRequest, TransportResponse};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Proxy;
use std::env;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Public Audioscrobbler 2.0 endpoint.
pub const DEFAULT_BASE_URL: &str = "http://ws.audioscrobbler.com/2.0/";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy_url: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
            proxy_url: None,
        }
    }
}

impl HttpTransportConfig {
    /// Defaults overridden by `LASTFM_BASE_URL`, `LASTFM_HTTP_TIMEOUT_SECS`
    /// and `LASTFM_PROXY_URL`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = env::var("LASTFM_BASE_URL") {
            cfg.base_url = url;
        }
        if let Some(secs) = env::var("LASTFM_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.timeout = Duration::from_secs(secs.max(1));
        }
        cfg.proxy_url = env::var("LASTFM_PROXY_URL").ok();
        cfg
    }
}

pub(crate) fn default_user_agent() -> String {
    format!("lastfm-api-rs/{}", env!("CARGO_PKG_VERSION"))
}

/// reqwest-backed transport. One instance holds one connection pool.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid base URL",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(format!("{}: {}", config.base_url, e))
                    .with_source("http_transport"),
            )
        })?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone());

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| {
                Error::configuration_with_context(
                    "invalid proxy URL",
                    ErrorContext::new()
                        .with_field_path("proxy_url")
                        .with_details(e.to_string())
                        .with_source("http_transport"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Http(e)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
        let encoded = request.encoded();
        let req = match request.method {
            HttpMethod::Get => {
                let mut url = self.base_url.clone();
                url.set_query(if encoded.is_empty() { None } else { Some(encoded.as_str()) });
                self.client.get(url)
            }
            HttpMethod::Post => self
                .client
                .post(self.base_url.clone())
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(encoded),
        };

        debug!(http_method = %request.method, url = %self.base_url, "sending request");
        let response = req.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        debug!(status, bytes = body.len(), "received response");

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
