use super::auth::Session;
use super::builder::LastFmClientBuilder;
use crate::cache::{CacheKeyGenerator, CachePolicy, CacheStats, CacheStore, ResponseCache};
use crate::protocol::signature::append_signature;
use crate::protocol::{parse_envelope, Params, Payload};
use crate::transport::{HttpMethod, Transport, TransportRequest};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use tracing::debug;

/// Methods whose responses carry credentials and are never cached.
const AUTH_NAMESPACE: &str = "auth.";

/// Client for the web service.
///
/// `Send + Sync`; share it behind an `Arc` or by reference. The cache store
/// and policy can be swapped while calls are in flight: each call works on the
/// pair it saw when it started.
pub struct LastFmClient {
    pub(crate) api_key: String,
    pub(crate) api_secret: Option<String>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) cache: ResponseCache,
    pub(crate) keys: CacheKeyGenerator,
}

impl LastFmClient {
    pub fn builder() -> LastFmClientBuilder {
        LastFmClientBuilder::new()
    }

    /// Client with the default HTTP transport and no cache.
    pub fn new(api_key: impl Into<String>, api_secret: Option<String>) -> Result<Self> {
        let mut builder = LastFmClientBuilder::new().api_key(api_key);
        if let Some(secret) = api_secret {
            builder = builder.api_secret(secret);
        }
        builder.build()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn has_secret(&self) -> bool {
        self.api_secret.is_some()
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Unsigned GET call.
    pub async fn call(&self, method: &str, params: Params) -> Result<Payload> {
        self.call_with_method(method, params, HttpMethod::Get).await
    }

    pub async fn call_with_method(
        &self,
        method: &str,
        params: Params,
        http_method: HttpMethod,
    ) -> Result<Payload> {
        self.execute(method, params, http_method, false, None).await
    }

    /// Signed GET call, optionally on behalf of an authenticated user.
    ///
    /// Calls that carry a session key bypass the cache.
    pub async fn signed_call(
        &self,
        method: &str,
        params: Params,
        session: Option<&Session>,
    ) -> Result<Payload> {
        self.signed_call_with_method(method, params, session, HttpMethod::Get)
            .await
    }

    pub async fn signed_call_with_method(
        &self,
        method: &str,
        params: Params,
        session: Option<&Session>,
        http_method: HttpMethod,
    ) -> Result<Payload> {
        self.execute(method, params, http_method, true, session).await
    }

    /// Replace the cache store; `None` disables caching.
    pub fn set_cache_store(&self, store: Option<Arc<dyn CacheStore>>) {
        self.cache.set_store(store);
    }

    pub fn cache_store(&self) -> Option<Arc<dyn CacheStore>> {
        self.cache.store()
    }

    pub fn set_cache_policy(&self, policy: Arc<dyn CachePolicy>) {
        self.cache.set_policy(policy);
    }

    pub fn cache_policy(&self) -> Arc<dyn CachePolicy> {
        self.cache.policy()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn execute(
        &self,
        method: &str,
        params: Params,
        http_method: HttpMethod,
        signed: bool,
        session: Option<&Session>,
    ) -> Result<Payload> {
        let secret = if signed {
            Some(self.api_secret.as_deref().ok_or_else(|| {
                Error::configuration_with_context(
                    "signed call requires an API secret",
                    ErrorContext::new()
                        .with_field_path("api_secret")
                        .with_details(format!("method {}", method))
                        .with_source("client"),
                )
            })?)
        } else {
            None
        };

        let mut request = Params::new()
            .with("method", method)
            .with("api_key", self.api_key.as_str());
        if let Some(session) = session {
            request.insert("sk", session.key.as_str());
        }
        request.merge(params);
        // The wire `method` always matches the called method.
        if request.get("method").and_then(|v| v.to_wire()).as_deref() != Some(method) {
            debug!(method, "ignoring `method` parameter that differs from the called method");
            request.insert("method", method);
        }
        let mut pairs = request.canonical();

        let layer = self.cache.snapshot();
        let cacheable = session.is_none() && !method.starts_with(AUTH_NAMESPACE);
        let key = self.keys.generate_from_pairs(&pairs);

        if cacheable {
            if let Some(body) = self.cache.lookup(&layer, &key).await {
                match parse_envelope(&body) {
                    Ok(payload) => return Ok(payload),
                    Err(e) => {
                        debug!(method, key = %key, error = %e, "discarding unreadable cache entry");
                        self.cache.evict(&layer, &key).await;
                    }
                }
            }
        }

        if let Some(secret) = secret {
            append_signature(&mut pairs, secret);
        }

        debug!(method, http_method = %http_method, signed, "dispatching call");
        let response = self
            .transport
            .send(&TransportRequest::new(http_method, pairs))
            .await?;
        debug!(method, status = response.status, "response received");

        let payload = parse_envelope(&response.body)?;
        if cacheable {
            self.cache
                .store_response(&layer, &key, method, &request, &response.headers, &response.body)
                .await;
        }
        Ok(payload)
    }
}
