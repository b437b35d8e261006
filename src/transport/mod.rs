//! # Transport Layer
//!
//! Moves an encoded request to the web service and returns the raw body with
//! its headers. The client only sees the [`Transport`] trait; [`HttpTransport`]
//! is the reqwest-backed production implementation and tests substitute
//! their own. [`SocketTransport`] speaks HTTP/1.1 directly over TCP for
//! plain `http://` endpoints.
//!
//! An HTTP error status is *not* a transport failure: the service answers
//! failed calls with a 4xx status and a regular failure envelope, which the
//! client parses like any other body. Only failing to complete the exchange
//! (DNS, refused connection, timeout, broken HTTP) is a [`TransportError`].

mod headers;
mod http;
mod socket;

pub use headers::{expires, header_first, Expires};
pub use http::{HttpTransport, HttpTransportConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use socket::SocketTransport;

use crate::protocol::params::encode_pairs;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request: normalized pairs, signature included when signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub params: Vec<(String, String)>,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, params: Vec<(String, String)>) -> Self {
        Self { method, params }
    }

    /// Form-encoded parameters, used as query string (GET) or body (POST).
    pub fn encoded(&self) -> String {
        encode_pairs(&self.params)
    }

    /// Value of a parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Case-insensitive by construction.
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;

    fn name(&self) -> &'static str {
        "custom"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_preserves_pair_order() {
        let req = TransportRequest::new(
            HttpMethod::Post,
            vec![
                ("method".into(), "track.love".into()),
                ("artist".into(), "AC/DC".into()),
                ("api_sig".into(), "abc".into()),
            ],
        );
        assert_eq!(req.encoded(), "method=track.love&artist=AC%2FDC&api_sig=abc");
        assert_eq!(req.param("artist"), Some("AC/DC"));
        assert_eq!(req.param("sk"), None);
        assert_eq!(req.method.to_string(), "POST");
    }
}
