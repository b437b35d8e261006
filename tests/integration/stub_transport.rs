//! In-process transport that counts calls and records requests

use async_trait::async_trait;
use lastfm_api::transport::{Transport, TransportError, TransportRequest, TransportResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct CountingTransport {
    status: u16,
    headers: HeaderMap,
    body: String,
    calls: AtomicUsize,
    requests: Mutex<Vec<TransportRequest>>,
}

impl CountingTransport {
    pub fn new(body: &str) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.to_string(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).unwrap(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        Ok(TransportResponse::new(
            self.status,
            self.headers.clone(),
            self.body.clone().into_bytes(),
        ))
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Transport that fails every exchange.
pub struct DownTransport;

#[async_trait]
impl Transport for DownTransport {
    async fn send(&self, _: &TransportRequest) -> Result<TransportResponse, TransportError> {
        Err(TransportError::Other("connection refused".into()))
    }
}
