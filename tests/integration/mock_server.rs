//! Mock HTTP server setup for integration tests

use lastfm_api::transport::{HttpTransport, HttpTransportConfig, SocketTransport};
use mockito::{Server, ServerGuard};
use std::time::Duration;

pub const API_PATH: &str = "/2.0/";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = format!("{}{}", server.url(), API_PATH);
        Self { server, base_url }
    }

    pub fn transport(&self) -> HttpTransport {
        HttpTransport::new(HttpTransportConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .expect("mock transport")
    }

    pub fn socket_transport(&self) -> SocketTransport {
        SocketTransport::new(HttpTransportConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .expect("mock socket transport")
    }

    /// Client talking to the mock server, with no cache.
    pub fn client(&self) -> lastfm_api::LastFmClient {
        lastfm_api::LastFmClient::builder()
            .api_key("test-key")
            .api_secret("test-secret")
            .keyring(false)
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(5))
            .build()
            .expect("mock client")
    }
}
