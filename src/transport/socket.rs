//! Plain-socket HTTP/1.1 transport.
//!
//! One request per connection with `Connection: close`. The response body is
//! delimited by `Content-Length`, chunked encoding or end of stream. Only
//! `http://` endpoints are supported and proxies are not.

use super::http::HttpTransportConfig;
use super::{HttpMethod, Transport, TransportError, TransportRequest, TransportResponse};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, TRANSFER_ENCODING};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

/// Transport writing HTTP/1.1 directly on a TCP stream.
pub struct SocketTransport {
    host: String,
    port: u16,
    path: String,
    timeout: Duration,
    user_agent: String,
}

fn invalid(field: &str, details: String) -> Error {
    Error::configuration_with_context(
        "invalid socket transport configuration",
        ErrorContext::new()
            .with_field_path(field)
            .with_details(details)
            .with_source("socket_transport"),
    )
}

impl SocketTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let url = Url::parse(&config.base_url)
            .map_err(|e| invalid("base_url", format!("{}: {}", config.base_url, e)))?;
        if url.scheme() != "http" {
            return Err(invalid(
                "base_url",
                format!("unsupported scheme {}", url.scheme()),
            ));
        }
        if let Some(proxy) = config.proxy_url {
            return Err(invalid("proxy_url", format!("proxy {} not supported", proxy)));
        }
        let host = url
            .host_str()
            .ok_or_else(|| invalid("base_url", format!("{}: missing host", config.base_url)))?
            .to_string();

        Ok(Self {
            host,
            port: url.port_or_known_default().unwrap_or(80),
            path: url.path().to_string(),
            timeout: config.timeout,
            user_agent: config.user_agent,
        })
    }

    fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    fn render(&self, request: &TransportRequest) -> Vec<u8> {
        let encoded = request.encoded();
        let target = match request.method {
            HttpMethod::Get if !encoded.is_empty() => format!("{}?{}", self.path, encoded),
            _ => self.path.clone(),
        };

        let mut head = format!(
            "{} {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: {}\r\n",
            request.method,
            target,
            self.host_header(),
            self.user_agent
        );
        if request.method == HttpMethod::Post {
            head.push_str("Content-Type: application/x-www-form-urlencoded\r\n");
            head.push_str(&format!("Content-Length: {}\r\n", encoded.len()));
        }
        head.push_str("Connection: close\r\n\r\n");

        let mut wire = head.into_bytes();
        if request.method == HttpMethod::Post {
            wire.extend_from_slice(encoded.as_bytes());
        }
        wire
    }

    async fn exchange(&self, wire: &[u8]) -> std::io::Result<Vec<u8>> {
        // IPv6 literals come bracketed from the URL.
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let mut stream = TcpStream::connect((host, self.port)).await?;
        stream.write_all(wire).await?;
        stream.flush().await?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;
        Ok(raw)
    }
}

#[async_trait]
impl Transport for SocketTransport {
    async fn send(&self, request: &TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
        let wire = self.render(request);
        debug!(http_method = %request.method, host = %self.host, port = self.port, "sending request");
        let raw = tokio::time::timeout(self.timeout, self.exchange(&wire))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))??;
        let response = parse_response(&raw)?;
        debug!(status = response.status, bytes = response.body.len(), "received response");
        Ok(response)
    }

    fn name(&self) -> &'static str {
        "socket"
    }
}

fn malformed(what: &str) -> TransportError {
    TransportError::Other(format!("malformed HTTP response: {}", what))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Split a complete HTTP/1.x response into status, headers and decoded body.
pub(crate) fn parse_response(raw: &[u8]) -> std::result::Result<TransportResponse, TransportError> {
    let split = find(raw, b"\r\n\r\n").ok_or_else(|| malformed("missing end of headers"))?;
    let head = String::from_utf8_lossy(&raw[..split]);
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap_or_default();
    let mut parts = status_line.split_whitespace();
    let status = match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code
            .parse::<u16>()
            .map_err(|_| malformed("invalid status code"))?,
        _ => return Err(malformed("invalid status line")),
    };

    let mut headers = HeaderMap::new();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| malformed("header without colon"))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| malformed("invalid header name"))?;
        let value = HeaderValue::from_bytes(value.trim().as_bytes())
            .map_err(|_| malformed("invalid header value"))?;
        headers.append(name, value);
    }

    let rest = &raw[split + 4..];
    let chunked = headers
        .get(TRANSFER_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);
    let length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok());

    let body = if chunked {
        decode_chunked(rest)?
    } else if let Some(len) = length {
        if rest.len() < len {
            return Err(malformed("truncated body"));
        }
        rest[..len].to_vec()
    } else {
        rest.to_vec()
    };

    Ok(TransportResponse::new(status, headers, body))
}

fn decode_chunked(mut data: &[u8]) -> std::result::Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    loop {
        let line_end = find(data, b"\r\n").ok_or_else(|| malformed("truncated chunk size"))?;
        let size_line = std::str::from_utf8(&data[..line_end])
            .map_err(|_| malformed("invalid chunk size"))?;
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| malformed("invalid chunk size"))?;
        data = &data[line_end + 2..];

        if size == 0 {
            return Ok(body);
        }
        if data.len() < size + 2 {
            return Err(malformed("truncated chunk"));
        }
        body.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> SocketTransport {
        SocketTransport::new(HttpTransportConfig {
            base_url: base_url.into(),
            user_agent: "test-agent".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn renders_get_with_query() {
        let t = transport("http://ws.example.com/2.0/");
        let wire = t.render(&TransportRequest::new(
            HttpMethod::Get,
            vec![("method".into(), "artist.getInfo".into()), ("artist".into(), "AC/DC".into())],
        ));
        let text = String::from_utf8(wire).unwrap();
        assert!(text.starts_with("GET /2.0/?method=artist.getInfo&artist=AC%2FDC HTTP/1.1\r\n"));
        assert!(text.contains("\r\nHost: ws.example.com\r\n"));
        assert!(text.contains("\r\nUser-Agent: test-agent\r\n"));
        assert!(text.ends_with("Connection: close\r\n\r\n"));
    }

    #[test]
    fn renders_post_with_form_body() {
        let t = transport("http://127.0.0.1:8080/2.0/");
        let wire = t.render(&TransportRequest::new(
            HttpMethod::Post,
            vec![("method".into(), "track.love".into())],
        ));
        let text = String::from_utf8(wire).unwrap();
        assert!(text.starts_with("POST /2.0/ HTTP/1.1\r\n"));
        assert!(text.contains("\r\nHost: 127.0.0.1:8080\r\n"));
        assert!(text.contains("\r\nContent-Length: 17\r\n"));
        assert!(text.ends_with("\r\n\r\nmethod=track.love"));
    }

    #[test]
    fn rejects_https_and_proxies() {
        assert!(matches!(
            SocketTransport::new(HttpTransportConfig {
                base_url: "https://ws.example.com/2.0/".into(),
                ..Default::default()
            }),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            SocketTransport::new(HttpTransportConfig {
                proxy_url: Some("http://proxy:3128".into()),
                ..Default::default()
            }),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn parses_content_length_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nExpires: Sun, 06 Nov 1994 08:49:37 GMT\r\n\r\nhello trailing";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), b"hello");
        assert!(response.headers.contains_key("expires"));
    }

    #[test]
    fn parses_chunked_body() {
        let raw = b"HTTP/1.1 400 Bad Request\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n<lfm\r\n3;ext=1\r\n/>x\r\n0\r\n\r\n";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(response.body.as_ref(), b"<lfm/>x");
    }

    #[test]
    fn body_without_length_runs_to_end_of_stream() {
        let response = parse_response(b"HTTP/1.0 200 OK\r\n\r\n<lfm status=\"ok\"/>").unwrap();
        assert_eq!(response.body.as_ref(), b"<lfm status=\"ok\"/>");
    }

    #[test]
    fn malformed_responses_are_transport_errors() {
        for raw in [
            &b"garbage"[..],
            &b"SPDY 200\r\n\r\n"[..],
            &b"HTTP/1.1 abc OK\r\n\r\n"[..],
            &b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort"[..],
            &b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n"[..],
        ] {
            assert!(matches!(parse_response(raw), Err(TransportError::Other(_))));
        }
    }
}
