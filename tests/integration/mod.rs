//! Shared fixtures for integration tests
#![allow(dead_code)]

pub mod mock_server;
pub mod stub_transport;

/// Install a test-writer subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const SIMILAR_OK: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<lfm status="ok">
<similarartists artist="Cher"><artist><name>Sonny &amp; Cher</name><match>1</match></artist></similarartists></lfm>"#;

pub const SIMILAR_PAYLOAD: &str = r#"<similarartists artist="Cher"><artist><name>Sonny &amp; Cher</name><match>1</match></artist></similarartists>"#;

pub const ARTIST_NOT_FOUND: &str =
    r#"<lfm status="failed"><error code="6">Artist not found</error></lfm>"#;

pub const SESSION_OK: &str = r#"<lfm status="ok"><session><name>MyLastFMUsername</name><key>d580d57f32848f5dcf574d1ce18d78b2</key><subscriber>0</subscriber></session></lfm>"#;
