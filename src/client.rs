//! Request caller for the Audioscrobbler 2.0 web service.
//!
//! Domain code enters through [`LastFmClient::call`] and
//! [`LastFmClient::signed_call`]; everything below (encoding, signing, cache,
//! transport, envelope parsing) is handled here.

pub mod auth;
pub mod builder;
pub mod config;
pub mod core;

pub use auth::Session;
pub use builder::LastFmClientBuilder;
pub use config::{CacheBackendKind, CacheSettings, ClientConfig, TransportKind};
pub use core::LastFmClient;
