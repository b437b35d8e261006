//! # lastfm-api
//!
//! Request caller and response cache for the Audioscrobbler 2.0 web service.
//!
//! ## Overview
//!
//! Domain code (albums, artists, tracks, users) describes a call as a method
//! name plus parameters. This crate turns that into a wire request, signs it
//! when the call needs authentication, sends it, unwraps the `<lfm>` response
//! envelope and, where the expiration policy allows, keeps the raw response
//! so that repeated calls skip the network.
//!
//! ## Key Features
//!
//! - **Unified Client**: [`LastFmClient`] with unsigned and signed calls
//! - **Signing**: `api_sig` computation compatible with the service
//! - **Caching**: memory, disk and SQLite stores behind one trait, swappable at runtime
//! - **Expiration Policy**: week/year rules for charts and listings, or a custom [`cache::CachePolicy`]
//! - **Authentication**: token, session and mobile-session flows
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lastfm_api::{LastFmClient, Params};
//!
//! #[tokio::main]
//! async fn main() -> lastfm_api::Result<()> {
//!     let client = LastFmClient::builder()
//!         .api_key("your-api-key")
//!         .memory_cache()
//!         .build()?;
//!
//!     let similar = client
//!         .call("artist.getSimilar", Params::new().with("artist", "Cher"))
//!         .await?;
//!     println!("{}", similar.as_xml());
//!
//!     // Second call is served from the cache for a week.
//!     let _ = client
//!         .call("artist.getSimilar", Params::new().with("artist", "Cher"))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Parameter encoding, signing, envelope parsing |
//! | [`client`] | Client, builder, configuration and authentication |
//! | [`cache`] | Cache keys, expiration policy and storage backends |
//! | [`transport`] | HTTP transport abstraction |
//! | [`error_code`] | Known service error codes |

pub mod cache;
pub mod client;
pub mod error_code;
pub mod protocol;
pub mod transport;

// Re-export main types for convenience
pub use client::{LastFmClient, LastFmClientBuilder, Session};
pub use protocol::{ParamValue, Params, Payload};
pub use transport::HttpMethod;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
