//! # Wire Protocol Layer
//!
//! Everything that touches the exact bytes exchanged with the web service,
//! independent of how they are transported or cached.
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`params`] | Parameter maps, UTF-8 normalization, canonical ordering, form encoding |
//! | [`signature`] | `api_sig` computation for signed calls |
//! | [`envelope`] | `<lfm status="…">` response envelope parsing |
//!
//! ## Example
//!
//! ```rust
//! use lastfm_api::protocol::{params::Params, signature};
//!
//! let params = Params::new()
//!     .with("method", "auth.getSession")
//!     .with("api_key", "key")
//!     .with("token", "t0k3n");
//!
//! let sig = signature::sign(&params.canonical(), "secret");
//! assert_eq!(sig.len(), 32);
//! ```

pub mod envelope;
pub mod params;
pub mod signature;

pub use envelope::{parse_envelope, Payload};
pub use params::{ParamValue, Params};
