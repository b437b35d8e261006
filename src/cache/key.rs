//! Cache key generation.

use crate::protocol::Params;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Parameters that identify the caller rather than the request. They never
/// take part in a cache key.
pub const AUTH_PARAMS: [&str; 3] = ["api_key", "sk", "api_sig"];

const NAME_END: u8 = 0x1f;
const VALUE_END: u8 = 0x1e;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub hash: String,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Derives a [`CacheKey`] from request parameters.
///
/// The key is the lowercase hex SHA-1 (40 chars) of the canonical pairs, with
/// the method included and [`AUTH_PARAMS`] excluded. Each name and value is
/// terminated by a control byte, so `{a: "bc"}` and `{ab: "c"}` hash apart.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyGenerator {
    salt: Option<String>,
}

impl CacheKeyGenerator {
    pub fn new() -> Self {
        Self { salt: None }
    }

    /// Namespace keys, e.g. per application sharing one disk directory.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn generate(&self, params: &Params) -> CacheKey {
        self.generate_from_pairs(&params.canonical())
    }

    /// Key for already normalized pairs. Order does not matter.
    pub fn generate_from_pairs(&self, pairs: &[(String, String)]) -> CacheKey {
        let mut sorted: Vec<&(String, String)> = pairs
            .iter()
            .filter(|(name, _)| !AUTH_PARAMS.contains(&name.as_str()))
            .collect();
        sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

        let mut hasher = Sha1::new();
        if let Some(ref s) = self.salt {
            hasher.update(s.as_bytes());
            hasher.update([VALUE_END]);
        }
        for (name, value) in sorted {
            hasher.update(name.as_bytes());
            hasher.update([NAME_END]);
            hasher.update(value.as_bytes());
            hasher.update([VALUE_END]);
        }
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        CacheKey::new(hash)
    }
}
