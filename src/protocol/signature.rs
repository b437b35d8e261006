//! `api_sig` computation.
//!
//! The service authenticates write and session calls with an MD5 over the
//! sorted parameters followed by the shared secret. MD5 is what the upstream
//! protocol verifies; it is not used here for any other purpose.

/// Reserved parameter name that carries the signature.
pub const SIGNATURE_PARAM: &str = "api_sig";

/// Parameters the service leaves out of the signed string. The server
/// verifies `api_sig` without `format` and `callback`, so signing them
/// yields an invalid signature (error 13).
const UNSIGNED_PARAMS: [&str; 3] = [SIGNATURE_PARAM, "format", "callback"];

/// Sign normalized parameters with the shared secret.
///
/// Pairs are expected in canonical order (see
/// [`Params::canonical`](super::Params::canonical)); they are re-sorted by
/// name here as well, so the result never depends on input iteration order.
///
/// The string that is hashed is `name1 value1 name2 value2 … secret` with no
/// separators, exactly as the service computes it. As a consequence
/// `{a: "bc"}` and `{ab: "c"}` sign identically.
pub fn sign(pairs: &[(String, String)], secret: &str) -> String {
    let mut sorted: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(name, _)| !UNSIGNED_PARAMS.contains(&name.as_str()))
        .collect();
    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let mut raw = String::new();
    for (name, value) in sorted {
        raw.push_str(name);
        raw.push_str(value);
    }
    raw.push_str(secret);
    md5_hex(&raw)
}

/// Append `api_sig` to already canonical pairs.
pub fn append_signature(pairs: &mut Vec<(String, String)>, secret: &str) {
    pairs.retain(|(name, _)| name != SIGNATURE_PARAM);
    let sig = sign(pairs, secret);
    pairs.push((SIGNATURE_PARAM.to_string(), sig));
}

/// Lowercase hex MD5 of `input`.
pub fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}
