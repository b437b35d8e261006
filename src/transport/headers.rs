//! Response header helpers.

use chrono::{DateTime, NaiveDateTime};
use reqwest::header::{HeaderMap, EXPIRES};

/// First non-empty value among `names`. Lookup is case-insensitive.
pub fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(v) = headers.get(*name) {
            if let Ok(s) = v.to_str() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

/// Value of an `Expires` response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expires {
    /// Absolute expiration in unix seconds.
    At(i64),
    /// Present but not an HTTP date; carries the raw value.
    Unparsable(String),
}

/// `None` when the response has no `Expires` header.
pub fn expires(headers: &HeaderMap) -> Option<Expires> {
    let raw = header_first(headers, &[EXPIRES.as_str()])?;
    Some(match parse_http_date(&raw) {
        Some(at) => Expires::At(at),
        None => Expires::Unparsable(raw),
    })
}

/// Parse the three date forms RFC 7231 allows in HTTP headers.
fn parse_http_date(raw: &str) -> Option<i64> {
    // IMF-fixdate: "Sun, 06 Nov 1994 08:49:37 GMT"
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.timestamp());
    }
    // RFC 850: "Sunday, 06-Nov-94 08:49:37 GMT"
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%A, %d-%b-%y %H:%M:%S GMT") {
        return Some(dt.and_utc().timestamp());
    }
    // asctime: "Sun Nov  6 08:49:37 1994"
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%a %b %e %H:%M:%S %Y") {
        return Some(dt.and_utc().timestamp());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    const RFC_EXAMPLE: i64 = 784_111_777;

    #[test]
    fn parses_all_http_date_forms() {
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(RFC_EXAMPLE));
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(RFC_EXAMPLE));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(RFC_EXAMPLE));
        assert_eq!(parse_http_date("0"), None);
        assert_eq!(parse_http_date("tomorrow"), None);
    }

    #[test]
    fn expires_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(b"EXPIRES").unwrap(),
            HeaderValue::from_static("Sun, 06 Nov 1994 08:49:37 GMT"),
        );
        assert_eq!(expires(&headers), Some(Expires::At(RFC_EXAMPLE)));
        assert_eq!(
            header_first(&headers, &["Expires"]).as_deref(),
            Some("Sun, 06 Nov 1994 08:49:37 GMT")
        );
    }

    #[test]
    fn blank_headers_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-a", HeaderValue::from_static("  "));
        headers.insert("x-b", HeaderValue::from_static("value"));
        assert_eq!(header_first(&headers, &["x-a", "x-b"]).as_deref(), Some("value"));
        assert_eq!(expires(&headers), None);
    }

    #[test]
    fn unparsable_expires_keeps_raw_value() {
        let mut headers = HeaderMap::new();
        headers.insert("expires", HeaderValue::from_static("-1"));
        assert_eq!(expires(&headers), Some(Expires::Unparsable("-1".into())));
    }
}
