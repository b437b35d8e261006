//! Response envelope parsing.
//!
//! Every response is wrapped as
//!
//! ```xml
//! <lfm status="ok"><similarartists artist="Cher">…</similarartists></lfm>
//! <lfm status="failed"><error code="6">Artist not found</error></lfm>
//! ```
//!
//! A success yields the single child element as a [`Payload`]; a failure
//! becomes [`Error::Service`](crate::Error::Service) with the upstream code and
//! message untouched.

use crate::{Error, ErrorContext, Result};
use std::ops::Range;

const STATUS_ATTR: &str = "status";
const STATUS_OK: &str = "ok";

/// The payload element of a successful response.
///
/// Holds the exact source text of the element so that a cached body yields a
/// byte-identical payload. An `ok` envelope with no child element produces
/// an empty payload rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    name: String,
    xml: String,
}

impl Payload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.xml.is_empty()
    }

    /// Tag name of the payload element (e.g. `similarartists`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw XML of the payload element.
    pub fn as_xml(&self) -> &str {
        &self.xml
    }

    /// Parse the payload into a document for mapping onto domain types.
    pub fn document(&self) -> Result<roxmltree::Document<'_>> {
        roxmltree::Document::parse(&self.xml).map_err(|e| {
            Error::malformed_with_context(
                "payload is not well-formed XML",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("payload"),
            )
        })
    }

    /// Trimmed text content of the payload element (e.g. `<token>abc</token>`).
    pub fn text(&self) -> Result<String> {
        if self.is_empty() {
            return Ok(String::new());
        }
        let doc = self.document()?;
        Ok(text_of(doc.root_element()))
    }

    /// Trimmed text of the first direct child element called `name`.
    pub fn child_text(&self, name: &str) -> Result<Option<String>> {
        if self.is_empty() {
            return Ok(None);
        }
        let doc = self.document()?;
        Ok(doc
            .root_element()
            .children()
            .find(|n| n.is_element() && n.has_tag_name(name))
            .map(text_of))
    }
}

/// Parse a raw response body.
pub fn parse_envelope(body: &[u8]) -> Result<Payload> {
    let text = std::str::from_utf8(body).map_err(|e| {
        Error::malformed_with_context(
            "response body is not UTF-8",
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("envelope"),
        )
    })?;

    let doc = roxmltree::Document::parse(text).map_err(|e| {
        Error::malformed_with_context(
            "response body is not well-formed XML",
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("envelope"),
        )
    })?;

    let root = doc.root_element();
    let status = root.attribute(STATUS_ATTR).ok_or_else(|| {
        Error::malformed_with_context(
            "envelope has no status attribute",
            ErrorContext::new()
                .with_field_path(format!("{}@{}", root.tag_name().name(), STATUS_ATTR))
                .with_source("envelope"),
        )
    })?;

    if status == STATUS_OK {
        return Ok(match root.children().find(|n| n.is_element()) {
            Some(child) => Payload {
                name: child.tag_name().name().to_string(),
                xml: slice(text, child.range()).to_string(),
            },
            None => Payload::empty(),
        });
    }

    let error = root
        .children()
        .find(|n| n.is_element() && n.has_tag_name("error"))
        .ok_or_else(|| {
            Error::malformed_with_context(
                "failure envelope has no error element",
                ErrorContext::new()
                    .with_field_path(format!("{}/error", root.tag_name().name()))
                    .with_details(format!("status={}", status))
                    .with_source("envelope"),
            )
        })?;

    // A missing or non-numeric code is reported as 0.
    let code = error
        .attribute("code")
        .and_then(|c| c.trim().parse::<u32>().ok())
        .unwrap_or(0);
    Err(Error::service(code, text_of(error)))
}

fn text_of(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn slice(text: &str, range: Range<usize>) -> &str {
    text.get(range).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMILAR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<lfm status="ok">
<similarartists artist="Cher"><artist><name>Sonny &amp; Cher</name><match>1</match></artist></similarartists></lfm>"#;

    #[test]
    fn ok_envelope_returns_first_child_verbatim() {
        let payload = parse_envelope(SIMILAR.as_bytes()).unwrap();
        assert_eq!(payload.name(), "similarartists");
        assert_eq!(
            payload.as_xml(),
            r#"<similarartists artist="Cher"><artist><name>Sonny &amp; Cher</name><match>1</match></artist></similarartists>"#
        );
        let doc = payload.document().unwrap();
        assert_eq!(doc.root_element().attribute("artist"), Some("Cher"));
    }

    #[test]
    fn failed_envelope_becomes_service_error() {
        let body = r#"<lfm status="failed"><error code="6">Artist not found</error></lfm>"#;
        match parse_envelope(body.as_bytes()) {
            Err(Error::Service { code, message }) => {
                assert_eq!(code, 6);
                assert_eq!(message, "Artist not found");
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn message_is_trimmed_and_missing_code_is_zero() {
        let body = "<lfm status=\"failed\">\n  <error>\n    Invalid API key\n  </error>\n</lfm>";
        match parse_envelope(body.as_bytes()) {
            Err(Error::Service { code, message }) => {
                assert_eq!(code, 0);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn ok_without_child_is_empty_payload() {
        let payload = parse_envelope(br#"<lfm status="ok"></lfm>"#).unwrap();
        assert!(payload.is_empty());
        assert_eq!(payload.text().unwrap(), "");
        assert_eq!(payload.child_text("key").unwrap(), None);
    }

    #[test]
    fn malformed_bodies() {
        for body in [
            &b"<html>502 Bad Gateway"[..],
            &b""[..],
            &b"<lfm><artist/></lfm>"[..],
            &b"<lfm status=\"failed\"></lfm>"[..],
            &[0xff, 0xfe, 0x00][..],
        ] {
            assert!(
                matches!(parse_envelope(body), Err(Error::MalformedResponse { .. })),
                "body {:?} should be malformed",
                body
            );
        }
    }

    #[test]
    fn payload_text_helpers() {
        let token = parse_envelope(br#"<lfm status="ok"><token> abc123 </token></lfm>"#).unwrap();
        assert_eq!(token.text().unwrap(), "abc123");

        let session = parse_envelope(
            br#"<lfm status="ok"><session><name>RJ</name><key>d580d5</key><subscriber>0</subscriber></session></lfm>"#,
        )
        .unwrap();
        assert_eq!(session.child_text("key").unwrap().as_deref(), Some("d580d5"));
        assert_eq!(session.child_text("missing").unwrap(), None);
    }
}
