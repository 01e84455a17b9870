//! Response body decoding.
//!
//! The forum serves pages tagged as a single-byte Western charset. Bodies are
//! decoded here so everything downstream works on valid UTF-8.

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;

static CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([a-z0-9_:.\-]+)"#).expect("Invalid charset regex")
});

/// How many leading bytes to scan for a `<meta>` charset declaration.
const SNIFF_LIMIT: usize = 1024;

/// Find the encoding a response is tagged with.
///
/// The `Content-Type` header wins; otherwise the start of the document is
/// scanned for a `<meta charset>` or `http-equiv` declaration. Labels follow
/// the WHATWG table, so `iso-8859-1` and `latin1` resolve to windows-1252.
#[must_use]
pub fn detect_charset(body: &[u8], content_type: Option<&str>) -> Option<&'static Encoding> {
    if let Some(label) = content_type.and_then(charset_label) {
        return Encoding::for_label(label.as_bytes());
    }

    let head = &body[..body.len().min(SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head);
    head.to_ascii_lowercase()
        .contains("<meta")
        .then(|| charset_label(&head))
        .flatten()
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}

/// Decode a response body to UTF-8 text. Untagged bodies and unknown labels
/// are decoded as lossy UTF-8.
#[must_use]
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = detect_charset(body, content_type).unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

fn charset_label(text: &str) -> Option<String> {
    CHARSET
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
