// src/utils/encoding.rs

//! Charset detection for fetched pages.
//!
//! The encoding is taken from the `Content-Type` header, then from a
//! `<meta>` declaration near the top of the document, then defaults to
//! UTF-8. A byte order mark always wins over both.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

/// Bytes of the document searched for a `<meta>` charset declaration.
const META_SNIFF_LEN: usize = 1024;

#[allow(clippy::expect_used)]
static CHARSET_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;>]+)"#).expect("charset param regex")
});

#[allow(clippy::expect_used)]
static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s/>;]+)"#).expect("meta charset regex")
});

/// Encoding named by a `charset=` parameter in a `Content-Type` value.
pub fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    CHARSET_PARAM_RE
        .captures(content_type)
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
}

/// Encoding declared by `<meta charset>` or `<meta http-equiv>` in the head.
pub fn charset_from_meta(body: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&body[..body.len().min(META_SNIFF_LEN)]);
    META_CHARSET_RE
        .captures(&head)
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
}

/// Pick the encoding for a response body.
pub fn detect_encoding(body: &[u8], content_type: Option<&str>) -> &'static Encoding {
    content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(body))
        .unwrap_or(UTF_8)
}

/// Decode a response body to UTF-8 text.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = detect_encoding(body, content_type);
    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        log::warn!("Body contained bytes invalid for {}", used.name());
    } else {
        log::debug!("Decoded body as {}", used.name());
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use encoding_rs::{EUC_JP, SHIFT_JIS};

    use super::*;

    fn shift_jis(text: &str) -> Vec<u8> {
        SHIFT_JIS.encode(text).0.into_owned()
    }

    #[test]
    fn test_header_charset() {
        let body = shift_jis("<p>抽選販売のお知らせ</p>");
        let text = decode_body(&body, Some("text/html; charset=Shift_JIS"));
        assert_eq!(text, "<p>抽選販売のお知らせ</p>");
    }

    #[test]
    fn test_quoted_header_charset() {
        assert_eq!(
            charset_from_content_type(r#"text/html; charset="euc-jp""#),
            Some(EUC_JP)
        );
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[test]
    fn test_meta_charset_without_header() {
        let body = shift_jis(r#"<html><head><meta charset="shift_jis"></head><body><h2>抽選</h2></body></html>"#);
        assert_eq!(detect_encoding(&body, Some("text/html")), SHIFT_JIS);
        assert!(decode_body(&body, None).contains("<h2>抽選</h2>"));
    }

    #[test]
    fn test_meta_http_equiv() {
        let body = shift_jis(
            r#"<meta http-equiv="Content-Type" content="text/html; charset=Shift_JIS"><p>抽選</p>"#,
        );
        assert_eq!(detect_encoding(&body, None), SHIFT_JIS);
    }

    #[test]
    fn test_header_wins_over_meta() {
        let body = r#"<meta charset="shift_jis"><p>抽選</p>"#.as_bytes();
        assert_eq!(detect_encoding(body, Some("text/html; charset=utf-8")), UTF_8);
        assert_eq!(decode_body(body, Some("text/html; charset=utf-8")), String::from_utf8_lossy(body));
    }

    #[test]
    fn test_defaults_to_utf8() {
        let body = "<p>抽選</p>".as_bytes();
        assert_eq!(detect_encoding(body, None), UTF_8);
        assert_eq!(decode_body(body, None), "<p>抽選</p>");
    }

    #[test]
    fn test_unknown_label_falls_through() {
        let body = "<p>抽選</p>".as_bytes();
        assert_eq!(detect_encoding(body, Some("text/html; charset=bogus")), UTF_8);
    }
}
