//! Item list fingerprinting.
//!
//! The digest covers every field of every item in order, so reordering the
//! list changes the fingerprint even when the item set is identical.

use crate::models::Item;
use crate::utils::sha256_hex;

/// Canonical serialization of an item list.
///
/// One record per item, fields in the order `kind, tag, title, content, url`,
/// each written as `<byte length>:<value>` and separated by `|`. Records are
/// terminated by a newline. Length prefixes keep values containing the
/// separators unambiguous.
pub fn canonical_form(items: &[Item]) -> String {
    let mut out = String::new();
    for item in items {
        let fields = [
            item.kind.as_str(),
            item.tag.as_str(),
            item.title.as_str(),
            item.content.as_str(),
            item.url.as_str(),
        ];
        let record: Vec<String> = fields
            .iter()
            .map(|value| format!("{}:{}", value.len(), value))
            .collect();
        out.push_str(&record.join("|"));
        out.push('\n');
    }
    out
}

/// Lowercase hex SHA-256 of the canonical form.
pub fn fingerprint(items: &[Item]) -> String {
    sha256_hex(canonical_form(items))
}
