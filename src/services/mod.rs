//! Service layer for the watcher.
//!
//! - Document model over parsed HTML (`DomNode`, `PageDocument`)
//! - Keyword matching (`KeywordMatcher`)
//! - Four-pass content extraction (`ContentExtractor`)
//! - Item list fingerprinting (`fingerprint`)

mod document;
mod extractor;
mod fingerprinter;
mod matcher;

pub use document::{DomNode, PageDocument};
pub use extractor::{BANNER_CLASSES, CONTEXT_SEPARATOR, ContentExtractor, extract};
pub use fingerprinter::{canonical_form, fingerprint};
pub use matcher::{KeywordMatcher, matches};
