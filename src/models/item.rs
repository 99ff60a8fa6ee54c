//! Extracted item data structure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::truncate_chars;

/// Maximum title length for banner and paragraph items.
pub const MAX_TITLE_CHARS: usize = 100;

/// Which extraction pass produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Heading,
    Link,
    Banner,
    Paragraph,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Heading => "heading",
            ItemKind::Link => "link",
            ItemKind::Banner => "banner",
            ItemKind::Paragraph => "paragraph",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fragment of the watched page that matched the keyword policy.
///
/// Field order is significant: it defines the canonical form hashed by
/// the fingerprinter (`kind, tag, title, content, url`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Extraction pass that produced the item
    pub kind: ItemKind,

    /// Originating tag name (headings only, empty otherwise)
    #[serde(default)]
    pub tag: String,

    /// Short human-readable label
    pub title: String,

    /// Fuller text, possibly with joined context
    pub content: String,

    /// Absolute URL associated with the fragment
    pub url: String,
}

impl Item {
    /// Heading item with its sibling context as content.
    pub fn heading(
        tag: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            kind: ItemKind::Heading,
            tag: tag.into(),
            title: title.into(),
            content: content.into(),
            url: url.into(),
        }
    }

    /// Link item; content repeats the anchor text.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        let title = text.into();
        Self {
            kind: ItemKind::Link,
            tag: String::new(),
            content: title.clone(),
            title,
            url: url.into(),
        }
    }

    /// Banner item; title is truncated, content keeps the full text.
    pub fn banner(text: &str, url: impl Into<String>) -> Self {
        Self::block(ItemKind::Banner, text, url.into())
    }

    /// Paragraph item; title is truncated, content keeps the full text.
    pub fn paragraph(text: &str, url: impl Into<String>) -> Self {
        Self::block(ItemKind::Paragraph, text, url.into())
    }

    fn block(kind: ItemKind, text: &str, url: String) -> Self {
        Self {
            kind,
            tag: String::new(),
            title: truncate_chars(text, MAX_TITLE_CHARS).to_string(),
            content: text.to_string(),
            url,
        }
    }

    /// Identity used to decide whether an item existed in a previous snapshot.
    ///
    /// Exact `title:content`, case-sensitive. Kind, tag and url are ignored.
    pub fn signature(&self) -> String {
        format!("{}:{}", self.title, self.content)
    }
}
