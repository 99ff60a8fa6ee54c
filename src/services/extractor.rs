// src/services/extractor.rs

//! Content extraction service.
//!
//! Walks a [`DomNode`] tree with four ordered passes and turns keyword
//! matches into [`Item`]s:
//!
//! 1. Headings (`h1`..`h6`, by level, then document order) with sibling context
//! 2. Anchors whose text or href mentions a keyword
//! 3. Notice-like regions selected by class name
//! 4. `p`/`div` blocks of moderate length
//!
//! Each pass deduplicates against its own digest set only, so the same text
//! may surface once per pass.

use std::collections::HashSet;

use url::Url;

use crate::error::Result;
use crate::models::{Item, MatchMode};
use crate::services::document::{DomNode, PageDocument};
use crate::services::matcher::KeywordMatcher;
use crate::utils::{resolve_url, sha256_hex};

/// Class-name substrings that mark banner-like regions, in pass order.
pub const BANNER_CLASSES: [&str; 5] = ["banner", "notification", "alert", "announcement", "notice"];

/// Separator between heading context segments.
pub const CONTEXT_SEPARATOR: &str = " | ";

/// Maximum number of context segments (heading text included).
const MAX_CONTEXT_SEGMENTS: usize = 3;

/// Sibling text must be longer than this to count as context.
const MIN_CONTEXT_CHARS: usize = 5;

/// Accepted paragraph length range, in characters.
const PARAGRAPH_MIN_CHARS: usize = 10;
const PARAGRAPH_MAX_CHARS: usize = 500;

/// Digest set scoped to a single pass.
#[derive(Default)]
struct SeenSet(HashSet<String>);

impl SeenSet {
    /// Record `key`; false if it was already seen in this pass.
    fn insert(&mut self, key: &str) -> bool {
        self.0.insert(sha256_hex(key))
    }
}

/// Extracts keyword-relevant items from a page.
pub struct ContentExtractor {
    matcher: KeywordMatcher,
    base: Url,
    /// Configured page URL as given, used for items without a link
    page_url: String,
}

impl ContentExtractor {
    /// Create an extractor for the page at `page_url`.
    pub fn new<S: AsRef<str>>(keywords: &[S], mode: MatchMode, page_url: &str) -> Result<Self> {
        Ok(Self {
            matcher: KeywordMatcher::new(keywords, mode),
            base: Url::parse(page_url)?,
            page_url: page_url.to_string(),
        })
    }

    /// Run all four passes over the tree rooted at `root`.
    pub fn extract<N: DomNode>(&self, root: N) -> Vec<Item> {
        let mut elements = Vec::with_capacity(256);
        elements.push(root);
        elements.extend(root.descendants());

        let mut items = self.heading_pass(&elements);
        items.extend(self.link_pass(&elements));
        items.extend(self.banner_pass(&elements));
        items.extend(self.paragraph_pass(&elements));

        log::info!("Extracted {} relevant items", items.len());
        items
    }

    /// Parse a raw body and extract from it.
    ///
    /// A body that cannot be traversed aborts with a parse error; no partial
    /// list is ever returned.
    pub fn extract_html(&self, body: &str) -> Result<Vec<Item>> {
        let document = PageDocument::parse(body)?;
        Ok(self.extract(document.root()))
    }

    fn heading_pass<N: DomNode>(&self, elements: &[N]) -> Vec<Item> {
        let mut seen = SeenSet::default();
        let mut items = Vec::new();

        for level in 1..=6 {
            let tag = format!("h{level}");
            for heading in elements.iter().filter(|n| n.tag_name() == tag) {
                let text = heading.text();
                if text.is_empty() || !self.matcher.matches(&text) {
                    continue;
                }
                if !seen.insert(&text) {
                    continue;
                }

                let content = heading_context(heading, &text);
                let url = self.link_url(heading);
                log::debug!("Heading matched: {}", preview(&text));
                items.push(Item::heading(tag.as_str(), text, content, url));
            }
        }
        items
    }

    fn link_pass<N: DomNode>(&self, elements: &[N]) -> Vec<Item> {
        let mut seen = SeenSet::default();
        let mut items = Vec::new();

        for anchor in elements.iter().filter(|n| n.tag_name() == "a") {
            let Some(href) = anchor.attr("href").filter(|h| !h.trim().is_empty()) else {
                continue;
            };
            let text = anchor.text();
            if text.is_empty() {
                continue;
            }
            // Product slugs often only show up in the URL
            if !self.matcher.matches(&text) && !self.matcher.contains_any(href) {
                continue;
            }
            if !seen.insert(&format!("{text}{href}")) {
                continue;
            }

            log::debug!("Link matched: {}", preview(&text));
            items.push(Item::link(text, resolve_url(&self.base, href)));
        }
        items
    }

    fn banner_pass<N: DomNode>(&self, elements: &[N]) -> Vec<Item> {
        let mut seen = SeenSet::default();
        let mut items = Vec::new();

        for class_name in BANNER_CLASSES {
            let regions = elements.iter().filter(|n| {
                n.attr("class")
                    .is_some_and(|c| c.to_lowercase().contains(class_name))
            });

            for region in regions {
                let text = region.text();
                if text.is_empty() || !self.matcher.matches(&text) {
                    continue;
                }
                if !seen.insert(&text) {
                    continue;
                }

                let url = region
                    .find_descendant("a")
                    .and_then(|a| self.resolve_href(&a))
                    .unwrap_or_else(|| self.page_url.clone());
                log::debug!("Banner matched: {}", preview(&text));
                items.push(Item::banner(&text, url));
            }
        }
        items
    }

    fn paragraph_pass<N: DomNode>(&self, elements: &[N]) -> Vec<Item> {
        let mut seen = SeenSet::default();
        let mut items = Vec::new();

        for block in elements
            .iter()
            .filter(|n| matches!(n.tag_name(), "p" | "div"))
        {
            let text = block.text();
            let len = text.chars().count();
            if !(PARAGRAPH_MIN_CHARS..PARAGRAPH_MAX_CHARS).contains(&len) {
                continue;
            }
            if !self.matcher.matches(&text) || !seen.insert(&text) {
                continue;
            }

            let url = self.link_url(block);
            log::debug!("Paragraph matched: {}", preview(&text));
            items.push(Item::paragraph(&text, url));
        }
        items
    }

    /// Own (descendant) anchor first, then the nearest enclosing one.
    fn link_url<N: DomNode>(&self, node: &N) -> String {
        node.find_descendant("a")
            .or_else(|| node.find_ancestor("a"))
            .and_then(|a| self.resolve_href(&a))
            .unwrap_or_else(|| self.page_url.clone())
    }

    fn resolve_href<N: DomNode>(&self, anchor: &N) -> Option<String> {
        anchor
            .attr("href")
            .filter(|h| !h.trim().is_empty())
            .map(|h| resolve_url(&self.base, h))
    }
}

/// Heading text plus up to two following siblings with meaningful text.
fn heading_context<N: DomNode>(heading: &N, text: &str) -> String {
    let mut parts = vec![text.to_string()];
    let mut sibling = heading.next_sibling();
    let mut taken = 0;

    while let Some(node) = sibling {
        if taken >= MAX_CONTEXT_SEGMENTS {
            break;
        }
        let sibling_text = node.text();
        if sibling_text.chars().count() > MIN_CONTEXT_CHARS {
            parts.push(sibling_text);
            taken += 1;
        }
        sibling = node.next_sibling();
    }

    parts.truncate(MAX_CONTEXT_SEGMENTS);
    parts.join(CONTEXT_SEPARATOR)
}

fn preview(text: &str) -> &str {
    crate::utils::truncate_chars(text, 50)
}

/// Convenience function: parse `body` and extract items for `page_url`.
pub fn extract<S: AsRef<str>>(
    body: &str,
    keywords: &[S],
    mode: MatchMode,
    page_url: &str,
) -> Result<Vec<Item>> {
    ContentExtractor::new(keywords, mode, page_url)?.extract_html(body)
}
