// src/services/document.rs

//! Navigable document model.
//!
//! Extraction only needs a handful of capabilities from a parsed page:
//! tag name, attributes, text, children, parent and next sibling. They are
//! captured by [`DomNode`] so the extraction passes never name a concrete
//! parser type. [`PageDocument`] provides the `scraper` backed implementation.

use scraper::{ElementRef, Html};

use crate::error::{AppError, Result};

/// Element-level view of a parsed document tree.
pub trait DomNode: Copy {
    /// Lowercase tag name.
    fn tag_name(&self) -> &str;

    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<&str>;

    /// Every descendant text fragment, trimmed, concatenated without separator.
    fn text(&self) -> String;

    /// Element children in document order.
    fn children(&self) -> Vec<Self>;

    /// Parent element, `None` at the root.
    fn parent(&self) -> Option<Self>;

    /// Next element sibling (text nodes skipped).
    fn next_sibling(&self) -> Option<Self>;

    /// All descendant elements in document (pre-)order, excluding `self`.
    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().into_iter().rev());
        }
        out
    }

    /// First descendant element with the given tag.
    fn find_descendant(&self, tag: &str) -> Option<Self> {
        self.descendants().into_iter().find(|n| n.tag_name() == tag)
    }

    /// Nearest ancestor element with the given tag.
    fn find_ancestor(&self, tag: &str) -> Option<Self> {
        let mut current = self.parent();
        while let Some(node) = current {
            if node.tag_name() == tag {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }
}

impl<'a> DomNode for ElementRef<'a> {
    fn tag_name(&self) -> &str {
        self.value().name()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn text(&self) -> String {
        ElementRef::text(self)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn children(&self) -> Vec<Self> {
        (**self).children().filter_map(ElementRef::wrap).collect()
    }

    fn parent(&self) -> Option<Self> {
        (**self).parent().and_then(ElementRef::wrap)
    }

    fn next_sibling(&self) -> Option<Self> {
        (**self).next_siblings().find_map(ElementRef::wrap)
    }
}

/// A parsed HTML page.
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    /// Parse a response body.
    ///
    /// The HTML parser itself never fails, so a body is rejected here when
    /// there is nothing to traverse: blank, or no markup at all.
    pub fn parse(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Err(AppError::parse("document body is empty"));
        }
        if !body.contains('<') {
            return Err(AppError::parse("document body contains no markup"));
        }

        let html = Html::parse_document(body);
        if !html.errors.is_empty() {
            log::debug!("HTML parser reported {} recoverable errors", html.errors.len());
        }
        Ok(Self { html })
    }

    /// Root element (`<html>`).
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}
