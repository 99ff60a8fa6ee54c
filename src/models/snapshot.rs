//! Persisted scan snapshot and the per-scan change report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Item;
use crate::services::fingerprint;

/// The persisted record of one completed scan.
///
/// Always replaced wholesale in the store, never patched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// SHA-256 digest over the ordered items
    pub fingerprint: String,

    /// Number of items (informational)
    #[serde(default)]
    pub item_count: usize,

    /// Items in extraction order
    #[serde(default)]
    pub items: Vec<Item>,

    /// Page the items were extracted from
    pub source_url: String,

    /// When the scan completed
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot from freshly extracted items, computing the fingerprint.
    pub fn new(items: Vec<Item>, source_url: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint(&items),
            item_count: items.len(),
            items,
            source_url: source_url.into(),
            captured_at: Utc::now(),
        }
    }
}

/// Outcome of comparing a fresh snapshot against the stored one.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChangeReport {
    pub changed: bool,
    pub first_run: bool,
    pub new_items: Vec<Item>,
    pub previous_fingerprint: Option<String>,
    pub current_fingerprint: String,
}

impl ChangeReport {
    /// Whether the report carries anything worth showing to a user.
    ///
    /// "Changed but no new items" (reordering, url-only edits) is silent.
    pub fn has_new_items(&self) -> bool {
        self.changed && !self.new_items.is_empty()
    }
}
