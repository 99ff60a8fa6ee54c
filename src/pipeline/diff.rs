//! Change detection between scans.
//!
//! Compares a fresh snapshot against the one stored in a slot. The
//! fingerprint is the cheap equality check; when it differs, new items are
//! found by signature set-difference, so items that only moved are not new.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::{ChangeReport, Item, Snapshot};
use crate::storage::SnapshotStore;

/// Items of `current` whose signature does not appear in `previous`.
///
/// Keeps the order of `current`.
pub fn new_items(current: &[Item], previous: &[Item]) -> Vec<Item> {
    let known: HashSet<String> = previous.iter().map(Item::signature).collect();
    current
        .iter()
        .filter(|item| !known.contains(&item.signature()))
        .cloned()
        .collect()
}

/// Compare `current` against the snapshot in `slot` and persist on change.
///
/// A store read failure other than "not found" is returned as-is and nothing
/// is written. The previous snapshot stays authoritative when unchanged.
pub async fn detect(
    current: Snapshot,
    store: &dyn SnapshotStore,
    slot: &str,
) -> Result<ChangeReport> {
    let previous = store.get(slot).await?;

    let Some(previous) = previous else {
        log::info!("First run: no previous snapshot in '{}'", slot);
        store.put(slot, &current).await?;
        return Ok(ChangeReport {
            changed: true,
            first_run: true,
            new_items: current.items,
            previous_fingerprint: None,
            current_fingerprint: current.fingerprint,
        });
    };

    if previous.fingerprint == current.fingerprint {
        log::info!("No changes detected");
        return Ok(ChangeReport {
            changed: false,
            first_run: false,
            new_items: Vec::new(),
            previous_fingerprint: Some(previous.fingerprint),
            current_fingerprint: current.fingerprint,
        });
    }

    let fresh = new_items(&current.items, &previous.items);
    if fresh.is_empty() {
        log::info!("Page changed but every item was already known");
    } else {
        log::info!("Changes detected: {} new item(s)", fresh.len());
    }

    store.put(slot, &current).await?;
    Ok(ChangeReport {
        changed: true,
        first_run: false,
        new_items: fresh,
        previous_fingerprint: Some(previous.fingerprint),
        current_fingerprint: current.fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::storage::{LocalStore, MemoryStore};
    use tempfile::TempDir;

    const SLOT: &str = "state.json";
    const PAGE: &str = "https://store-jp.nintendo.com/";

    fn item(title: &str, content: &str) -> Item {
        Item::heading("h2", title, content, PAGE)
    }

    fn snapshot(items: Vec<Item>) -> Snapshot {
        Snapshot::new(items, PAGE)
    }

    #[tokio::test]
    async fn test_first_run() {
        let store = MemoryStore::new();
        let current = snapshot(vec![item("A", "x"), item("B", "y")]);

        let report = detect(current.clone(), &store, SLOT).await.unwrap();
        assert!(report.first_run);
        assert!(report.changed);
        assert_eq!(report.new_items, current.items);
        assert!(report.previous_fingerprint.is_none());
        assert_eq!(store.get(SLOT).await.unwrap(), Some(current));
    }

    #[tokio::test]
    async fn test_first_run_with_no_items() {
        let store = MemoryStore::new();
        let report = detect(snapshot(Vec::new()), &store, SLOT).await.unwrap();
        assert!(report.first_run && report.changed);
        assert!(report.new_items.is_empty());
        assert!(store.get(SLOT).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_no_op_second_run() {
        let store = MemoryStore::new();
        let first = snapshot(vec![item("A", "x")]);
        detect(first.clone(), &store, SLOT).await.unwrap();

        let report = detect(snapshot(vec![item("A", "x")]), &store, SLOT)
            .await
            .unwrap();
        assert!(!report.changed);
        assert!(!report.first_run);
        assert!(report.new_items.is_empty());

        // Unchanged scans do not rewrite the stored snapshot
        let stored = store.get(SLOT).await.unwrap().unwrap();
        assert_eq!(stored.fingerprint, first.fingerprint);
        assert_eq!(stored.captured_at, first.captured_at);
    }

    #[tokio::test]
    async fn test_new_item_detection() {
        let store = MemoryStore::seeded(SLOT, Some(snapshot(vec![item("A", "x")])));
        let current = snapshot(vec![item("A", "x"), item("B", "y")]);

        let report = detect(current.clone(), &store, SLOT).await.unwrap();
        assert!(report.changed);
        assert!(!report.first_run);
        assert_eq!(report.new_items, vec![item("B", "y")]);
        assert_eq!(
            store.get(SLOT).await.unwrap().unwrap().fingerprint,
            current.fingerprint
        );
    }

    #[tokio::test]
    async fn test_reorder_is_silent_change() {
        let store = MemoryStore::seeded(SLOT, Some(snapshot(vec![item("A", "x"), item("B", "y")])));
        let current = snapshot(vec![item("B", "y"), item("A", "x")]);

        let report = detect(current.clone(), &store, SLOT).await.unwrap();
        assert!(report.changed);
        assert!(report.new_items.is_empty());
        assert!(!report.has_new_items());
        assert_eq!(
            store.get(SLOT).await.unwrap().unwrap().fingerprint,
            current.fingerprint
        );
    }

    #[tokio::test]
    async fn test_url_only_change_has_no_new_items() {
        let mut moved = item("A", "x");
        moved.url = "https://store-jp.nintendo.com/switch2".into();
        let store = MemoryStore::seeded(SLOT, Some(snapshot(vec![item("A", "x")])));

        let report = detect(snapshot(vec![moved]), &store, SLOT).await.unwrap();
        assert!(report.changed);
        assert!(report.new_items.is_empty());
    }

    #[tokio::test]
    async fn test_signature_is_case_sensitive() {
        let store = MemoryStore::seeded(SLOT, Some(snapshot(vec![item("switch2", "x")])));
        let report = detect(snapshot(vec![item("Switch2", "x")]), &store, SLOT)
            .await
            .unwrap();
        assert_eq!(report.new_items.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_store_is_not_first_run() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        tokio::fs::write(store.path(SLOT), b"not json at all").await.unwrap();

        let err = detect(snapshot(vec![item("A", "x")]), &store, SLOT)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store { .. }));

        // Nothing was written over the broken document
        let raw = tokio::fs::read(store.path(SLOT)).await.unwrap();
        assert_eq!(raw, b"not json at all");
    }

    #[test]
    fn test_new_items_keeps_current_order() {
        let previous = vec![item("A", "x")];
        let current = vec![item("C", "z"), item("A", "x"), item("B", "y")];
        let fresh = new_items(&current, &previous);
        assert_eq!(fresh, vec![item("C", "z"), item("B", "y")]);
    }
}
