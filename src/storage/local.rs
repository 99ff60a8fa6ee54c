//! Local filesystem snapshot store.
//!
//! One pretty-printed JSON document per slot, at `{root}/{slot}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::{SnapshotStore, decode, encode};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a slot.
    pub fn path(&self, slot: &str) -> PathBuf {
        self.root_dir.join(slot)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = temp_path(path);
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

/// Sibling temp file for `path`: the full file name plus `.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[async_trait]
impl SnapshotStore for LocalStore {
    async fn get(&self, slot: &str) -> Result<Option<Snapshot>> {
        let path = self.path(slot);
        let bytes = self
            .read_bytes(&path)
            .await
            .map_err(|e| AppError::store(slot, e))?;

        match bytes {
            Some(bytes) => {
                let snapshot = decode(slot, &bytes)?;
                log::debug!(
                    "Loaded snapshot with {} items from {}",
                    snapshot.item_count,
                    path.display()
                );
                Ok(Some(snapshot))
            }
            None => {
                log::info!("No snapshot at {}", path.display());
                Ok(None)
            }
        }
    }

    async fn put(&self, slot: &str, snapshot: &Snapshot) -> Result<()> {
        let path = self.path(slot);
        let bytes = encode(slot, snapshot)?;
        self.write_bytes(&path, &bytes)
            .await
            .map_err(|e| AppError::store(slot, e))?;
        log::info!(
            "Saved snapshot ({} items) to {}",
            snapshot.item_count,
            path.display()
        );
        Ok(())
    }

    async fn delete(&self, slot: &str) -> Result<()> {
        let path = self.path(slot);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("Deleted snapshot at {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::store(slot, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use tempfile::TempDir;

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![
                Item::heading("h2", "招待販売について", "招待販売について", "https://example.com/"),
                Item::link("Switch2", "https://example.com/switch2"),
            ],
            "https://example.com/",
        )
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let stored = snapshot();
        store.put("state.json", &stored).await.unwrap();
        let loaded = store.get("state.json").await.unwrap();
        assert_eq!(loaded, Some(stored));
        assert!(!store.path("state.json.tmp").exists());
    }

    #[test]
    fn test_temp_path_keeps_full_name() {
        assert_eq!(temp_path(Path::new("a/state.json")), Path::new("a/state.json.tmp"));
        assert_ne!(temp_path(Path::new("state.json")), temp_path(Path::new("state.yaml")));
        assert_eq!(temp_path(Path::new("state")), Path::new("state.tmp"));
    }

    #[tokio::test]
    async fn test_slots_sharing_a_stem_stay_separate() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        let json = snapshot();
        let other = Snapshot::new(Vec::new(), "https://example.com/other");

        store.put("state.tmp", &other).await.unwrap();
        store.put("state.json", &json).await.unwrap();
        store.put("state.yaml", &other).await.unwrap();

        assert_eq!(store.get("state.tmp").await.unwrap(), Some(other.clone()));
        assert_eq!(store.get("state.json").await.unwrap(), Some(json));
        assert_eq!(store.get("state.yaml").await.unwrap(), Some(other));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        assert!(store.get("nope.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_document_is_store_error() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        tokio::fs::write(store.path("state.json"), b"{\"fingerprint\": ")
            .await
            .unwrap();

        let err = store.get("state.json").await.unwrap_err();
        assert!(matches!(err, AppError::Store { .. }));
    }

    #[tokio::test]
    async fn test_put_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        store.put("nested/dir/state.json", &snapshot()).await.unwrap();
        assert!(store.path("nested/dir/state.json").exists());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        store.put("state.json", &snapshot()).await.unwrap();

        store.delete("state.json").await.unwrap();
        store.delete("state.json").await.unwrap();
        assert!(store.get("state.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_legacy_document_without_items_loads() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        let legacy = r#"{
            "fingerprint": "abc",
            "source_url": "https://example.com/",
            "captured_at": "2025-11-01T00:00:00Z"
        }"#;
        tokio::fs::write(store.path("state.json"), legacy).await.unwrap();

        let loaded = store.get("state.json").await.unwrap().unwrap();
        assert!(loaded.items.is_empty());
        assert_eq!(loaded.fingerprint, "abc");
    }
}
