//! Snapshot persistence.
//!
//! A store holds at most one [`Snapshot`] per slot. Slots are opaque keys:
//! a file path for [`LocalStore`], an object key for `S3Store`.
//!
//! "Not found" is reported as `Ok(None)`. Any other failure to load,
//! including a stored document that does not decode, is an
//! [`AppError::Store`](crate::error::AppError::Store) so it can never be
//! mistaken for a first run.
//!
//! Stores do not lock. Callers that may run concurrently against the same
//! slot must serialize their `put`s.

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Config, Snapshot, StorageBackend};

pub use local::LocalStore;
#[cfg(feature = "s3")]
pub use s3::S3Store;

/// Keyed persistence for the last snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot in `slot`, `None` if nothing was ever stored.
    async fn get(&self, slot: &str) -> Result<Option<Snapshot>>;

    /// Replace the snapshot in `slot`.
    async fn put(&self, slot: &str, snapshot: &Snapshot) -> Result<()>;

    /// Remove the snapshot in `slot`. Removing an empty slot succeeds.
    async fn delete(&self, slot: &str) -> Result<()>;
}

/// Decode a stored document, tagging failures with the slot.
pub(crate) fn decode(slot: &str, bytes: &[u8]) -> Result<Snapshot> {
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::store(slot, format!("malformed snapshot: {e}")))
}

/// Encode a snapshot the way every backend stores it.
pub(crate) fn encode(slot: &str, snapshot: &Snapshot) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(snapshot)
        .map_err(|e| AppError::store(slot, format!("cannot encode snapshot: {e}")))
}

/// In-process store, used by tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a single slot.
    pub fn seeded(slot: &str, snapshot: Option<Snapshot>) -> Self {
        let mut slots = HashMap::new();
        if let Some(snapshot) = snapshot {
            slots.insert(slot.to_string(), snapshot);
        }
        Self {
            slots: Mutex::new(slots),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get(&self, slot: &str) -> Result<Option<Snapshot>> {
        Ok(self.slots.lock().await.get(slot).cloned())
    }

    async fn put(&self, slot: &str, snapshot: &Snapshot) -> Result<()> {
        self.slots
            .lock()
            .await
            .insert(slot.to_string(), snapshot.clone());
        Ok(())
    }

    async fn delete(&self, slot: &str) -> Result<()> {
        self.slots.lock().await.remove(slot);
        Ok(())
    }
}

/// Build the store selected by configuration.
///
/// The local backend is rooted at the working directory, so a relative or
/// absolute `storage.state_file` works unchanged as the slot.
pub async fn build_store(config: &Config) -> Result<Box<dyn SnapshotStore>> {
    match config.storage.backend {
        StorageBackend::Local => {
            log::debug!("Using local snapshot store at {}", config.storage.state_file);
            Ok(Box::new(LocalStore::new(".")))
        }
        #[cfg(feature = "s3")]
        StorageBackend::S3 => {
            let store = S3Store::from_config(&config.storage).await?;
            log::debug!("Using S3 snapshot store in bucket {}", config.storage.s3_bucket);
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "s3"))]
        StorageBackend::S3 => Err(AppError::config(
            "storage.backend = \"s3\" requires the `s3` feature",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![Item::link("Switch2", "https://example.com/switch2")],
            "https://example.com/",
        )
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("slot").await.unwrap().is_none());

        let stored = snapshot();
        store.put("slot", &stored).await.unwrap();
        assert_eq!(store.get("slot").await.unwrap(), Some(stored));

        store.delete("slot").await.unwrap();
        store.delete("slot").await.unwrap();
        assert!(store.get("slot").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_seeded() {
        let store = MemoryStore::seeded("slot", Some(snapshot()));
        assert!(store.get("slot").await.unwrap().is_some());
        assert!(store.get("other").await.unwrap().is_none());
    }

    #[test]
    fn test_decode_malformed_is_store_error() {
        let err = decode("state.json", b"{not json").unwrap_err();
        assert!(matches!(err, AppError::Store { ref slot, .. } if slot == "state.json"));
    }

    #[tokio::test]
    async fn test_build_store_local() {
        let mut config = Config::default();
        config.storage.state_file = "state/switch2_state.json".into();
        assert!(build_store(&config).await.is_ok());
        assert_eq!(config.slot(), "state/switch2_state.json");
    }
}
