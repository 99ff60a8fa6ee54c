//! AWS S3 snapshot store.
//!
//! One JSON object per slot at `s3://{bucket}/{prefix}/{slot}`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::{Snapshot, StorageConfig};
use crate::storage::{SnapshotStore, decode, encode};

/// S3-based snapshot storage.
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    /// Create a new S3 store instance.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Create an S3 store using the default AWS credential chain.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        if config.s3_bucket.trim().is_empty() {
            return Err(AppError::config("storage.s3_bucket is empty"));
        }
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Ok(Self::new(
            Client::new(&aws),
            &config.s3_bucket,
            &config.s3_prefix,
        ))
    }

    /// Object key for a slot.
    fn key(&self, slot: &str) -> String {
        object_key(&self.prefix, slot)
    }
}

fn object_key(prefix: &str, slot: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        slot.to_string()
    } else {
        format!("{}/{}", prefix, slot)
    }
}

#[async_trait]
impl SnapshotStore for S3Store {
    async fn get(&self, slot: &str) -> Result<Option<Snapshot>> {
        let key = self.key(slot);
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::store(slot, e))?;
                let snapshot = decode(slot, &bytes.into_bytes())?;
                log::debug!("Loaded snapshot from s3://{}/{}", self.bucket, key);
                Ok(Some(snapshot))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No snapshot at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::store(slot, service_err))
                }
            }
        }
    }

    async fn put(&self, slot: &str, snapshot: &Snapshot) -> Result<()> {
        let key = self.key(slot);
        let bytes = ByteStream::from(encode(slot, snapshot)?);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(bytes)
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::store(slot, e.into_service_error()))?;

        log::info!(
            "Saved snapshot ({} items) to s3://{}/{}",
            snapshot.item_count,
            self.bucket,
            key
        );
        Ok(())
    }

    async fn delete(&self, slot: &str) -> Result<()> {
        let key = self.key(slot);
        // DeleteObject succeeds for absent keys
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| AppError::store(slot, e.into_service_error()))?;

        log::info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("", "state.json"), "state.json");
        assert_eq!(object_key("watch/", "state.json"), "watch/state.json");
        assert_eq!(object_key("/a/b", "state.json"), "a/b/state.json");
    }
}
