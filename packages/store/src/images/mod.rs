//! Images: remote bucket first, embedded local store when uploads fail.

pub mod eviction;
pub mod local;
pub mod remote;

use std::sync::Arc;

use chrono::Utc;
use common::BlobId;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{debug, warn};

use crate::error::Result;

pub use eviction::{EvictionHandle, spawn_eviction_task, sweep};
pub use local::LocalBlobStore;
pub use remote::{ObjectStore, S3ObjectStore};

/// Content type of every uploaded image; clients compress to JPEG.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Save and resolve images by [`BlobId`].
///
/// The identifier returned by [`ImageStore::save_image`] records which backend took
/// the bytes, so reads never need to know which path a save took.
pub struct ImageStore {
    remote: Arc<dyn ObjectStore>,
    local: LocalBlobStore,
}

impl ImageStore {
    pub fn new(remote: Arc<dyn ObjectStore>, local: LocalBlobStore) -> Self {
        Self { remote, local }
    }

    pub fn local(&self) -> &LocalBlobStore {
        &self.local
    }

    /// Upload to the bucket, or keep the bytes locally if that fails.
    ///
    /// Only a failure of the local store is reported.
    pub async fn save_image(&self, data: &[u8]) -> Result<BlobId> {
        let name = object_name(Utc::now().timestamp_millis());
        match self.remote.upload(&name, data, IMAGE_CONTENT_TYPE).await {
            Ok(url) => return Ok(BlobId::Remote(url)),
            Err(e) => warn!(error = %e, "Image upload failed, saving to local store"),
        }

        let key = self.local.insert(data).await?;
        debug!(key, size = data.len(), "Saved image locally");
        Ok(BlobId::Local(key))
    }

    /// Resolve an identifier to its bytes.
    ///
    /// `None` for an absent identifier or a local key with no entry. Remote
    /// fetch failures (including non-success statuses) and local I/O errors
    /// are returned as errors.
    pub async fn get_image(&self, id: Option<&BlobId>) -> Result<Option<Vec<u8>>> {
        let Some(id) = id else {
            return Ok(None);
        };

        match id {
            BlobId::Remote(url) => self.remote.fetch(url).await.map(Some),
            BlobId::Local(key) | BlobId::Legacy(key) => self.local.get(*key).await,
        }
    }
}

/// `<epoch ms>-<random>.jpg`, unique enough for concurrent uploads.
fn object_name(now_ms: i64) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{now_ms}-{suffix}.jpg")
}
