pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod images;
pub mod local_entity;
pub mod records;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::images::{EvictionHandle, LocalBlobStore, S3ObjectStore, spawn_eviction_task};
use crate::records::{SnapshotStore, SqlRecordBackend};

pub use error::{Result, StoreError};
pub use images::ImageStore;
pub use records::{Loaded, RecordStore, Source};

/// Both coordinators plus the background eviction task, wired from config.
///
/// Acquire once at start-up, hand the stores to callers, and call
/// [`Stores::shutdown`] before exit.
pub struct Stores {
    pub records: RecordStore,
    pub images: ImageStore,
    eviction: Option<EvictionHandle>,
}

impl Stores {
    /// Open every tier. No tier can block another: an unreachable remote
    /// database or an unusable image store starts on a lazy connection, and
    /// its operations fail until it can be reached.
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let remote_db = match database::init_db(&config.database.url).await {
            Ok(db) => db,
            Err(e) => {
                warn!(error = %e, "Remote record store unavailable at start-up, connecting lazily");
                database::connect_lazy(&config.database.url).await?
            }
        };

        let records = RecordStore::new(
            Arc::new(SqlRecordBackend::new(remote_db)),
            SnapshotStore::new(&config.local.data_dir, &config.local.snapshot_key),
            config.cache.freshness(),
        );

        let images = ImageStore::new(
            Arc::new(S3ObjectStore::new(&config.object_storage)?),
            LocalBlobStore::new(open_local_db(config).await?),
        );

        info!(
            bucket = %config.object_storage.bucket,
            data_dir = %config.local.data_dir.display(),
            "Stores ready"
        );

        Ok(Self {
            records,
            images,
            eviction: None,
        })
    }

    /// Start periodic eviction of old local images.
    pub fn start_eviction(&mut self, config: &AppConfig) {
        if self.eviction.is_none() {
            self.eviction = Some(spawn_eviction_task(
                self.images.local().clone(),
                config.eviction.retention(),
                config.eviction.interval(),
            ));
        }
    }

    /// Stop the eviction task and close the embedded image store.
    pub async fn shutdown(self) -> Result<()> {
        if let Some(eviction) = self.eviction {
            eviction.stop().await;
        }
        self.images.local().clone().close().await
    }
}

async fn open_local_db(config: &AppConfig) -> Result<DatabaseConnection> {
    let url = &config.local.blob_db_url;
    for dir in [Some(config.local.data_dir.clone()), database::sqlite_parent_dir(url)]
        .into_iter()
        .flatten()
    {
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(dir = %dir.display(), error = %e, "Failed to create local data directory");
        }
    }

    match database::init_local_db(url).await {
        Ok(db) => Ok(db),
        Err(e) => {
            warn!(error = %e, "Local image store unavailable at start-up, connecting lazily");
            Ok(database::connect_lazy(url).await?)
        }
    }
}
