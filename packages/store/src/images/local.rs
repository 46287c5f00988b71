use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::error::Result;
use crate::local_entity::local_image;

/// Embedded key/value store for images that could not be uploaded.
///
/// Keys are assigned by the store. Entries carry their insertion time so
/// old ones can be swept.
#[derive(Clone)]
pub struct LocalBlobStore {
    db: DatabaseConnection,
}

impl LocalBlobStore {
    /// Wrap a connection opened with [`crate::database::init_local_db`].
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, data: &[u8]) -> Result<i64> {
        self.insert_at(data, Utc::now().timestamp_millis()).await
    }

    /// Insert with an explicit timestamp (epoch milliseconds).
    pub async fn insert_at(&self, data: &[u8], timestamp: i64) -> Result<i64> {
        let model = local_image::ActiveModel {
            image: Set(data.to_vec()),
            timestamp: Set(timestamp),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?.id)
    }

    /// `None` when no entry has this key.
    pub async fn get(&self, key: i64) -> Result<Option<Vec<u8>>> {
        let entry = local_image::Entity::find_by_id(key).one(&self.db).await?;
        Ok(entry.map(|m| m.image))
    }

    /// Delete entries stamped at or before `cutoff` (epoch milliseconds).
    pub async fn evict_older_than(&self, cutoff: i64) -> Result<u64> {
        let result = local_image::Entity::delete_many()
            .filter(local_image::Column::Timestamp.lte(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn len(&self) -> Result<u64> {
        Ok(local_image::Entity::find().count(&self.db).await?)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Release the connection. Other clones of this store stop working.
    pub async fn close(self) -> Result<()> {
        self.db.close().await?;
        Ok(())
    }
}
