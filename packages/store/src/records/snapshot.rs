use std::path::{Path, PathBuf};

use common::Database;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::Result;

/// Durable local mirror of the record set, stored as JSON under a fixed key.
///
/// Reads never fail: a missing or corrupt snapshot is an empty database.
/// Writes go through a temporary file and a rename so a crash mid-write
/// leaves the previous snapshot intact.
pub struct SnapshotStore {
    dir: PathBuf,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>, key: &str) -> Self {
        let dir = dir.into();
        let path = dir.join(format!("{key}.json"));
        Self {
            dir,
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Database {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Database::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read record snapshot");
                return Database::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(db) => db,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Discarding corrupt record snapshot"
                );
                Database::default()
            }
        }
    }

    /// Replace the snapshot with `db`.
    pub async fn save(&self, db: &Database) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(db).await
    }

    /// Load, modify and write back the snapshot under the write lock.
    pub async fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Database),
    {
        let _guard = self.write_lock.lock().await;
        let mut db = self.load().await;
        f(&mut db);
        self.write(&db).await
    }

    async fn write(&self, db: &Database) -> Result<()> {
        let json = serde_json::to_vec(db)?;
        fs::create_dir_all(&self.dir).await?;

        let temp_path = self
            .dir
            .join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        if let Err(e) = fs::write(&temp_path, &json).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}
