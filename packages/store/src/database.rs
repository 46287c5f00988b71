use std::path::{Path, PathBuf};
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Connect to the remote record database and sync the test/case/failure schema.
pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("store::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Open the embedded image store. Acquire once at start-up and share the handle.
pub async fn init_local_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // The embedded engine serializes writers itself.
    opt.max_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("store::local_entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// A pool that connects on first use. Lets start-up succeed while a store is
/// unreachable; every query fails until it comes back.
pub async fn connect_lazy(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());
    opt.connect_lazy(true)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);
    Database::connect(opt).await
}

/// Directory holding the file of a `sqlite://` URL, if it names one.
pub fn sqlite_parent_dir(db_url: &str) -> Option<PathBuf> {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
