use std::time::Duration;

use store::Stores;
use store::config::AppConfig;

use crate::common::sample_test;

fn config_in(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = format!("sqlite://{}?mode=rwc", dir.join("remote.db").display());
    config.local.data_dir = dir.join("data");
    config.local.blob_db_url = format!(
        "sqlite://{}?mode=rwc",
        dir.join("data/images.db").display()
    );
    config.cache.freshness_ms = 0;
    config
}

#[tokio::test]
async fn open_creates_blob_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.local.blob_db_url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("blobs/nested/images.db").display()
    );

    let stores = Stores::open(&config).await.unwrap();
    assert!(stores.images.local().is_empty().await.unwrap());
    assert!(dir.path().join("blobs/nested").is_dir());
    stores.shutdown().await.unwrap();
}

#[tokio::test]
async fn unusable_image_store_leaves_records_working() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the image store's directory should be.
    std::fs::write(dir.path().join("blocked"), b"").unwrap();
    let mut config = config_in(dir.path());
    config.local.blob_db_url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("blocked/images.db").display()
    );

    let mut stores = Stores::open(&config).await.unwrap();
    stores.start_eviction(&config);

    let input = sample_test(11, "2024-04-01");
    stores.records.add_test(input.clone()).await.unwrap();
    assert_eq!(stores.records.get_database().await.tests, vec![input]);
    stores.records.delete_test(11).await.unwrap();
    assert!(stores.records.get_test_by_id(11).await.is_none());

    assert!(stores.images.local().len().await.is_err());
    assert_eq!(stores.images.get_image(None).await.unwrap(), None);

    tokio::time::timeout(Duration::from_secs(30), stores.shutdown())
        .await
        .unwrap()
        .ok();
}
