use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{BlobId, Case, CaseDamage, ProductFailure, Test};
use sea_orm::DatabaseConnection;
use store::database::{init_db, init_local_db};
use store::images::{LocalBlobStore, ObjectStore};
use store::records::normalize::{CaseRow, FailureRow, NewCase, NewFailure, TestRow, TestTree};
use store::records::{RecordBackend, SnapshotStore, SqlRecordBackend};
use store::{ImageStore, RecordStore, Result, StoreError};

fn sqlite_url(dir: &Path, file: &str) -> String {
    format!("sqlite://{}?mode=rwc", dir.join(file).display())
}

fn outage() -> StoreError {
    StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        "simulated outage",
    ))
}

/// A relational backend whose availability can be switched off.
pub struct FlakyRecords {
    inner: SqlRecordBackend,
    down: AtomicBool,
}

impl FlakyRecords {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(outage())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordBackend for FlakyRecords {
    async fn fetch_all(&self) -> Result<Vec<TestTree>> {
        self.check()?;
        self.inner.fetch_all().await
    }

    async fn fetch_one(&self, id: i64) -> Result<Option<TestTree>> {
        self.check()?;
        self.inner.fetch_one(id).await
    }

    async fn insert_test(&self, row: TestRow) -> Result<TestRow> {
        self.check()?;
        self.inner.insert_test(row).await
    }

    async fn insert_case(&self, row: NewCase) -> Result<CaseRow> {
        self.check()?;
        self.inner.insert_case(row).await
    }

    async fn insert_failure(&self, row: NewFailure) -> Result<FailureRow> {
        self.check()?;
        self.inner.insert_failure(row).await
    }

    async fn delete_test(&self, id: i64) -> Result<()> {
        self.check()?;
        self.inner.delete_test(id).await
    }
}

/// An object store kept in memory, reachable only while `down` is false.
#[derive(Default)]
pub struct FlakyBucket {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    down: AtomicBool,
}

impl FlakyBucket {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for FlakyBucket {
    async fn upload(&self, name: &str, data: &[u8], _content_type: &str) -> Result<String> {
        if self.down.load(Ordering::SeqCst) {
            return Err(outage());
        }
        let url = format!("https://objects.test/test-images/{name}");
        self.objects.lock().unwrap().insert(url.clone(), data.to_vec());
        Ok(url)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.objects
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| StoreError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }
}

pub struct Env {
    pub remote_db: DatabaseConnection,
    pub remote: Arc<FlakyRecords>,
    pub bucket: Arc<FlakyBucket>,
    pub records: RecordStore,
    pub images: ImageStore,
    pub dir: tempfile::TempDir,
}

impl Env {
    /// A second record store over the same remote and snapshot, as after a restart.
    pub fn reopen_records(&self, freshness: Duration) -> RecordStore {
        RecordStore::new(
            self.remote.clone(),
            SnapshotStore::new(self.dir.path().join("local"), "packaging_test_db_v6"),
            freshness,
        )
    }
}

/// SQLite stands in for the remote relational store.
pub async fn env(freshness: Duration) -> Env {
    let dir = tempfile::tempdir().unwrap();

    let remote_db = init_db(&sqlite_url(dir.path(), "remote.db")).await.unwrap();
    let remote = Arc::new(FlakyRecords {
        inner: SqlRecordBackend::new(remote_db.clone()),
        down: AtomicBool::new(false),
    });

    let records = RecordStore::new(
        remote.clone(),
        SnapshotStore::new(dir.path().join("local"), "packaging_test_db_v6"),
        freshness,
    );

    let local_db = init_local_db(&sqlite_url(dir.path(), "images.db")).await.unwrap();
    let bucket = Arc::new(FlakyBucket::default());
    let images = ImageStore::new(bucket.clone(), LocalBlobStore::new(local_db));

    Env {
        remote_db,
        remote,
        bucket,
        records,
        images,
        dir,
    }
}

pub fn sample_test(id: i64, date: &str) -> Test {
    Test {
        id,
        test_type: "transport".into(),
        date_of_test: date.into(),
        tester_name: "Ayu".into(),
        brand_name: "Nusantara".into(),
        product_name: "Chili Sauce 250ml".into(),
        product_sku: "CS-250".into(),
        test_notes: "pallet wrapped".into(),
        overall_conclusion: "pass with remarks".into(),
        recommendations: "".into(),
        transport_method: "truck".into(),
        origin_location: "Surabaya".into(),
        destination_location: "Malang".into(),
        transport_duration: "3h".into(),
        cases: vec![
            Case {
                position: "bottom row".into(),
                total_units_inspected: 24,
                case_damage: CaseDamage {
                    kind: "crushed corner".into(),
                    description: "".into(),
                    image_id: Some(BlobId::Local(3)),
                },
                product_failures: vec![
                    ProductFailure {
                        mode: "cap leak".into(),
                        units_failed: 2,
                        image_id: Some(BlobId::Remote(
                            "https://objects.test/test-images/1-a.jpg".into(),
                        )),
                    },
                    ProductFailure {
                        mode: "label scuff".into(),
                        units_failed: 5,
                        image_id: None,
                    },
                ],
            },
            Case {
                position: "top row".into(),
                total_units_inspected: 24,
                case_damage: CaseDamage {
                    kind: "none".into(),
                    description: "".into(),
                    image_id: Some(BlobId::Legacy(12)),
                },
                product_failures: vec![],
            },
        ],
    }
}
