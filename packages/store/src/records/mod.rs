//! Test records: remote relational store first, local snapshot when it fails.

pub mod cache;
pub mod normalize;
pub mod remote;
pub mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use common::{Database, Test};
use tracing::{error, warn};

use crate::error::Result;

pub use cache::RecordCache;
pub use remote::{RecordBackend, SqlRecordBackend};
pub use snapshot::SnapshotStore;

use normalize::{CaseTree, TestTree};

/// Which tier served a read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Remote,
    Cache,
    Snapshot,
}

#[derive(Clone, Debug)]
pub struct Loaded {
    pub database: Database,
    pub source: Source,
}

/// Read and write test records across the remote store, the in-memory cache
/// and the durable snapshot.
///
/// Reads always succeed, degrading to stale or local data. Writes that fail
/// remotely are applied to the snapshot and then reported as errors, so the
/// caller can tell "saved locally" from "saved everywhere".
pub struct RecordStore {
    remote: Arc<dyn RecordBackend>,
    cache: RecordCache,
    snapshot: SnapshotStore,
}

impl RecordStore {
    pub fn new(
        remote: Arc<dyn RecordBackend>,
        snapshot: SnapshotStore,
        freshness: Duration,
    ) -> Self {
        Self {
            remote,
            cache: RecordCache::new(freshness),
            snapshot,
        }
    }

    /// All tests, newest first, along with the tier that produced them.
    pub async fn load(&self) -> Loaded {
        if let Some(tests) = self.cache.get() {
            return Loaded {
                database: Database::new(tests),
                source: Source::Cache,
            };
        }

        match self.remote.fetch_all().await {
            Ok(trees) => {
                let tests: Vec<Test> = trees.into_iter().map(normalize::unflatten).collect();
                self.cache.put(tests.clone());

                let database = Database::new(tests);
                if let Err(e) = self.snapshot.save(&database).await {
                    error!(error = %e, "Failed to persist record snapshot");
                }
                Loaded {
                    database,
                    source: Source::Remote,
                }
            }
            Err(e) => {
                warn!(error = %e, "Remote record store unavailable, serving local snapshot");
                let mut database = self.snapshot.load().await;
                database.sort_most_recent_first();
                Loaded {
                    database,
                    source: Source::Snapshot,
                }
            }
        }
    }

    pub async fn get_database(&self) -> Database {
        self.load().await.database
    }

    /// Insert a test with its cases and failures.
    ///
    /// Returns the record as confirmed by the remote store. On failure the
    /// record is appended to the local snapshot and the remote error is
    /// returned; rows already inserted remotely are not rolled back.
    pub async fn add_test(&self, test: Test) -> Result<Test> {
        match self.insert_remote(&test).await {
            Ok(confirmed) => {
                self.cache.invalidate();
                Ok(confirmed)
            }
            Err(e) => {
                error!(test_id = test.id, error = %e, "Failed to add test, keeping local copy");
                let test_id = test.id;
                let local = self
                    .snapshot
                    .update(move |db| {
                        db.remove(test.id);
                        db.tests.push(test);
                    })
                    .await;
                if let Err(local) = local {
                    error!(test_id, error = %local, "Failed to write local copy of test");
                }
                Err(e)
            }
        }
    }

    // Cases need the test row, failures need the remote-assigned case id.
    async fn insert_remote(&self, test: &Test) -> Result<Test> {
        let inserted = self.remote.insert_test(normalize::flatten(test)).await?;

        let mut cases = Vec::with_capacity(test.cases.len());
        for case in &test.cases {
            let case_row = self
                .remote
                .insert_case(normalize::case_row(inserted.id, case))
                .await?;

            let mut failures = Vec::with_capacity(case.product_failures.len());
            for row in normalize::failure_rows(case_row.id, &case.product_failures) {
                failures.push(self.remote.insert_failure(row).await?);
            }
            cases.push(CaseTree {
                case: case_row,
                failures,
            });
        }

        Ok(normalize::unflatten(TestTree {
            test: inserted,
            cases,
        }))
    }

    /// Fetch one test, falling back to the snapshot. `None` when nothing matches.
    pub async fn get_test_by_id(&self, id: i64) -> Option<Test> {
        match self.remote.fetch_one(id).await {
            Ok(tree) => tree.map(normalize::unflatten),
            Err(e) => {
                warn!(
                    test_id = id,
                    error = %e,
                    "Failed to fetch test remotely, searching snapshot"
                );
                self.snapshot
                    .load()
                    .await
                    .tests
                    .into_iter()
                    .find(|t| t.id == id)
            }
        }
    }

    /// Delete a test. Cascading to its cases and failures is left to the
    /// remote store; referenced images are kept.
    ///
    /// On failure the test is dropped from the snapshot and the remote error
    /// is returned.
    pub async fn delete_test(&self, id: i64) -> Result<()> {
        match self.remote.delete_test(id).await {
            Ok(()) => {
                self.cache.invalidate();
                Ok(())
            }
            Err(e) => {
                error!(test_id = id, error = %e, "Failed to delete test, removing local copy");
                let local = self
                    .snapshot
                    .update(|db| {
                        db.remove(id);
                    })
                    .await;
                if let Err(local) = local {
                    error!(test_id = id, error = %local, "Failed to update local snapshot");
                }
                Err(e)
            }
        }
    }
}
