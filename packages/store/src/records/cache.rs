use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use common::Test;

/// Short-lived copy of the last remote listing.
///
/// Absorbs bursts of reads (re-renders after a filter change) without
/// re-querying the remote store. Last writer wins.
pub struct RecordCache {
    freshness: Duration,
    slot: Mutex<Option<Entry>>,
}

struct Entry {
    fetched_at: Instant,
    tests: Vec<Test>,
}

impl RecordCache {
    pub fn new(freshness: Duration) -> Self {
        Self {
            freshness,
            slot: Mutex::new(None),
        }
    }

    /// The cached listing if it is younger than the freshness window.
    pub fn get(&self) -> Option<Vec<Test>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.freshness)
            .map(|entry| entry.tests.clone())
    }

    pub fn put(&self, tests: Vec<Test>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Entry {
            fetched_at: Instant::now(),
            tests,
        });
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}
