use serde::{Deserialize, Serialize};

use crate::blob_id::BlobId;
use crate::lenient::{null_as_default, skip_invalid};

/// The full record set, as handed to views and persisted in the local snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Unreadable entries are skipped rather than failing the whole set.
    #[serde(deserialize_with = "skip_invalid")]
    pub tests: Vec<Test>,
}

impl Database {
    pub fn new(tests: Vec<Test>) -> Self {
        Self { tests }
    }

    /// Order by `dateOfTest`, newest first. Ties keep their insertion order.
    pub fn sort_most_recent_first(&mut self) {
        self.tests.sort_by(|a, b| b.date_of_test.cmp(&a.date_of_test));
    }

    pub fn find(&self, id: i64) -> Option<&Test> {
        self.tests.iter().find(|t| t.id == id)
    }

    /// Drop every test with the given id. Returns whether anything was removed.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.tests.len();
        self.tests.retain(|t| t.id != id);
        before != self.tests.len()
    }
}

/// One packaging-integrity test run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Test {
    /// Client-generated, see [`crate::TestIdGenerator`].
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub test_type: String,
    /// ISO calendar date, `YYYY-MM-DD`.
    #[serde(deserialize_with = "null_as_default")]
    pub date_of_test: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tester_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub brand_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_sku: String,
    #[serde(deserialize_with = "null_as_default")]
    pub test_notes: String,
    #[serde(deserialize_with = "null_as_default")]
    pub overall_conclusion: String,
    #[serde(deserialize_with = "null_as_default")]
    pub recommendations: String,
    // Transport tests only; empty otherwise.
    #[serde(deserialize_with = "null_as_default")]
    pub transport_method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub origin_location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub destination_location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub transport_duration: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cases: Vec<Case>,
}

/// One shipping unit inspected within a test.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Case {
    #[serde(deserialize_with = "null_as_default")]
    pub position: String,
    #[serde(deserialize_with = "null_as_default")]
    pub total_units_inspected: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub case_damage: CaseDamage,
    #[serde(deserialize_with = "null_as_default")]
    pub product_failures: Vec<ProductFailure>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseDamage {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "crate::lenient::image_id")]
    pub image_id: Option<BlobId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFailure {
    #[serde(deserialize_with = "null_as_default")]
    pub mode: String,
    #[serde(deserialize_with = "null_as_default")]
    pub units_failed: u32,
    #[serde(deserialize_with = "crate::lenient::image_id")]
    pub image_id: Option<BlobId>,
}
