//! Mapping between the nested application record and the flat relational rows.
//!
//! Reading is total: absent optional text becomes `""`, absent children become
//! `[]`, and an unparseable image reference is dropped. Writing keeps free
//! text as given, even when empty, and stores empty transport details as
//! `NULL`. Children are left to separate inserts.

use common::{BlobId, Case, CaseDamage, ProductFailure, Test};
use tracing::warn;

/// A row of the `tests` table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestRow {
    pub id: i64,
    pub test_type: String,
    pub date_of_test: String,
    pub tester_name: String,
    pub brand_name: String,
    pub product_name: String,
    pub product_sku: String,
    pub test_notes: Option<String>,
    pub overall_conclusion: Option<String>,
    pub recommendations: Option<String>,
    pub transport_method: Option<String>,
    pub origin_location: Option<String>,
    pub destination_location: Option<String>,
    pub transport_duration: Option<String>,
}

/// A row of the `test_cases` table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseRow {
    pub id: i32,
    pub test_id: i64,
    pub position: String,
    pub total_units_inspected: i32,
    pub case_damage_type: String,
    pub case_damage_description: Option<String>,
    pub case_damage_image_url: Option<String>,
}

/// Insert payload for a case; the id is assigned remotely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCase {
    pub test_id: i64,
    pub position: String,
    pub total_units_inspected: i32,
    pub case_damage_type: String,
    pub case_damage_description: Option<String>,
    pub case_damage_image_url: Option<String>,
}

/// A row of the `product_failures` table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailureRow {
    pub id: i32,
    pub case_id: i32,
    pub failure_mode: String,
    pub units_failed: i32,
    pub image_url: Option<String>,
}

/// Insert payload for a failure; the id is assigned remotely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFailure {
    pub case_id: i32,
    pub failure_mode: String,
    pub units_failed: i32,
    pub image_url: Option<String>,
}

/// A test row joined with its case rows, each joined with its failure rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestTree {
    pub test: TestRow,
    pub cases: Vec<CaseTree>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseTree {
    pub case: CaseRow,
    pub failures: Vec<FailureRow>,
}

/// Rebuild the application record from joined rows, keeping server order.
pub fn unflatten(tree: TestTree) -> Test {
    let TestTree { test: row, cases } = tree;
    Test {
        id: row.id,
        test_type: row.test_type,
        date_of_test: row.date_of_test,
        tester_name: row.tester_name,
        brand_name: row.brand_name,
        product_name: row.product_name,
        product_sku: row.product_sku,
        test_notes: text(row.test_notes),
        overall_conclusion: text(row.overall_conclusion),
        recommendations: text(row.recommendations),
        transport_method: text(row.transport_method),
        origin_location: text(row.origin_location),
        destination_location: text(row.destination_location),
        transport_duration: text(row.transport_duration),
        cases: cases.into_iter().map(unflatten_case).collect(),
    }
}

fn unflatten_case(tree: CaseTree) -> Case {
    let CaseTree { case: row, failures } = tree;
    Case {
        position: row.position,
        total_units_inspected: count(row.total_units_inspected),
        case_damage: CaseDamage {
            kind: row.case_damage_type,
            description: text(row.case_damage_description),
            image_id: image(row.case_damage_image_url),
        },
        product_failures: failures
            .into_iter()
            .map(|f| ProductFailure {
                mode: f.failure_mode,
                units_failed: count(f.units_failed),
                image_id: image(f.image_url),
            })
            .collect(),
    }
}

/// The `tests` row for a record. Cases are not included.
pub fn flatten(test: &Test) -> TestRow {
    TestRow {
        id: test.id,
        test_type: test.test_type.clone(),
        date_of_test: test.date_of_test.clone(),
        tester_name: test.tester_name.clone(),
        brand_name: test.brand_name.clone(),
        product_name: test.product_name.clone(),
        product_sku: test.product_sku.clone(),
        test_notes: Some(test.test_notes.clone()),
        overall_conclusion: Some(test.overall_conclusion.clone()),
        recommendations: Some(test.recommendations.clone()),
        transport_method: optional(&test.transport_method),
        origin_location: optional(&test.origin_location),
        destination_location: optional(&test.destination_location),
        transport_duration: optional(&test.transport_duration),
    }
}

pub fn case_row(test_id: i64, case: &Case) -> NewCase {
    NewCase {
        test_id,
        position: case.position.clone(),
        total_units_inspected: column_count(case.total_units_inspected),
        case_damage_type: case.case_damage.kind.clone(),
        case_damage_description: Some(case.case_damage.description.clone()),
        case_damage_image_url: case.case_damage.image_id.as_ref().map(BlobId::to_string),
    }
}

/// Failure rows keyed by the case id the remote store assigned.
pub fn failure_rows(case_id: i32, failures: &[ProductFailure]) -> Vec<NewFailure> {
    failures
        .iter()
        .map(|f| NewFailure {
            case_id,
            failure_mode: f.mode.clone(),
            units_failed: column_count(f.units_failed),
            image_url: f.image_id.as_ref().map(BlobId::to_string),
        })
        .collect()
}

fn text(column: Option<String>) -> String {
    column.unwrap_or_default()
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn count(column: i32) -> u32 {
    u32::try_from(column).unwrap_or(0)
}

fn column_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn image(column: Option<String>) -> Option<BlobId> {
    let raw = column.filter(|s| !s.is_empty())?;
    match raw.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed image reference");
            None
        }
    }
}
