use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::entity::{product_failure, test, test_case};
use crate::error::Result;

use super::normalize::{CaseRow, CaseTree, FailureRow, NewCase, NewFailure, TestRow, TestTree};

/// The remote relational store, seen as flat rows.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Every test with its cases and failures, newest `date_of_test` first.
    async fn fetch_all(&self) -> Result<Vec<TestTree>>;

    async fn fetch_one(&self, id: i64) -> Result<Option<TestTree>>;

    async fn insert_test(&self, row: TestRow) -> Result<TestRow>;

    async fn insert_case(&self, row: NewCase) -> Result<CaseRow>;

    async fn insert_failure(&self, row: NewFailure) -> Result<FailureRow>;

    /// Remove a test together with its cases and failures.
    ///
    /// Deleting an unknown id is not an error.
    async fn delete_test(&self, id: i64) -> Result<()>;
}

/// [`RecordBackend`] over a sea-orm connection (PostgreSQL in production).
#[derive(Clone)]
pub struct SqlRecordBackend {
    db: DatabaseConnection,
}

impl SqlRecordBackend {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Attach cases and failures to already-ordered test rows.
    async fn assemble(&self, tests: Vec<test::Model>) -> Result<Vec<TestTree>> {
        if tests.is_empty() {
            return Ok(Vec::new());
        }

        let test_ids: Vec<i64> = tests.iter().map(|t| t.id).collect();
        let cases = test_case::Entity::find()
            .filter(test_case::Column::TestId.is_in(test_ids))
            .order_by_asc(test_case::Column::Id)
            .all(&self.db)
            .await?;

        let case_ids: Vec<i32> = cases.iter().map(|c| c.id).collect();
        let failures = if case_ids.is_empty() {
            Vec::new()
        } else {
            product_failure::Entity::find()
                .filter(product_failure::Column::CaseId.is_in(case_ids))
                .order_by_asc(product_failure::Column::Id)
                .all(&self.db)
                .await?
        };

        let mut failures_by_case: HashMap<i32, Vec<FailureRow>> = HashMap::new();
        for failure in failures {
            failures_by_case
                .entry(failure.case_id)
                .or_default()
                .push(failure_from_model(failure));
        }

        let mut cases_by_test: HashMap<i64, Vec<CaseTree>> = HashMap::new();
        for case in cases {
            let failures = failures_by_case.remove(&case.id).unwrap_or_default();
            cases_by_test.entry(case.test_id).or_default().push(CaseTree {
                case: case_from_model(case),
                failures,
            });
        }

        Ok(tests
            .into_iter()
            .map(|t| {
                let cases = cases_by_test.remove(&t.id).unwrap_or_default();
                TestTree {
                    test: test_from_model(t),
                    cases,
                }
            })
            .collect())
    }
}

#[async_trait]
impl RecordBackend for SqlRecordBackend {
    async fn fetch_all(&self) -> Result<Vec<TestTree>> {
        let tests = test::Entity::find()
            .order_by_desc(test::Column::DateOfTest)
            .order_by_desc(test::Column::Id)
            .all(&self.db)
            .await?;
        self.assemble(tests).await
    }

    async fn fetch_one(&self, id: i64) -> Result<Option<TestTree>> {
        let Some(test) = test::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        Ok(self.assemble(vec![test]).await?.pop())
    }

    async fn insert_test(&self, row: TestRow) -> Result<TestRow> {
        let model = test::ActiveModel {
            id: Set(row.id),
            test_type: Set(row.test_type),
            date_of_test: Set(row.date_of_test),
            tester_name: Set(row.tester_name),
            brand_name: Set(row.brand_name),
            product_name: Set(row.product_name),
            product_sku: Set(row.product_sku),
            test_notes: Set(row.test_notes),
            overall_conclusion: Set(row.overall_conclusion),
            recommendations: Set(row.recommendations),
            transport_method: Set(row.transport_method),
            origin_location: Set(row.origin_location),
            destination_location: Set(row.destination_location),
            transport_duration: Set(row.transport_duration),
            ..Default::default()
        };
        Ok(test_from_model(model.insert(&self.db).await?))
    }

    async fn insert_case(&self, row: NewCase) -> Result<CaseRow> {
        let model = test_case::ActiveModel {
            test_id: Set(row.test_id),
            position: Set(row.position),
            total_units_inspected: Set(row.total_units_inspected),
            case_damage_type: Set(row.case_damage_type),
            case_damage_description: Set(row.case_damage_description),
            case_damage_image_url: Set(row.case_damage_image_url),
            ..Default::default()
        };
        Ok(case_from_model(model.insert(&self.db).await?))
    }

    async fn insert_failure(&self, row: NewFailure) -> Result<FailureRow> {
        let model = product_failure::ActiveModel {
            case_id: Set(row.case_id),
            failure_mode: Set(row.failure_mode),
            units_failed: Set(row.units_failed),
            image_url: Set(row.image_url),
            ..Default::default()
        };
        Ok(failure_from_model(model.insert(&self.db).await?))
    }

    async fn delete_test(&self, id: i64) -> Result<()> {
        let txn = self.db.begin().await?;

        let case_ids: Vec<i32> = test_case::Entity::find()
            .select_only()
            .column(test_case::Column::Id)
            .filter(test_case::Column::TestId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        if !case_ids.is_empty() {
            product_failure::Entity::delete_many()
                .filter(product_failure::Column::CaseId.is_in(case_ids))
                .exec(&txn)
                .await?;
        }

        test_case::Entity::delete_many()
            .filter(test_case::Column::TestId.eq(id))
            .exec(&txn)
            .await?;

        test::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }
}

fn test_from_model(m: test::Model) -> TestRow {
    TestRow {
        id: m.id,
        test_type: m.test_type,
        date_of_test: m.date_of_test,
        tester_name: m.tester_name,
        brand_name: m.brand_name,
        product_name: m.product_name,
        product_sku: m.product_sku,
        test_notes: m.test_notes,
        overall_conclusion: m.overall_conclusion,
        recommendations: m.recommendations,
        transport_method: m.transport_method,
        origin_location: m.origin_location,
        destination_location: m.destination_location,
        transport_duration: m.transport_duration,
    }
}

fn case_from_model(m: test_case::Model) -> CaseRow {
    CaseRow {
        id: m.id,
        test_id: m.test_id,
        position: m.position,
        total_units_inspected: m.total_units_inspected,
        case_damage_type: m.case_damage_type,
        case_damage_description: m.case_damage_description,
        case_damage_image_url: m.case_damage_image_url,
    }
}

fn failure_from_model(m: product_failure::Model) -> FailureRow {
    FailureRow {
        id: m.id,
        case_id: m.case_id,
        failure_mode: m.failure_mode,
        units_failed: m.units_failed,
        image_url: m.image_url,
    }
}
