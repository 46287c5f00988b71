use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Test;

/// Selects tests by brand, SKU and an inclusive `dateOfTest` range.
///
/// `None` fields match everything. Dates compare lexically, which is correct
/// for `YYYY-MM-DD`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestFilter {
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl TestFilter {
    pub fn matches(&self, test: &Test) -> bool {
        if self.brand.as_ref().is_some_and(|b| *b != test.brand_name) {
            return false;
        }
        if self.sku.as_ref().is_some_and(|s| *s != test.product_sku) {
            return false;
        }
        if self
            .from
            .as_ref()
            .is_some_and(|from| test.date_of_test.as_str() < from.as_str())
        {
            return false;
        }
        if self
            .to
            .as_ref()
            .is_some_and(|to| test.date_of_test.as_str() > to.as_str())
        {
            return false;
        }
        true
    }

    pub fn apply<'a>(&'a self, tests: &'a [Test]) -> impl Iterator<Item = &'a Test> + 'a {
        tests.iter().filter(move |t| self.matches(t))
    }
}

/// Aggregate failure figures over a set of tests.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_tests: usize,
    pub total_cases: usize,
    pub total_inspected_units: u64,
    pub total_failed_units: u64,
    /// Percentage with one decimal place; `0.0` when nothing was inspected.
    pub failure_rate: f64,
    /// Failed units per failure mode.
    pub failure_modes: BTreeMap<String, u64>,
}

impl Statistics {
    pub fn compute(tests: &[Test], filter: &TestFilter) -> Self {
        let mut stats = Self::default();

        for test in filter.apply(tests) {
            stats.total_tests += 1;
            for case in &test.cases {
                stats.total_cases += 1;
                stats.total_inspected_units += u64::from(case.total_units_inspected);
                for failure in &case.product_failures {
                    let units = u64::from(failure.units_failed);
                    stats.total_failed_units += units;
                    *stats
                        .failure_modes
                        .entry(failure.mode.clone())
                        .or_insert(0) += units;
                }
            }
        }

        if stats.total_inspected_units > 0 {
            let rate =
                stats.total_failed_units as f64 / stats.total_inspected_units as f64 * 100.0;
            stats.failure_rate = (rate * 10.0).round() / 10.0;
        }

        stats
    }
}
