//! FILENAME: core/pivot-engine/tests/common/mod.rs
//! Shared fixtures for the pivot engine integration tests.

#![allow(dead_code)]

use pivot_engine::{AggregateValue, AggregatedValues, AggregationKind, PivotConfig, ValueKey};
use records::{record, FieldValue, Record};

/// The regional sales data set used throughout the integration tests.
///
/// | region | product | sales |
/// |--------|---------|-------|
/// | North  | Apples  | 100   |
/// | North  | Oranges | 150   |
/// | South  | Apples  | 200   |
/// | South  | Oranges | 120   |
/// | East   | Apples  | 90    |
/// | West   | Oranges | 160   |
pub struct SalesFixture {
    pub records: Vec<Record>,
}

impl SalesFixture {
    pub const ROWS: [(&'static str, &'static str, i64); 6] = [
        ("North", "Apples", 100),
        ("North", "Oranges", 150),
        ("South", "Apples", 200),
        ("South", "Oranges", 120),
        ("East", "Apples", 90),
        ("West", "Oranges", 160),
    ];

    pub fn new() -> Self {
        let records = Self::ROWS
            .iter()
            .map(|&(region, product, sales)| {
                record([
                    ("region", FieldValue::from(region)),
                    ("product", FieldValue::from(product)),
                    ("sales", FieldValue::from(sales)),
                ])
            })
            .collect();
        SalesFixture { records }
    }

    /// region x product, summing sales.
    pub fn sum_config() -> PivotConfig {
        PivotConfig::new()
            .with_rows(["region"])
            .with_columns(["product"])
            .with_value("sales", AggregationKind::Sum)
    }
}

/// Reads a numeric entry, panicking with context when absent.
pub fn number(values: &AggregatedValues, key: &ValueKey) -> f64 {
    values
        .get(key)
        .and_then(AggregateValue::as_number)
        .unwrap_or_else(|| panic!("no numeric value for {}", key))
}

pub fn sales_sum() -> ValueKey {
    ValueKey::field("sales", AggregationKind::Sum)
}
