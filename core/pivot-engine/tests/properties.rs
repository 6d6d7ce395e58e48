//! FILENAME: core/pivot-engine/tests/properties.rs
//! Property tests: determinism, full key enumeration and additive total consistency.

mod common;

use std::collections::HashSet;

use proptest::prelude::*;

use common::number;
use pivot_engine::{
    build_pivot_table, build_pivot_table_async, AggregationKind, BuildOptions, PivotConfig,
    PivotFilter, ValueKey,
};
use records::{record, FieldValue, Record};

fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((0u8..5, 0u8..4, -1000i64..1000), 0..40).prop_map(|rows| {
        rows.into_iter()
            .map(|(region, product, amount)| {
                record([
                    ("region", FieldValue::from(format!("r{}", region))),
                    ("product", FieldValue::from(format!("p{}", product))),
                    ("amount", FieldValue::from(amount)),
                ])
            })
            .collect()
    })
}

/// Kinds whose row, column and grand totals are plain sums of their cells.
fn additive_keys() -> [ValueKey; 3] {
    [
        ValueKey::field("amount", AggregationKind::Sum),
        ValueKey::field("amount", AggregationKind::IntegerSum),
        ValueKey::field("amount", AggregationKind::Count),
    ]
}

fn config() -> PivotConfig {
    PivotConfig::new()
        .with_rows(["region"])
        .with_columns(["product"])
        .with_value("amount", AggregationKind::Sum)
        .with_value("amount", AggregationKind::IntegerSum)
        .with_value("amount", AggregationKind::Count)
}

fn distinct(records: &[Record], field: &str) -> usize {
    records
        .iter()
        .filter_map(|r| r.get(field).map(|v| v.to_string()))
        .collect::<HashSet<_>>()
        .len()
}

proptest! {
    #[test]
    fn building_twice_is_identical(records in arb_records()) {
        let first = build_pivot_table(&records, &config());
        let second = build_pivot_table(&records, &config());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn key_space_is_full_product(records in arb_records()) {
        let table = build_pivot_table(&records, &config());
        if records.is_empty() {
            prop_assert!(table.cells.is_empty());
            return Ok(());
        }

        prop_assert_eq!(table.row_count(), distinct(&records, "region"));
        prop_assert_eq!(table.column_count(), distinct(&records, "product"));
        prop_assert_eq!(table.cells.len(), table.row_count());
        for row in &table.cells {
            prop_assert_eq!(row.len(), table.column_count());
        }

        let placed: usize = table.cells.iter().flatten().map(|cell| cell.data.len()).sum();
        prop_assert_eq!(placed, records.len());
    }

    #[test]
    fn additive_totals_are_consistent(records in arb_records()) {
        let table = build_pivot_table(&records, &config());
        if table.is_empty() {
            return Ok(());
        }

        for key in &additive_keys() {
            for (row, cells) in table.cells.iter().enumerate() {
                let across: f64 = cells.iter().map(|cell| number(&cell.value, key)).sum();
                prop_assert_eq!(across, number(&table.row_totals[row], key), "row {} of {}", row, key);
            }
            for column in 0..table.column_count() {
                let down: f64 = table
                    .cells
                    .iter()
                    .map(|cells| number(&cells[column].value, key))
                    .sum();
                prop_assert_eq!(down, number(&table.column_totals[column], key), "column {} of {}", column, key);
            }

            let rows: f64 = table.row_totals.iter().map(|t| number(t, key)).sum();
            prop_assert_eq!(rows, number(&table.grand_total, key), "grand total of {}", key);
        }
    }

    #[test]
    fn async_builder_matches_sync(records in arb_records(), chunk in 1usize..8) {
        let config = config().with_filter(PivotFilter::new("region", ["r0", "r2", "r4"]));
        let expected = build_pivot_table(&records, &config);

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let options = BuildOptions::default().with_chunk_size(chunk);
        let actual = runtime
            .block_on(build_pivot_table_async(&records, &config, None, &options))
            .unwrap();
        prop_assert_eq!(actual, expected);
    }
}
