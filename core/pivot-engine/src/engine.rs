//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - The calculation core that transforms records into a table.
//!
//! Algorithm:
//! 1. Filter records by the configured allow-lists
//! 2. Derive the row and column key spaces (sorted cartesian products)
//! 3. Bucket filtered records by row key and column key
//! 4. Cross-tabulate: aggregate every (row, column) cell plus its row total
//! 5. Aggregate column totals and the grand total
//!
//! `build_pivot_table` runs all of this in one pass without a cardinality
//! guard. The asynchronous builder drives the same `PivotCalculator` in
//! chunks.

use records::Record;

use crate::aggregate::{aggregate_values, AggregatedValues};
use crate::cache::PivotCache;
use crate::definition::{PivotConfig, ValueFieldConfig};
use crate::filter::apply_filters;
use crate::keys::{derive_keys, KeyTuple};
use crate::view::{PivotCell, PivotTable};

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// Computes cells and totals over already-derived key spaces.
pub struct PivotCalculator<'a, 'c> {
    value_fields: &'c [ValueFieldConfig],

    filtered: Vec<&'a Record>,

    row_keys: Vec<KeyTuple>,

    column_keys: Vec<KeyTuple>,

    cache: PivotCache<'a>,
}

impl<'a, 'c> PivotCalculator<'a, 'c> {
    /// Creates a calculator and buckets `filtered` against the key spaces.
    pub fn new(
        config: &'c PivotConfig,
        filtered: Vec<&'a Record>,
        row_keys: Vec<KeyTuple>,
        column_keys: Vec<KeyTuple>,
    ) -> Self {
        let cache = PivotCache::build(
            &filtered,
            &config.row_fields,
            &config.column_fields,
            &row_keys,
            &column_keys,
        );
        Self::with_cache(config, filtered, row_keys, column_keys, cache)
    }

    /// Creates a calculator over a cache the caller already bucketed
    /// against the same key spaces.
    pub fn with_cache(
        config: &'c PivotConfig,
        filtered: Vec<&'a Record>,
        row_keys: Vec<KeyTuple>,
        column_keys: Vec<KeyTuple>,
        cache: PivotCache<'a>,
    ) -> Self {
        PivotCalculator {
            value_fields: &config.value_field_configs,
            filtered,
            row_keys,
            column_keys,
            cache,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_keys.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_keys.len()
    }

    /// True when filtering left nothing to tabulate.
    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Cells of one row, left to right, plus that row's total.
    pub fn row(&self, row: usize) -> (Vec<PivotCell<'a>>, AggregatedValues) {
        let row_keys = self.row_keys.get(row).cloned().unwrap_or_default();

        let cells = self
            .cache
            .row_cells(row)
            .into_iter()
            .zip(&self.column_keys)
            .map(|(data, column_keys)| PivotCell {
                value: aggregate_values(&data, self.value_fields),
                row_keys: row_keys.clone(),
                column_keys: column_keys.clone(),
                data,
            })
            .collect();

        let total = aggregate_values(&self.cache.row_records(row), self.value_fields);
        (cells, total)
    }

    pub fn column_total(&self, column: usize) -> AggregatedValues {
        aggregate_values(self.cache.column_records(column), self.value_fields)
    }

    pub fn grand_total(&self) -> AggregatedValues {
        aggregate_values(&self.filtered, self.value_fields)
    }

    /// Result for an empty filtered set (see [`PivotTable::empty`]).
    pub fn empty_table(self) -> PivotTable<'a> {
        let grand_total = self.grand_total();
        PivotTable::empty(self.row_keys, self.column_keys, grand_total)
    }

    /// Assembles the final table from the computed parts.
    pub fn into_table(
        self,
        cells: Vec<Vec<PivotCell<'a>>>,
        row_totals: Vec<AggregatedValues>,
        column_totals: Vec<AggregatedValues>,
        grand_total: AggregatedValues,
    ) -> PivotTable<'a> {
        PivotTable {
            row_headers: self.row_keys,
            column_headers: self.column_keys,
            cells,
            row_totals,
            column_totals,
            grand_total,
        }
    }

    /// Executes the full calculation in one pass.
    pub fn calculate(self) -> PivotTable<'a> {
        if self.is_empty() {
            return self.empty_table();
        }

        let mut cells = Vec::with_capacity(self.row_count());
        let mut row_totals = Vec::with_capacity(self.row_count());
        for row in 0..self.row_count() {
            let (row_cells, total) = self.row(row);
            cells.push(row_cells);
            row_totals.push(total);
        }

        let column_totals = (0..self.column_count())
            .map(|column| self.column_total(column))
            .collect();
        let grand_total = self.grand_total();

        self.into_table(cells, row_totals, column_totals, grand_total)
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Builds a pivot table synchronously.
///
/// No cardinality limit applies and the call never yields, so use it for
/// inputs known to be small; interactive callers should prefer
/// [`crate::build_pivot_table_async`].
pub fn build_pivot_table<'a>(records: &'a [Record], config: &PivotConfig) -> PivotTable<'a> {
    let filtered = apply_filters(records, &config.filters);
    let row_keys = derive_keys(&filtered, &config.row_fields);
    let column_keys = derive_keys(&filtered, &config.column_fields);

    PivotCalculator::new(config, filtered, row_keys, column_keys).calculate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateValue;
    use crate::definition::{AggregationKind, PivotFilter, ValueKey};
    use records::{record, FieldValue};

    fn create_test_records() -> Vec<Record> {
        [
            ("North", "Apples", 100),
            ("North", "Oranges", 150),
            ("South", "Apples", 200),
            ("South", "Oranges", 120),
            ("East", "Apples", 90),
            ("West", "Oranges", 160),
        ]
        .iter()
        .map(|&(region, product, sales)| {
            record([
                ("region", FieldValue::from(region)),
                ("product", FieldValue::from(product)),
                ("sales", FieldValue::from(sales)),
            ])
        })
        .collect()
    }

    fn create_test_config() -> PivotConfig {
        PivotConfig::new()
            .with_rows(["region"])
            .with_columns(["product"])
            .with_value("sales", AggregationKind::Sum)
    }

    fn sales_sum(values: &AggregatedValues) -> f64 {
        values
            .get(&ValueKey::field("sales", AggregationKind::Sum))
            .and_then(AggregateValue::as_number)
            .unwrap()
    }

    #[test]
    fn test_basic_pivot_calculation() {
        let records = create_test_records();
        let table = build_pivot_table(&records, &create_test_config());

        assert_eq!(
            table.row_headers,
            vec![vec!["East"], vec!["North"], vec!["South"], vec!["West"]]
        );
        assert_eq!(table.column_headers, vec![vec!["Apples"], vec!["Oranges"]]);
        assert_eq!(table.cells.len(), 4);
        assert!(table.cells.iter().all(|row| row.len() == 2));
        assert_eq!(sales_sum(&table.grand_total), 820.0);

        let north = table.row_index(&["North"]).unwrap();
        assert_eq!(sales_sum(&table.row_totals[north]), 250.0);
        let oranges = table.column_index(&["Oranges"]).unwrap();
        assert_eq!(sales_sum(&table.column_totals[oranges]), 430.0);
    }

    #[test]
    fn test_empty_cells_are_kept() {
        let records = create_test_records();
        let table = build_pivot_table(&records, &create_test_config());

        let east = table.row_index(&["East"]).unwrap();
        let oranges = table.column_index(&["Oranges"]).unwrap();
        let cell = table.cell(east, oranges).unwrap();
        assert!(cell.is_empty());
        assert_eq!(sales_sum(&cell.value), 0.0);
        assert_eq!(cell.row_keys, vec!["East"]);
        assert_eq!(cell.column_keys, vec!["Oranges"]);
    }

    #[test]
    fn test_cell_data_shares_input_references() {
        let records = create_test_records();
        let table = build_pivot_table(&records, &create_test_config());

        let south = table.row_index(&["South"]).unwrap();
        let apples = table.column_index(&["Apples"]).unwrap();
        let cell = table.cell(south, apples).unwrap();
        assert_eq!(cell.data.len(), 1);
        assert!(std::ptr::eq(cell.data[0], &records[2]));
    }

    #[test]
    fn test_no_row_fields() {
        let records = create_test_records();
        let config = create_test_config().with_rows(Vec::<String>::new());
        let table = build_pivot_table(&records, &config);

        assert_eq!(table.row_headers, vec![Vec::<String>::new()]);
        assert_eq!(table.cells.len(), 1);
        assert_eq!(sales_sum(&table.row_totals[0]), 820.0);
    }

    #[test]
    fn test_no_value_fields_counts_records() {
        let records = create_test_records();
        let mut config = create_test_config();
        config.value_field_configs.clear();
        let table = build_pivot_table(&records, &config);

        for row in &table.cells {
            for cell in row {
                assert_eq!(cell.value.len(), 1);
                assert_eq!(
                    cell.value.get(&ValueKey::Count),
                    Some(&AggregateValue::Number(cell.data.len() as f64))
                );
            }
        }
        assert_eq!(table.grand_total.get_label("Count"), Some(&AggregateValue::Number(6.0)));
    }

    #[test]
    fn test_filter_applies_before_grouping() {
        let records = create_test_records();
        let config = create_test_config().with_filter(PivotFilter::new("region", ["North", "South"]));
        let table = build_pivot_table(&records, &config);

        assert_eq!(table.row_headers, vec![vec!["North"], vec!["South"]]);
        assert_eq!(sales_sum(&table.grand_total), 570.0);
    }

    #[test]
    fn test_empty_filtered_set() {
        let records = create_test_records();
        let config = create_test_config().with_filter(PivotFilter::new("region", ["Nowhere"]));
        let table = build_pivot_table(&records, &config);

        assert!(table.row_headers.is_empty());
        assert!(table.column_headers.is_empty());
        assert!(table.is_empty());
        assert!(table.row_totals.is_empty());
        assert_eq!(sales_sum(&table.grand_total), 0.0);
    }

    #[test]
    fn test_empty_input_ungrouped() {
        let records: Vec<Record> = Vec::new();
        let table = build_pivot_table(&records, &PivotConfig::new());

        assert_eq!(table.row_headers, vec![Vec::<String>::new()]);
        assert_eq!(table.column_headers, vec![Vec::<String>::new()]);
        assert!(table.cells.is_empty());
        assert_eq!(table.grand_total.get(&ValueKey::Count), Some(&AggregateValue::Number(0.0)));
    }
}
