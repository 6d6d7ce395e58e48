//! FILENAME: core/pivot-engine/src/cache.rs
//! Pivot Cache - per-invocation bucketing of filtered records.
//!
//! Every filtered record is assigned once to its row key and column key, so
//! cell subsets, row totals and column totals are read from buckets instead
//! of rescanning the record set for every (row, column) pair. Buckets keep
//! input order, which is the order of `PivotCell::data`.

use rustc_hash::FxHashMap;

use records::{record_key, Record};

use crate::keys::KeyTuple;

/// Maps a key tuple to its header position.
struct AxisLookup<'k> {
    positions: FxHashMap<&'k [String], usize>,
}

impl<'k> AxisLookup<'k> {
    fn new(keys: &'k [KeyTuple]) -> Self {
        let positions = keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (key.as_slice(), idx))
            .collect();
        AxisLookup { positions }
    }

    fn position(&self, record: &Record, fields: &[String]) -> Option<usize> {
        let tuple: KeyTuple = fields.iter().map(|f| record_key(record, f)).collect();
        self.positions.get(tuple.as_slice()).copied()
    }
}

/// Incremental bucketing, so callers can interleave other work between
/// batches of records. Batches must be added in input order.
///
/// Key spaces derived from the same record set contain every record's
/// tuple, so no record is dropped.
pub struct PivotCacheBuilder<'a, 'k> {
    row_fields: &'k [String],
    column_fields: &'k [String],
    rows: AxisLookup<'k>,
    columns: AxisLookup<'k>,
    cache: PivotCache<'a>,
}

impl<'a, 'k> PivotCacheBuilder<'a, 'k> {
    pub fn new(
        row_fields: &'k [String],
        column_fields: &'k [String],
        row_keys: &'k [KeyTuple],
        column_keys: &'k [KeyTuple],
    ) -> Self {
        PivotCacheBuilder {
            row_fields,
            column_fields,
            rows: AxisLookup::new(row_keys),
            columns: AxisLookup::new(column_keys),
            cache: PivotCache {
                row_members: vec![Vec::new(); row_keys.len()],
                column_members: vec![Vec::new(); column_keys.len()],
            },
        }
    }

    pub fn add(&mut self, batch: &[&'a Record]) {
        for &record in batch {
            let (Some(row), Some(column)) = (
                self.rows.position(record, self.row_fields),
                self.columns.position(record, self.column_fields),
            ) else {
                continue;
            };
            self.cache.row_members[row].push((record, column));
            self.cache.column_members[column].push(record);
        }
    }

    pub fn finish(self) -> PivotCache<'a> {
        self.cache
    }
}

/// Filtered records bucketed by row and by column.
#[derive(Debug, Clone)]
pub struct PivotCache<'a> {
    /// Per row key: member records with their column position.
    row_members: Vec<Vec<(&'a Record, usize)>>,

    /// Per column key: member records.
    column_members: Vec<Vec<&'a Record>>,
}

impl<'a> PivotCache<'a> {
    /// Buckets `filtered` against the derived key spaces in one pass.
    pub fn build(
        filtered: &[&'a Record],
        row_fields: &[String],
        column_fields: &[String],
        row_keys: &[KeyTuple],
        column_keys: &[KeyTuple],
    ) -> Self {
        let mut builder = PivotCacheBuilder::new(row_fields, column_fields, row_keys, column_keys);
        builder.add(filtered);
        builder.finish()
    }

    pub fn row_count(&self) -> usize {
        self.row_members.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_members.len()
    }

    /// All records of one row, across every column.
    pub fn row_records(&self, row: usize) -> Vec<&'a Record> {
        self.row_members
            .get(row)
            .map(|members| members.iter().map(|&(record, _)| record).collect())
            .unwrap_or_default()
    }

    /// Records of one row split by column position.
    pub fn row_cells(&self, row: usize) -> Vec<Vec<&'a Record>> {
        let mut cells = vec![Vec::new(); self.column_count()];
        if let Some(members) = self.row_members.get(row) {
            for &(record, column) in members {
                cells[column].push(record);
            }
        }
        cells
    }

    /// All records of one column, across every row.
    pub fn column_records(&self, column: usize) -> &[&'a Record] {
        self.column_members
            .get(column)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
