//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot View - the cross-tabulated result handed to renderers.
//!
//! `cells[r][c]` belongs to `row_headers[r]` x `column_headers[c]`. Cells
//! borrow the caller's records, so `data` entries are the same references
//! the caller passed in and can be matched with `std::ptr::eq`.

use serde::Serialize;

use records::Record;

use crate::aggregate::AggregatedValues;
use crate::keys::KeyTuple;

// ============================================================================
// CELL
// ============================================================================

/// One (row key, column key) intersection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotCell<'a> {
    /// Aggregated values of `data`.
    pub value: AggregatedValues,

    pub row_keys: KeyTuple,

    pub column_keys: KeyTuple,

    /// Records matching both keys, in input order.
    pub data: Vec<&'a Record>,
}

impl PivotCell<'_> {
    /// True when no record matched this combination.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// The complete pivot result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTable<'a> {
    pub row_headers: Vec<KeyTuple>,

    pub column_headers: Vec<KeyTuple>,

    pub cells: Vec<Vec<PivotCell<'a>>>,

    /// Per row, aggregated over every record of that row.
    pub row_totals: Vec<AggregatedValues>,

    /// Per column, aggregated over every record of that column.
    pub column_totals: Vec<AggregatedValues>,

    /// Aggregated over the whole filtered record set.
    pub grand_total: AggregatedValues,
}

impl<'a> PivotTable<'a> {
    /// Result for an empty filtered record set: headers as derived (empty,
    /// or a single empty tuple for an ungrouped axis), no cells or per-axis
    /// totals, and the grand total carrying the empty-input defaults.
    pub fn empty(
        row_headers: Vec<KeyTuple>,
        column_headers: Vec<KeyTuple>,
        grand_total: AggregatedValues,
    ) -> Self {
        PivotTable {
            row_headers,
            column_headers,
            cells: Vec::new(),
            row_totals: Vec::new(),
            column_totals: Vec::new(),
            grand_total,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_headers.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_headers.len()
    }

    /// True when the table has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&PivotCell<'a>> {
        self.cells.get(row).and_then(|cells| cells.get(column))
    }

    /// Position of a row header, if present.
    pub fn row_index(&self, keys: &[&str]) -> Option<usize> {
        self.row_headers.iter().position(|header| header == keys)
    }

    /// Position of a column header, if present.
    pub fn column_index(&self, keys: &[&str]) -> Option<usize> {
        self.column_headers.iter().position(|header| header == keys)
    }
}
