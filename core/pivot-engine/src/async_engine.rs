//! FILENAME: core/pivot-engine/src/async_engine.rs
//! Asynchronous Pivot Builder - the interactive entry point.
//!
//! Runs the same calculation as `engine::build_pivot_table`, but:
//! - validates every grouping field against a cardinality limit before the
//!   key product is generated (rows before columns)
//! - yields to the runtime after each key-derivation phase and after every
//!   chunk of bucketed records, rows and column totals
//! - observes a `CancellationToken` at each of those checkpoints and fails
//!   with `PivotError::Cancelled` instead of returning a partial table
//!
//! Everything runs on the calling task; there is no parallelism here.

use std::fmt;

use tokio_util::sync::CancellationToken;

use records::Record;

use crate::definition::{Axis, BuildOptions, PivotConfig};
use crate::cache::PivotCacheBuilder;
use crate::engine::PivotCalculator;
use crate::error::{PivotError, Result};
use crate::filter::apply_filters;
use crate::keys::{derive_keys_checked, CardinalityCheck};
use crate::logging::{log_debug, log_info, log_warn, PIVOT};
use crate::view::PivotTable;

/// Records bucketed between yields, per unit of `BuildOptions::chunk_size`.
/// Bucketing a record is far cheaper than aggregating a row.
const RECORDS_PER_CHUNK_ROW: usize = 50;

// ============================================================================
// BUILD PHASES
// ============================================================================

/// Progress of one asynchronous build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Created,
    Filtering,
    DerivingRowKeys,
    DerivingColumnKeys,
    BuildingCells,
    ComputingColumnTotals,
    ComputingGrandTotal,
    Completed,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildPhase::Created => "created",
            BuildPhase::Filtering => "filtering",
            BuildPhase::DerivingRowKeys => "deriving row keys",
            BuildPhase::DerivingColumnKeys => "deriving column keys",
            BuildPhase::BuildingCells => "building cells",
            BuildPhase::ComputingColumnTotals => "computing column totals",
            BuildPhase::ComputingGrandTotal => "computing grand total",
            BuildPhase::Completed => "completed",
        })
    }
}

/// Fails with `Cancelled` if the token has fired.
fn checkpoint(cancel: Option<&CancellationToken>, phase: BuildPhase) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => {
            log_debug!(PIVOT, "build cancelled while {}", phase);
            Err(PivotError::Cancelled)
        }
        _ => Ok(()),
    }
}

/// Hands control back to the runtime, then re-checks cancellation.
async fn yield_point(cancel: Option<&CancellationToken>, phase: BuildPhase) -> Result<()> {
    tokio::task::yield_now().await;
    checkpoint(cancel, phase)
}

fn enter(phase: BuildPhase) -> BuildPhase {
    log_debug!(PIVOT, "phase: {}", phase);
    phase
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Builds a pivot table cooperatively.
///
/// Fails with [`PivotError::CardinalityExceeded`] when a grouping field has
/// more than `options.cardinality_limit` distinct values, and with
/// [`PivotError::Cancelled`] when `cancel` fires before completion. On
/// success the table is identical to what `build_pivot_table` returns.
pub async fn build_pivot_table_async<'a>(
    records: &'a [Record],
    config: &PivotConfig,
    cancel: Option<&CancellationToken>,
    options: &BuildOptions,
) -> Result<PivotTable<'a>> {
    checkpoint(cancel, enter(BuildPhase::Created))?;

    enter(BuildPhase::Filtering);
    let filtered = apply_filters(records, &config.filters);

    let mut phase = enter(BuildPhase::DerivingRowKeys);
    let row_keys = derive_keys_checked(
        &filtered,
        &config.row_fields,
        CardinalityCheck::new(Axis::Row, options.cardinality_limit),
    )
    .map_err(log_rejection)?;
    yield_point(cancel, phase).await?;

    phase = enter(BuildPhase::DerivingColumnKeys);
    let column_keys = derive_keys_checked(
        &filtered,
        &config.column_fields,
        CardinalityCheck::new(Axis::Column, options.cardinality_limit),
    )
    .map_err(log_rejection)?;
    yield_point(cancel, phase).await?;

    let chunk = options.effective_chunk_size();

    phase = enter(BuildPhase::BuildingCells);
    let mut bucketing = PivotCacheBuilder::new(
        &config.row_fields,
        &config.column_fields,
        &row_keys,
        &column_keys,
    );
    for batch in filtered.chunks(chunk * RECORDS_PER_CHUNK_ROW) {
        checkpoint(cancel, phase)?;
        bucketing.add(batch);
        yield_point(cancel, phase).await?;
    }
    let cache = bucketing.finish();

    let calculator = PivotCalculator::with_cache(config, filtered, row_keys, column_keys, cache);
    if calculator.is_empty() {
        phase = enter(BuildPhase::ComputingGrandTotal);
        checkpoint(cancel, phase)?;
        enter(BuildPhase::Completed);
        return Ok(calculator.empty_table());
    }

    let (row_count, column_count) = (calculator.row_count(), calculator.column_count());
    let mut cells = Vec::with_capacity(row_count);
    let mut row_totals = Vec::with_capacity(row_count);
    for start in (0..row_count).step_by(chunk) {
        checkpoint(cancel, phase)?;
        for row in start..(start + chunk).min(row_count) {
            let (row_cells, total) = calculator.row(row);
            cells.push(row_cells);
            row_totals.push(total);
        }
        yield_point(cancel, phase).await?;
    }

    phase = enter(BuildPhase::ComputingColumnTotals);
    let mut column_totals = Vec::with_capacity(column_count);
    for start in (0..column_count).step_by(chunk) {
        checkpoint(cancel, phase)?;
        column_totals.extend(
            (start..(start + chunk).min(column_count)).map(|column| calculator.column_total(column)),
        );
        yield_point(cancel, phase).await?;
    }

    phase = enter(BuildPhase::ComputingGrandTotal);
    checkpoint(cancel, phase)?;
    let grand_total = calculator.grand_total();

    enter(BuildPhase::Completed);
    log_info!(PIVOT, "pivot built: {} rows x {} columns", row_count, column_count);
    Ok(calculator.into_table(cells, row_totals, column_totals, grand_total))
}

fn log_rejection(err: PivotError) -> PivotError {
    log_warn!(PIVOT, "pivot rejected: {}", err);
    err
}
