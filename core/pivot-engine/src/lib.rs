//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot computation engine.
//!
//! Turns a flat list of records plus a `PivotConfig` into a cross-tabulated
//! `PivotTable`: filtered, grouped by row and column keys, with aggregate
//! statistics per cell, per row, per column and overall.
//!
//! Layers:
//! - `definition`: Serializable configuration (what to compute)
//! - `filter`, `keys`, `aggregate`: the calculation stages
//! - `cache`: per-invocation bucketing of records (HOW we compute)
//! - `view`: The result handed to renderers (WHAT we display)
//! - `engine`: Synchronous builder for bounded inputs
//! - `async_engine`: Cancellable, chunked builder with cardinality guards
//! - `session`: Debounce / supersession / field ejection for interactive use

pub mod logging;

pub mod aggregate;
pub mod async_engine;
pub mod cache;
pub mod definition;
pub mod engine;
pub mod error;
pub mod filter;
pub mod keys;
pub mod session;
pub mod view;

pub use aggregate::{aggregate, aggregate_values, format_aggregate_value, AggregateValue, AggregatedValues};
pub use async_engine::{build_pivot_table_async, BuildPhase};
pub use definition::*;
pub use engine::{build_pivot_table, PivotCalculator};
pub use error::{PivotError, Result};
pub use filter::apply_filters;
pub use keys::{cartesian_product, compare_key_values, derive_keys, derive_keys_checked, CardinalityCheck, KeyTuple};
pub use session::{EjectedField, PivotSession, SessionOptions, SessionOutcome, DEFAULT_DEBOUNCE};
pub use view::{PivotCell, PivotTable};

pub use records::{FieldValue, Record};
pub use tokio_util::sync::CancellationToken;
