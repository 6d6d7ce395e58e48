//! FILENAME: core/records/src/lib.rs
//! Record data model shared by the pivot engine and its callers.
//!
//! Layers:
//! - `value`: `FieldValue`, `Record` and grouping-key coercion
//! - `coerce`: host-compatible number <-> text conversion
//! - `number_format`: display formatting for aggregated numbers

pub mod coerce;
pub mod number_format;
pub mod value;

pub use coerce::{number_to_string, parse_float, parse_int};
pub use number_format::format_grouped;
pub use value::{key_string, record, record_key, DistinctValue, FieldValue, Record, NULL_KEY};
