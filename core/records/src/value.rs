//! FILENAME: core/records/src/value.rs
//! PURPOSE: The scalar values a record field can hold and the record map itself.

use std::fmt;

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::coerce::{number_to_string, parse_float, parse_int};

/// Text used for grouping keys when a field is null or missing.
pub const NULL_KEY: &str = "null";

/// A single flat record: field name -> scalar value.
///
/// A field that is absent from the map is "undefined"; a field mapped to
/// `FieldValue::Null` is null. Both are treated the same everywhere in the
/// pivot engine.
pub type Record = FxHashMap<String, FieldValue>;

/// The scalar value of one record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl FieldValue {
    /// Returns true for `Null`. Combined with a missing map entry this covers
    /// every value the aggregator drops from a value column.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric coercion used by the floating-point aggregations
    /// (`parseFloat(String(value))`). `None` means "not a number" and the
    /// value is skipped, never counted as zero.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_nan() => None,
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => parse_float(s),
            // "true"/"false", "null" and date strings have no numeric prefix.
            FieldValue::Boolean(_) | FieldValue::Null | FieldValue::Date(_) => None,
        }
    }

    /// Integer coercion used by `integerSum` (`parseInt(String(value), 10)`).
    /// Each value is truncated on its own, so `20.9` contributes `20`.
    pub fn to_integer(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => parse_int(&number_to_string(*n)),
            FieldValue::Text(s) => parse_int(s),
            FieldValue::Boolean(_) | FieldValue::Null | FieldValue::Date(_) => None,
        }
    }

    /// Identity of the raw (uncoerced) value for distinct counting.
    /// `1` and `"1"` stay distinct; all NaNs are one value and `-0 == 0`.
    pub fn distinct_key(&self) -> DistinctValue<'_> {
        match self {
            FieldValue::Null => DistinctValue::Null,
            FieldValue::Boolean(b) => DistinctValue::Boolean(*b),
            FieldValue::Number(n) => {
                let bits = if n.is_nan() {
                    f64::NAN.to_bits()
                } else if *n == 0.0 {
                    0.0_f64.to_bits()
                } else {
                    n.to_bits()
                };
                DistinctValue::Number(bits)
            }
            FieldValue::Text(s) => DistinctValue::Text(s),
            FieldValue::Date(d) => DistinctValue::Date(*d),
        }
    }
}

/// Hashable stand-in for a `FieldValue` (see [`FieldValue::distinct_key`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistinctValue<'a> {
    Null,
    Boolean(bool),
    Number(u64),
    Text(&'a str),
    Date(NaiveDateTime),
}

/// Stringification matches the host's `String(value)`.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str(NULL_KEY),
            FieldValue::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            FieldValue::Number(n) => f.write_str(&number_to_string(*n)),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// Coerces a (possibly missing) field value into its grouping key.
///
/// Missing, `Null` and the literal text `"null"` all produce `"null"` and
/// therefore land in the same group.
pub fn key_string(value: Option<&FieldValue>) -> String {
    match value {
        None | Some(FieldValue::Null) => NULL_KEY.to_string(),
        Some(v) => v.to_string(),
    }
}

/// Grouping key of `field` in `record`.
pub fn record_key(record: &Record, field: &str) -> String {
    key_string(record.get(field))
}

/// Builds a record from `(field, value)` pairs.
pub fn record<I, K, V>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::Date(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}
