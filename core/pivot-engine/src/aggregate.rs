//! FILENAME: core/pivot-engine/src/aggregate.rs
//! Aggregator - pure statistics over one field of a record subset.
//!
//! The value column of a subset is `record[field]` for every record, with
//! missing and null entries dropped. Numeric kinds additionally skip values
//! that do not parse as numbers. An empty value column yields `0` for every
//! kind except `count`, which always reports the subset size.

use rustc_hash::FxHashSet;
use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

use records::{format_grouped, FieldValue, Record};

use crate::definition::{AggregationKind, ValueFieldConfig, ValueKey};

/// Fractional digits shown by [`format_aggregate_value`].
const DISPLAY_FRACTION_DIGITS: u8 = 2;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Result of one aggregation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum AggregateValue {
    Number(f64),
    /// `first` / `last`.
    Text(String),
    /// `listUnique`.
    List(Vec<String>),
}

impl AggregateValue {
    pub const ZERO: AggregateValue = AggregateValue::Number(0.0);

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AggregateValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AggregateValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AggregateValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Aggregated values of one cell / total, in configuration order.
///
/// Serializes as an object keyed by the value label, e.g.
/// `{"sales (sum)": 820}` or `{"Count": 6}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedValues {
    entries: SmallVec<[(ValueKey, AggregateValue); 2]>,
}

impl AggregatedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ValueKey, value: AggregateValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &ValueKey) -> Option<&AggregateValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Lookup by display label (`"Count"`, `"sales (sum)"`).
    pub fn get_label(&self, label: &str) -> Option<&AggregateValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.to_string() == label)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ValueKey, &AggregateValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AggregatedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

// ============================================================================
// NUMERIC ACCUMULATOR
// ============================================================================

/// Running statistics over the numeric part of a value column.
/// Variance uses Welford's algorithm for numerical stability.
#[derive(Debug, Clone, Default)]
struct NumericAccumulator {
    sum: f64,
    count: u64,
    min: Option<f64>,
    max: Option<f64>,
    mean: f64,
    m2: f64,
}

impl NumericAccumulator {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        let delta = value - self.mean;
        self.mean += delta / (self.count as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    fn average(&self) -> f64 {
        if self.count > 0 {
            self.sum / (self.count as f64)
        } else {
            0.0
        }
    }

    fn sample_variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / ((self.count - 1) as f64)
        } else {
            0.0
        }
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Computes one statistic of `field` over `records`.
///
/// Never fails: unknown kinds and empty inputs produce `0`.
pub fn aggregate(records: &[&Record], field: &str, kind: &AggregationKind) -> AggregateValue {
    if *kind == AggregationKind::Count {
        return AggregateValue::Number(records.len() as f64);
    }

    let column: Vec<&FieldValue> = records
        .iter()
        .filter_map(|record| record.get(field))
        .filter(|value| !value.is_null())
        .collect();

    if column.is_empty() {
        return AggregateValue::ZERO;
    }

    match kind {
        AggregationKind::Count => AggregateValue::Number(records.len() as f64),
        AggregationKind::CountUnique => {
            let distinct: FxHashSet<_> = column.iter().map(|v| v.distinct_key()).collect();
            AggregateValue::Number(distinct.len() as f64)
        }
        AggregationKind::ListUnique => {
            let mut seen = FxHashSet::default();
            let items = column
                .iter()
                .filter(|v| seen.insert(v.distinct_key()))
                .map(|v| v.to_string())
                .collect();
            AggregateValue::List(items)
        }
        AggregationKind::First => AggregateValue::Text(column[0].to_string()),
        AggregationKind::Last => AggregateValue::Text(column[column.len() - 1].to_string()),
        AggregationKind::IntegerSum => {
            let total = column.iter().filter_map(|v| v.to_integer()).sum();
            AggregateValue::Number(total)
        }
        AggregationKind::Median => {
            let mut numbers: Vec<f64> = column.iter().filter_map(|v| v.to_number()).collect();
            AggregateValue::Number(median(&mut numbers))
        }
        AggregationKind::Sum
        | AggregationKind::Average
        | AggregationKind::SampleVariance
        | AggregationKind::SampleStandardDeviation
        | AggregationKind::Minimum
        | AggregationKind::Maximum => {
            let mut acc = NumericAccumulator::default();
            for number in column.iter().filter_map(|v| v.to_number()) {
                acc.add(number);
            }
            let result = match kind {
                AggregationKind::Sum => acc.sum,
                AggregationKind::Average => acc.average(),
                AggregationKind::SampleVariance => acc.sample_variance(),
                AggregationKind::SampleStandardDeviation => acc.sample_variance().sqrt(),
                AggregationKind::Minimum => acc.min.unwrap_or(0.0),
                AggregationKind::Maximum => acc.max.unwrap_or(0.0),
                _ => 0.0,
            };
            AggregateValue::Number(result)
        }
        AggregationKind::Unknown(_) => AggregateValue::ZERO,
    }
}

fn median(numbers: &mut [f64]) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    numbers.sort_by(f64::total_cmp);
    let mid = numbers.len() / 2;
    if numbers.len() % 2 == 1 {
        numbers[mid]
    } else {
        (numbers[mid - 1] + numbers[mid]) / 2.0
    }
}

/// Aggregated value map of a subset for the given value fields.
/// With no value fields the map is `{"Count": subset size}`.
pub fn aggregate_values(records: &[&Record], value_fields: &[ValueFieldConfig]) -> AggregatedValues {
    let mut values = AggregatedValues::new();
    if value_fields.is_empty() {
        values.insert(ValueKey::Count, AggregateValue::Number(records.len() as f64));
        return values;
    }
    for config in value_fields {
        values.insert(
            ValueKey::from(config),
            aggregate(records, &config.field, &config.aggregation_kind),
        );
    }
    values
}

// ============================================================================
// FORMATTING
// ============================================================================

/// Human-readable rendering of an aggregate value.
///
/// Lists join with `", "`, numbers get thousands separators and at most two
/// fractional digits, text passes through.
pub fn format_aggregate_value(value: &AggregateValue) -> String {
    match value {
        AggregateValue::Number(n) => format_grouped(*n, DISPLAY_FRACTION_DIGITS),
        AggregateValue::Text(s) => s.clone(),
        AggregateValue::List(items) => items.join(", "),
    }
}
