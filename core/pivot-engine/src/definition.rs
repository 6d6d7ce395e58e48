//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a pivot computation.
//! These structures are designed to be:
//! - Serializable (sent from the UI layer as JSON)
//! - Immutable snapshots of user intent for one invocation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default limit on distinct values per grouping field (async path).
pub const DEFAULT_CARDINALITY_LIMIT: usize = 1000;

/// Default number of rows processed between cooperative yields.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for value fields.
///
/// Serialized by wire name (`"sum"`, `"countUnique"`, ...). Any other name
/// deserializes to `Unknown` carrying that name, which aggregates to `0`
/// and keeps its own label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AggregationKind {
    Count,
    CountUnique,
    ListUnique,
    Sum,
    IntegerSum,
    Average,
    Median,
    SampleVariance,
    SampleStandardDeviation,
    Minimum,
    Maximum,
    First,
    Last,
    Unknown(String),
}

impl AggregationKind {
    /// All recognised kinds, in the order the UI lists them.
    pub const ALL: [AggregationKind; 13] = [
        AggregationKind::Count,
        AggregationKind::CountUnique,
        AggregationKind::ListUnique,
        AggregationKind::Sum,
        AggregationKind::IntegerSum,
        AggregationKind::Average,
        AggregationKind::Median,
        AggregationKind::SampleVariance,
        AggregationKind::SampleStandardDeviation,
        AggregationKind::Minimum,
        AggregationKind::Maximum,
        AggregationKind::First,
        AggregationKind::Last,
    ];

    /// Wire name, as used in configuration JSON and value labels.
    pub fn as_str(&self) -> &str {
        match self {
            AggregationKind::Count => "count",
            AggregationKind::CountUnique => "countUnique",
            AggregationKind::ListUnique => "listUnique",
            AggregationKind::Sum => "sum",
            AggregationKind::IntegerSum => "integerSum",
            AggregationKind::Average => "average",
            AggregationKind::Median => "median",
            AggregationKind::SampleVariance => "sampleVariance",
            AggregationKind::SampleStandardDeviation => "sampleStandardDeviation",
            AggregationKind::Minimum => "minimum",
            AggregationKind::Maximum => "maximum",
            AggregationKind::First => "first",
            AggregationKind::Last => "last",
            AggregationKind::Unknown(name) => name,
        }
    }
}

impl Default for AggregationKind {
    fn default() -> Self {
        AggregationKind::Count
    }
}

impl From<&str> for AggregationKind {
    fn from(name: &str) -> Self {
        AggregationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .unwrap_or_else(|| AggregationKind::Unknown(name.to_string()))
    }
}

impl From<String> for AggregationKind {
    fn from(name: String) -> Self {
        match AggregationKind::from(name.as_str()) {
            AggregationKind::Unknown(_) => AggregationKind::Unknown(name),
            known => known,
        }
    }
}

impl From<AggregationKind> for String {
    fn from(kind: AggregationKind) -> Self {
        match kind {
            AggregationKind::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationKind {
    type Err = std::convert::Infallible;

    /// Never fails: unrecognised names map to `Unknown`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(AggregationKind::from(s))
    }
}

// ============================================================================
// AXES & FIELDS
// ============================================================================

/// Which side of the table a grouping field lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Row => "row",
            Axis::Column => "column",
        })
    }
}

/// A value field with its aggregation function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFieldConfig {
    /// Record property to aggregate.
    pub field: String,
    pub aggregation_kind: AggregationKind,
}

impl ValueFieldConfig {
    pub fn new(field: impl Into<String>, aggregation_kind: AggregationKind) -> Self {
        ValueFieldConfig {
            field: field.into(),
            aggregation_kind,
        }
    }
}

/// Identifies one entry of an aggregated value map.
///
/// Displays as `"Count"` or `"<field> (<kind>)"`, e.g. `"sales (sum)"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    /// Record count, used when no value fields are configured.
    Count,
    Field {
        field: String,
        aggregation: AggregationKind,
    },
}

impl ValueKey {
    pub fn field(field: impl Into<String>, aggregation: AggregationKind) -> Self {
        ValueKey::Field {
            field: field.into(),
            aggregation,
        }
    }
}

impl From<&ValueFieldConfig> for ValueKey {
    fn from(config: &ValueFieldConfig) -> Self {
        ValueKey::field(config.field.clone(), config.aggregation_kind.clone())
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKey::Count => f.write_str("Count"),
            ValueKey::Field { field, aggregation } => write!(f, "{} ({})", field, aggregation),
        }
    }
}

// ============================================================================
// FILTER DEFINITIONS
// ============================================================================

/// Allow-list filter on one field. An empty allow-list matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotFilter {
    pub field: String,
    /// Coerced string values a record's field must match.
    #[serde(default)]
    pub allowed_values: Vec<String>,
}

impl PivotFilter {
    pub fn new<I, S>(field: impl Into<String>, allowed_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PivotFilter {
            field: field.into(),
            allowed_values: allowed_values.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// The complete, serializable configuration of one pivot computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PivotConfig {
    /// Row grouping fields, outermost first.
    pub row_fields: Vec<String>,

    /// Column grouping fields, outermost first.
    pub column_fields: Vec<String>,

    /// Aggregated statistics per cell. Empty means a plain record count.
    pub value_field_configs: Vec<ValueFieldConfig>,

    /// Conjunction of allow-list filters.
    pub filters: Vec<PivotFilter>,
}

impl PivotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration sent by the UI layer.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_rows<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.row_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_columns<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_value(mut self, field: impl Into<String>, kind: AggregationKind) -> Self {
        self.value_field_configs.push(ValueFieldConfig::new(field, kind));
        self
    }

    pub fn with_filter(mut self, filter: PivotFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Grouping fields of one axis.
    pub fn fields(&self, axis: Axis) -> &[String] {
        match axis {
            Axis::Row => &self.row_fields,
            Axis::Column => &self.column_fields,
        }
    }

    /// Copy of this configuration with `field` removed from `axis`.
    /// Returns `None` when the axis does not contain the field.
    pub fn without_field(&self, axis: Axis, field: &str) -> Option<Self> {
        if !self.fields(axis).iter().any(|f| f == field) {
            return None;
        }
        let mut next = self.clone();
        let list = match axis {
            Axis::Row => &mut next.row_fields,
            Axis::Column => &mut next.column_fields,
        };
        list.retain(|f| f != field);
        Some(next)
    }

    /// Keys of the aggregated value map every cell carries, in order.
    pub fn value_keys(&self) -> Vec<ValueKey> {
        if self.value_field_configs.is_empty() {
            vec![ValueKey::Count]
        } else {
            self.value_field_configs.iter().map(ValueKey::from).collect()
        }
    }
}

// ============================================================================
// RUNTIME OPTIONS
// ============================================================================

/// Guardrails and scheduling knobs for the asynchronous builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    /// Maximum distinct values allowed per grouping field.
    pub cardinality_limit: usize,

    /// Rows (or columns) processed between cooperative yields.
    pub chunk_size: usize,
}

impl BuildOptions {
    pub fn with_cardinality_limit(mut self, limit: usize) -> Self {
        self.cardinality_limit = limit;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Chunk size actually used; a zero chunk would never make progress.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            cardinality_limit: DEFAULT_CARDINALITY_LIMIT,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
