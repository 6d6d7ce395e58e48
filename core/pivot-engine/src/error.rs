//! FILENAME: core/pivot-engine/src/error.rs

use thiserror::Error;

use crate::definition::Axis;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PivotError {
    /// A grouping field has more distinct values than the configured limit.
    #[error("field '{field_name}' on the {field_type} axis has {distinct_count} distinct values (limit {limit})")]
    CardinalityExceeded {
        field_name: String,
        field_type: Axis,
        distinct_count: usize,
        limit: usize,
    },

    /// The computation observed its cancellation token at a checkpoint.
    #[error("pivot computation cancelled")]
    Cancelled,

    #[error("invalid pivot configuration: {0}")]
    InvalidConfig(String),
}

impl PivotError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PivotError::Cancelled)
    }
}

impl From<serde_json::Error> for PivotError {
    fn from(err: serde_json::Error) -> Self {
        PivotError::InvalidConfig(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PivotError>;
