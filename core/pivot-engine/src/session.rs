//! FILENAME: core/pivot-engine/src/session.rs
//! Pivot Session - debounce, supersession and field ejection around the
//! asynchronous builder.
//!
//! A session owns a record set and serves configuration changes coming from
//! an interactive caller. Each `submit` supersedes the previous one: the
//! older request observes its token as cancelled at its next checkpoint (or
//! while still debouncing) and resolves to `PivotError::Cancelled`.
//!
//! When a grouping field is rejected for cardinality, the session drops it
//! from the configuration and tries again; the engine itself never retries.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use records::Record;

use crate::async_engine::build_pivot_table_async;
use crate::definition::{Axis, BuildOptions, PivotConfig};
use crate::error::{PivotError, Result};
use crate::logging::{log_debug, log_error, log_info, log_warn, SESSION};
use crate::view::PivotTable;

/// Default quiet period before a submitted configuration is computed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Quiet period a request waits before it starts computing.
    pub debounce: Duration,

    pub build: BuildOptions,
}

impl SessionOptions {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_build(mut self, build: BuildOptions) -> Self {
        self.build = build;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            debounce: DEFAULT_DEBOUNCE,
            build: BuildOptions::default(),
        }
    }
}

/// A grouping field removed from the configuration after it exceeded the
/// cardinality limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EjectedField {
    pub field: String,
    pub axis: Axis,
    pub distinct_count: usize,
}

/// Result of a successful `submit`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome<'s> {
    pub table: PivotTable<'s>,

    /// The configuration actually computed, after any ejections.
    pub config: PivotConfig,

    /// Fields dropped on the way, in the order they were rejected.
    pub ejected: Vec<EjectedField>,
}

pub struct PivotSession {
    records: Vec<Record>,
    options: SessionOptions,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl PivotSession {
    pub fn new(records: Vec<Record>, options: SessionOptions) -> Self {
        PivotSession {
            records,
            options,
            in_flight: Mutex::new(None),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Cancels whatever request is currently in flight.
    pub fn cancel(&self) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = slot.take() {
            log_debug!(SESSION, "cancelling in-flight pivot request");
            token.cancel();
        }
    }

    /// Installs a fresh token, cancelling the one it replaces.
    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(token.clone()) {
            log_debug!(SESSION, "superseding previous pivot request");
            previous.cancel();
        }
        token
    }

    /// Debounces, then computes `config`, ejecting grouping fields that
    /// exceed the cardinality limit until the build succeeds.
    ///
    /// Resolves to `PivotError::Cancelled` if a later `submit` or a
    /// `cancel` supersedes this request before it completes.
    pub async fn submit(&self, config: PivotConfig) -> Result<SessionOutcome<'_>> {
        let token = self.begin();

        tokio::select! {
            _ = token.cancelled() => {
                log_debug!(SESSION, "request superseded while debouncing");
                return Err(PivotError::Cancelled);
            }
            _ = tokio::time::sleep(self.options.debounce) => {}
        }

        let mut config = config;
        let mut ejected = Vec::new();
        loop {
            match build_pivot_table_async(&self.records, &config, Some(&token), &self.options.build).await {
                Ok(table) => {
                    if !ejected.is_empty() {
                        log_info!(SESSION, "pivot built after ejecting {} field(s)", ejected.len());
                    }
                    return Ok(SessionOutcome {
                        table,
                        config,
                        ejected,
                    });
                }
                Err(PivotError::CardinalityExceeded {
                    field_name,
                    field_type,
                    distinct_count,
                    limit,
                }) => {
                    let Some(next) = config.without_field(field_type, &field_name) else {
                        log_error!(
                            SESSION,
                            "rejected {} field '{}' is not in the configuration",
                            field_type,
                            field_name
                        );
                        return Err(PivotError::CardinalityExceeded {
                            field_name,
                            field_type,
                            distinct_count,
                            limit,
                        });
                    };
                    log_warn!(
                        SESSION,
                        "ejecting {} field '{}' ({} distinct values, limit {})",
                        field_type,
                        field_name,
                        distinct_count,
                        limit
                    );
                    ejected.push(EjectedField {
                        field: field_name,
                        axis: field_type,
                        distinct_count,
                    });
                    config = next;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AggregationKind;
    use records::{record, FieldValue};

    fn records(n: i64) -> Vec<Record> {
        let regions = ["North", "South", "East", "West"];
        (0..n)
            .map(|i| {
                record([
                    ("region", FieldValue::from(regions[(i % 4) as usize])),
                    ("uniqueField", FieldValue::from(format!("id-{}", i))),
                    ("amount", FieldValue::from(i)),
                ])
            })
            .collect()
    }

    fn quick(limit: usize) -> SessionOptions {
        SessionOptions::default()
            .with_debounce(Duration::from_millis(20))
            .with_build(BuildOptions::default().with_cardinality_limit(limit))
    }

    #[test]
    fn test_default_options() {
        let options = SessionOptions::default();
        assert_eq!(options.debounce, Duration::from_millis(150));
        assert_eq!(options.build, BuildOptions::default());
    }

    #[tokio::test]
    async fn test_submit_builds_table() {
        let session = PivotSession::new(records(8), quick(1000));
        let config = PivotConfig::new()
            .with_rows(["region"])
            .with_value("amount", AggregationKind::Sum);

        let outcome = session.submit(config.clone()).await.unwrap();
        assert_eq!(outcome.config, config);
        assert!(outcome.ejected.is_empty());
        assert_eq!(outcome.table.row_count(), 4);
    }

    #[tokio::test]
    async fn test_newer_submit_supersedes_older() {
        let session = PivotSession::new(records(8), quick(1000));
        let older = PivotConfig::new().with_rows(["region"]);
        let newer = PivotConfig::new().with_columns(["region"]);

        let (first, second) = tokio::join!(session.submit(older), async {
            tokio::task::yield_now().await;
            session.submit(newer.clone()).await
        });

        assert!(first.unwrap_err().is_cancelled());
        let outcome = second.unwrap();
        assert_eq!(outcome.config, newer);
        assert_eq!(outcome.table.column_count(), 4);
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_request() {
        let session = PivotSession::new(records(8), quick(1000));

        let (result, ()) = tokio::join!(session.submit(PivotConfig::new()), async {
            tokio::task::yield_now().await;
            session.cancel();
        });
        assert_eq!(result.unwrap_err(), PivotError::Cancelled);
    }

    #[tokio::test]
    async fn test_high_cardinality_field_is_ejected() {
        let session = PivotSession::new(records(100), quick(50));
        let config = PivotConfig::new()
            .with_rows(["uniqueField", "region"])
            .with_columns(["uniqueField"])
            .with_value("amount", AggregationKind::Sum);

        let outcome = session.submit(config).await.unwrap();
        assert_eq!(
            outcome.ejected,
            vec![
                EjectedField {
                    field: "uniqueField".to_string(),
                    axis: Axis::Row,
                    distinct_count: 100,
                },
                EjectedField {
                    field: "uniqueField".to_string(),
                    axis: Axis::Column,
                    distinct_count: 100,
                },
            ]
        );
        assert_eq!(outcome.config.row_fields, vec!["region"]);
        assert!(outcome.config.column_fields.is_empty());
        assert_eq!(outcome.table.row_count(), 4);
        assert_eq!(outcome.table.column_count(), 1);
    }
}
