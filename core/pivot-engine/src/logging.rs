//! FILENAME: core/pivot-engine/src/logging.rs
// PURPOSE: Category-tagged logging macros over the `log` facade.
//
// Usage mirrors the application logger: `log_info!("PIVOT", "rows={}", n)`.
// The category becomes the log target so hosts can filter per subsystem.

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::debug!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::info!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        ::log::warn!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        ::log::error!(target: $cat, $($arg)*)
    };
}

/// Category used by the pivot calculation path.
pub const PIVOT: &str = "PIVOT";

/// Category used by the session (debounce / retry) layer.
pub const SESSION: &str = "PIVOT_SESSION";

// Re-export the macros so they can be imported via `use crate::logging::log_info;`
pub use log_debug;
pub use log_error;
pub use log_info;
pub use log_warn;
