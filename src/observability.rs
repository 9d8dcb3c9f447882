//! Logging helpers for the report pipeline.
//!
//! All events are emitted through `tracing` with the single target
//! `xemu_perf` and carry an `event` field for filtering.
//!
//! The library never installs a subscriber; the `xemu-perf-report` binary
//! configures `tracing_subscriber` itself.
//!
//! ## Conventions
//!
//! - `event`: snake_case event name (required)
//! - `component`: pipeline stage (e.g., "loader", "flatten", "trend")
//! - Use `%` for Display, `?` for Debug formatting

/// Target for all log events emitted by this crate.
pub(crate) const XEMU_PERF_TARGET: &str = "xemu_perf";

/// Macro for info-level log events.
///
/// # Example
/// ```ignore
/// log_info!(
///     component = "loader",
///     event = "results_loaded",
///     runs = runs.len(),
/// );
/// ```
macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::XEMU_PERF_TARGET, $($field)*)
    };
}

/// Macro for debug-level log events.
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::XEMU_PERF_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::XEMU_PERF_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_warn;
