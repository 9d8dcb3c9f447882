#![deny(missing_docs)]
//! Normalization and trend analysis for xemu perf tester results.
//!
//! Raw result documents (one per version, machine and renderer backend) are
//! decoded by [`loader`], flattened into one [`FlatTestRecord`] per test
//! execution by [`flatten`], and labeled with a per-series performance trend by
//! [`trend`]. Version tags are turned into comparable versions by
//! [`xemu_version`].
//!
//! Everything here is synchronous and works on in-memory data; only the
//! loader, the cleaner and the report writer touch the filesystem.

mod observability;

/// Stripping of known-bad tests from result files.
pub mod clean;
/// Processing configuration loaded from YAML.
pub mod config;
/// Raw result document model.
pub mod document;
/// Error types.
pub mod error;
/// Flattening of run documents into per-test records.
pub mod flatten;
/// Result file discovery and decoding.
pub mod loader;
/// Machine identity derived from result file names.
pub mod machine;
/// Version ranking by normalized performance.
pub mod rank;
/// Report data output.
pub mod report;
/// Test suite registry lookups.
pub mod suite;
/// Trend classification.
pub mod trend;
/// Version tag parsing.
pub mod xemu_version;

#[cfg(test)]
mod test_util;

pub use crate::{
    config::AnalysisConfig,
    error::{Error, MalformedInputError, Result, VersionParseError},
    flatten::{FlatTestRecord, ResultFlattener},
    loader::{load_results, LoadedRun},
    trend::{TrendAnalyzer, TrendLabel},
    xemu_version::{BuildType, SemanticVersion, VersionParser},
};

/// Flattens `runs` and attaches trend labels.
pub fn analyze_runs(runs: &[LoadedRun], config: &AnalysisConfig) -> Result<Vec<FlatTestRecord>> {
    let mut records = config.flattener().flatten(runs)?;
    config.trend_analyzer().annotate(&mut records);
    Ok(records)
}
