//! Removal of known-bad tests from result files.

use std::{fs, path::Path};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    loader::find_result_files,
    observability::{log_debug, log_info},
};

/// Tests whose results were invalid in historical runs.
pub const DEFAULT_STRIP_TESTS: &[&str] = &[r"High vertex count::MixedVtxCount-.*"];

/// Which tests the cleaner strips.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Patterns matched against the start of each test name.
    pub strip_tests: Vec<String>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            strip_tests: DEFAULT_STRIP_TESTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Outcome of cleaning one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanAction {
    /// Nothing matched; the document was left as is.
    Unchanged,
    /// Entries were dropped from `results`.
    Updated {
        /// How many entries were dropped.
        removed: usize,
    },
}

/// Totals for a cleaning pass over result directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanSummary {
    /// Result files visited.
    pub files_scanned: usize,
    /// Files rewritten because at least one test was stripped.
    pub files_updated: usize,
    /// Test entries dropped across all files.
    pub tests_removed: usize,
}

/// Strips tests matching a set of name patterns from result documents.
#[derive(Debug, Clone)]
pub struct DataCleaner {
    patterns: Vec<Regex>,
}

impl DataCleaner {
    /// Compiles `patterns`; each must match from the start of the test name.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(&format!("^(?:{})", p.as_ref())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Builds a cleaner from [`CleanConfig::strip_tests`].
    pub fn from_config(config: &CleanConfig) -> Result<Self> {
        Self::new(&config.strip_tests)
    }

    fn strips(&self, test_name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(test_name))
    }

    /// Drops matching entries from the document's `results` array. Entries
    /// without a string `name` are kept.
    pub fn clean(&self, document: &mut Value) -> CleanAction {
        let Some(results) = document.get_mut("results").and_then(Value::as_array_mut) else {
            return CleanAction::Unchanged;
        };

        let before = results.len();
        results.retain(|entry| {
            !entry
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| self.strips(name))
        });
        let removed = before - results.len();
        if removed == 0 {
            CleanAction::Unchanged
        } else {
            CleanAction::Updated { removed }
        }
    }

    /// Cleans one file in place. Unchanged files are not rewritten.
    pub fn clean_file(&self, path: &Path) -> Result<CleanAction> {
        let content = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        let mut document: Value = serde_json::from_str(&content)?;
        let action = self.clean(&mut document);
        if let CleanAction::Updated { removed } = action {
            let buf = serde_json::to_vec_pretty(&document)?;
            fs::write(path, buf).map_err(|err| Error::io(path, err))?;
            log_debug!(
                component = "clean",
                event = "file_cleaned",
                path = %path.display(),
                removed,
            );
        }
        Ok(action)
    }

    /// Cleans every result file below each of `results_dirs`.
    pub fn clean_dirs<P: AsRef<Path>>(&self, results_dirs: &[P]) -> Result<CleanSummary> {
        let mut summary = CleanSummary::default();
        for dir in results_dirs {
            let dir = dir.as_ref();
            if !dir.is_dir() {
                return Err(Error::MissingResultsDir(dir.to_path_buf()));
            }
            for path in find_result_files(dir)? {
                summary.files_scanned += 1;
                if let CleanAction::Updated { removed } = self.clean_file(&path)? {
                    summary.files_updated += 1;
                    summary.tests_removed += removed;
                }
            }
        }
        log_info!(
            component = "clean",
            event = "clean_finished",
            scanned = summary.files_scanned,
            updated = summary.files_updated,
            removed = summary.tests_removed,
        );
        Ok(summary)
    }
}
