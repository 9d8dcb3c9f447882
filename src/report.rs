//! The JSON data document consumed by the results site.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Serialize;

use crate::{
    error::{Error, Result},
    flatten::FlatTestRecord,
    observability::log_info,
    suite::{SuiteRegistry, TestSuiteDescriptor},
};

/// Title used unless [`ReportData::title`] overrides it.
pub const DEFAULT_REPORT_TITLE: &str = "xemu perf tester results";

/// Payload consumed by the report renderer.
#[derive(Debug, Serialize)]
pub struct ReportData<'a> {
    /// Page title.
    pub title: String,
    /// Flattened records in load order.
    pub results: &'a [FlatTestRecord],
    /// Descriptors for the suites present in `results`, keyed by the suite
    /// name as it appears there.
    pub test_suites: BTreeMap<String, TestSuiteDescriptor>,
}

impl<'a> ReportData<'a> {
    /// A report over `results` with the default title and no suite descriptors.
    pub fn new(results: &'a [FlatTestRecord]) -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            results,
            test_suites: BTreeMap::new(),
        }
    }

    /// Replaces the default title.
    pub fn title(self, title: impl Into<String>) -> Self {
        ReportData {
            title: title.into(),
            ..self
        }
    }

    /// Attaches the registry entry for every suite that can be resolved.
    pub fn with_suite_descriptors(mut self, registry: &SuiteRegistry) -> Self {
        for record in self.results {
            if self.test_suites.contains_key(&record.suite) {
                continue;
            }
            if let Some(descriptor) = registry.lookup(&record.suite) {
                self.test_suites
                    .insert(record.suite.clone(), descriptor.clone());
            }
        }
        self
    }

    /// Pretty-printed JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Writes the document, creating parent directories as needed.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
            }
        }
        fs::write(path, self.to_json()?).map_err(|err| Error::io(path, err))?;
        log_info!(
            component = "report",
            event = "report_written",
            path = %path.display(),
            records = self.results.len(),
            suites = self.test_suites.len(),
        );
        Ok(())
    }
}
