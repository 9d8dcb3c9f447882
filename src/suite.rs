//! Test suite descriptors from the perf test registry.
//!
//! The registry is a JSON document with a `test_suites` array. Fetching it is
//! left to the caller; this module only decodes and indexes it.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Describes one test suite of the perf tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSuiteDescriptor {
    /// Suite name with spaces replaced by `_`.
    pub suite_name: String,
    /// Name of the C++ class implementing the suite.
    pub class_name: String,
    /// Free-form description, one entry per line.
    pub description: Vec<String>,
    /// Path of the suite implementation in the perf test repository.
    pub source_file: String,
    /// `-1` when unknown.
    pub source_file_line: i64,
    /// Per-test notes keyed by test name.
    pub test_descriptions: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    suite: String,
    #[serde(default, rename = "class")]
    class_name: String,
    #[serde(default)]
    description: Vec<String>,
    #[serde(default)]
    source_file: String,
    #[serde(default = "RawDescriptor::default_line")]
    source_file_line: i64,
    #[serde(default)]
    test_descriptions: BTreeMap<String, String>,
}

impl RawDescriptor {
    fn default_line() -> i64 {
        -1
    }
}

impl From<RawDescriptor> for TestSuiteDescriptor {
    fn from(raw: RawDescriptor) -> Self {
        Self {
            suite_name: raw.suite.replace(' ', "_"),
            class_name: raw.class_name,
            description: raw.description,
            source_file: raw.source_file,
            source_file_line: raw.source_file_line,
            test_descriptions: raw.test_descriptions,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRegistry {
    #[serde(default)]
    test_suites: Vec<RawDescriptor>,
}

/// Descriptors indexed by suite name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteRegistry {
    descriptors: BTreeMap<String, TestSuiteDescriptor>,
}

impl SuiteRegistry {
    /// Decodes a registry document.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawRegistry = serde_json::from_str(content)?;
        let descriptors = raw
            .test_suites
            .into_iter()
            .map(TestSuiteDescriptor::from)
            .map(|d| (d.suite_name.clone(), d))
            .collect();
        Ok(Self { descriptors })
    }

    /// Reads and decodes a registry file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::from_json(&content)
    }

    /// Number of registered suites.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True when no suites are registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Permissive lookup of a suite as named in result files.
    ///
    /// Registry keys usually look like `TextureFormatTests` while result suite
    /// names look like `Texture_format`, so after an exact match this tries the
    /// CamelCased name and then the CamelCased name with a `Tests` suffix.
    pub fn lookup(&self, suite_name: &str) -> Option<&TestSuiteDescriptor> {
        if let Some(found) = self.descriptors.get(suite_name) {
            return Some(found);
        }
        let camel_cased: String = suite_name.split('_').map(title_case).collect();
        self.descriptors
            .get(&camel_cased)
            .or_else(|| self.descriptors.get(&format!("{camel_cased}Tests")))
    }
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the
/// rest.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut prev_alpha = false;
    for c in word.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
