//! YAML configuration for the analysis pipeline.
//!
//! Every field is optional; an empty file yields the defaults.
//!
//! ```yaml
//! trend:
//!   threshold_ratio: 0.08
//!   min_group_size: 3
//! flatten:
//!   min_inner_samples: 4
//!   generic_gpu_renderers: ["AMD Radeon (TM) Graphics"]
//! clean:
//!   strip_tests: ["High vertex count::MixedVtxCount-.*"]
//! version_overrides:
//!   "xemu-custom-build":
//!     major: 0
//!     minor: 8
//!     patch: 5
//!     build_type: release
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::{
    clean::{CleanConfig, DataCleaner},
    error::{Error, Result},
    flatten::{FlattenConfig, ResultFlattener},
    trend::{TrendAnalyzer, TrendConfig},
    xemu_version::{VersionOverride, VersionParser},
};

/// Settings for a whole processing run, usually read from a YAML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Trend classifier tuning.
    pub trend: TrendConfig,
    /// Record flattening tuning.
    pub flatten: FlattenConfig,
    /// Tests stripped by `clean`.
    pub clean: CleanConfig,
    /// Extra special-case version tags, keyed by the exact raw tag.
    pub version_overrides: BTreeMap<String, VersionOverride>,
}

impl AnalysisConfig {
    /// Parses YAML; empty input yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Reads and parses a YAML config file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::from_yaml_str(&content)
    }

    /// Built-in special cases plus `version_overrides`.
    pub fn version_parser(&self) -> VersionParser {
        VersionParser::new().with_overrides(self.version_overrides.clone())
    }

    /// A flattener using this config.
    pub fn flattener(&self) -> ResultFlattener {
        ResultFlattener::new(self.version_parser(), self.flatten.clone())
    }

    /// A trend analyzer using this config.
    pub fn trend_analyzer(&self) -> TrendAnalyzer {
        TrendAnalyzer::new(self.trend)
    }

    /// Fails if a strip pattern is not a valid regex.
    pub fn cleaner(&self) -> Result<DataCleaner> {
        DataCleaner::from_config(&self.clean)
    }
}
