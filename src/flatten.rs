//! Flattening of nested run documents into one record per test execution.

use serde::{Deserialize, Serialize};

use crate::{
    document::RawTestResult,
    error::{Error, Result},
    loader::LoadedRun,
    observability::{log_debug, log_warn},
    trend::TrendLabel,
    xemu_version::{SemanticVersion, VersionParser},
};

/// Suite name used when a test name has no `::` separator.
pub const SUITE_NOT_APPLICABLE: &str = "N/A";

/// Renderer string reported for AMD integrated graphics regardless of model.
pub const GENERIC_AMD_IGPU_RENDERER: &str = "AMD Radeon (TM) Graphics";

/// Prefix stripped from `xemu_tag_url` values by default.
pub const DEFAULT_TAG_URL_PREFIX: &str = "https://github.com/xemu-project/xemu/releases/tag/";

/// Tuning for the flattening stage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// Minimum number of raw samples before the doubly trimmed statistics
    /// (dropping both the fastest and the slowest sample) are computed.
    pub min_inner_samples: usize,
    /// Renderer strings that only identify "some integrated GPU"; these are
    /// replaced by the CPU manufacturer.
    pub generic_gpu_renderers: Vec<String>,
    /// Prefix removed from `xemu_tag_url` to get the bare tag.
    pub tag_url_prefix: String,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            min_inner_samples: 4,
            generic_gpu_renderers: vec![GENERIC_AMD_IGPU_RENDERER.to_string()],
            tag_url_prefix: DEFAULT_TAG_URL_PREFIX.to_string(),
        }
    }
}

impl FlattenConfig {
    /// Sets [`FlattenConfig::min_inner_samples`].
    pub fn min_inner_samples(self, min_inner_samples: usize) -> Self {
        FlattenConfig {
            min_inner_samples,
            ..self
        }
    }

    /// Sets [`FlattenConfig::generic_gpu_renderers`].
    pub fn generic_gpu_renderers(self, generic_gpu_renderers: Vec<String>) -> Self {
        FlattenConfig {
            generic_gpu_renderers,
            ..self
        }
    }

    /// Sets [`FlattenConfig::tag_url_prefix`].
    pub fn tag_url_prefix(self, tag_url_prefix: impl Into<String>) -> Self {
        FlattenConfig {
            tag_url_prefix: tag_url_prefix.into(),
            ..self
        }
    }
}

/// Statistics over the samples that remain after dropping both the single
/// fastest and the single slowest iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InnerStats {
    /// Second smallest sample.
    pub inner_min_us: f64,
    /// Second largest sample.
    pub inner_max_us: f64,
    /// Mean with the fastest and slowest iterations removed.
    pub inner_average_us: f64,
    /// `inner_max_us - inner_average_us`.
    pub inner_error_plus_us: f64,
    /// `inner_average_us - inner_min_us`.
    pub inner_error_minus_us: f64,
}

/// One test execution for one (version, machine, backend).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatTestRecord {
    /// Text before the first `::` of the test name, or `N/A`.
    pub suite: String,
    /// Fully qualified test name.
    pub test_name: String,
    /// Number of timed iterations.
    pub iterations: u32,
    /// Mean iteration time.
    pub average_us: f64,
    /// Average with the slowest iteration removed.
    #[serde(rename = "average_us_exmax")]
    pub average_excluding_max_us: f64,
    /// Sum of all iterations.
    pub total_us: f64,
    /// Fastest iteration.
    pub min_us: f64,
    /// Slowest iteration.
    pub max_us: f64,
    /// `max_us - average_us`.
    pub error_plus_us: f64,
    /// `average_us - min_us`.
    pub error_minus_us: f64,
    /// Present only when enough raw samples were recorded.
    #[serde(flatten)]
    pub inner: Option<InnerStats>,
    /// Raw version tag as found in the document.
    pub xemu_version: String,
    /// Parsed form of `xemu_version`.
    pub xemu_version_obj: SemanticVersion,
    /// Release tag with the URL prefix stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xemu_tag: Option<String>,
    /// Renderer backend tag from the document.
    pub renderer: String,
    /// Test ISO name, when recorded.
    pub iso: Option<String>,
    /// Host operating system.
    pub os_system: String,
    /// Host CPU vendor.
    pub cpu_manufacturer: String,
    /// Host maximum CPU frequency in MHz.
    pub cpu_freq_max: f64,
    /// `GL_VENDOR` of the host.
    pub gpu_vendor: Option<String>,
    /// GL renderer, with generic integrated GPU names replaced by the CPU vendor.
    pub gpu_renderer: Option<String>,
    /// `GL_VERSION` of the host.
    pub gpu_gl_version: Option<String>,
    /// `GL_SHADING_LANGUAGE_VERSION` of the host.
    pub gpu_glsl_version: Option<String>,
    /// See [`crate::machine::MachineIdentity::machine_id`].
    pub machine_id: String,
    /// Series key together with `test_name`.
    pub machine_id_with_renderer: String,
    /// Set once by [`crate::trend::TrendAnalyzer::annotate`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendLabel>,
}

/// Produces [`FlatTestRecord`]s from loaded runs.
#[derive(Debug, Clone, Default)]
pub struct ResultFlattener {
    parser: VersionParser,
    config: FlattenConfig,
}

impl ResultFlattener {
    /// A flattener using `parser` for version tags.
    pub fn new(parser: VersionParser, config: FlattenConfig) -> Self {
        Self { parser, config }
    }

    /// Flattens `runs` in input order, then per-run result order.
    ///
    /// Fails on the first document whose version tag cannot be parsed.
    pub fn flatten(&self, runs: &[LoadedRun]) -> Result<Vec<FlatTestRecord>> {
        let capacity = runs.iter().map(|r| r.document.results.len()).sum();
        let mut records = Vec::with_capacity(capacity);
        for run in runs {
            let doc = &run.document;
            let version = self.parser.parse(&doc.xemu_version).map_err(|err| {
                log_warn!(
                    component = "flatten",
                    event = "version_parse_failed",
                    source = %run.source_name,
                    tag = %err.tag,
                );
                Error::DocumentVersion {
                    source_name: run.source_name.clone(),
                    source: err,
                }
            })?;
            let xemu_tag = doc.xemu_tag_url.as_deref().map(|url| {
                url.strip_prefix(self.config.tag_url_prefix.as_str())
                    .unwrap_or(url)
                    .to_string()
            });
            let cpu_manufacturer = doc.machine_info.cpu_manufacturer.as_str();
            let gpu_renderer = run
                .gpu
                .renderer
                .as_deref()
                .map(|renderer| self.patch_gpu_renderer(renderer, cpu_manufacturer));

            for result in &doc.results {
                records.push(FlatTestRecord {
                    suite: suite_name(&result.name).to_string(),
                    test_name: result.name.clone(),
                    iterations: result.iterations,
                    average_us: result.average_us,
                    average_excluding_max_us: average_excluding_max(result),
                    total_us: result.total_us,
                    min_us: result.min_us,
                    max_us: result.max_us,
                    error_plus_us: result.max_us - result.average_us,
                    error_minus_us: result.average_us - result.min_us,
                    inner: inner_stats(result, self.config.min_inner_samples),
                    xemu_version: doc.xemu_version.clone(),
                    xemu_version_obj: version.clone(),
                    xemu_tag: xemu_tag.clone(),
                    renderer: doc.renderer.clone(),
                    iso: doc.iso.clone(),
                    os_system: doc.machine_info.os_system.clone(),
                    cpu_manufacturer: doc.machine_info.cpu_manufacturer.clone(),
                    cpu_freq_max: doc.machine_info.cpu_freq_max,
                    gpu_vendor: run.gpu.vendor.clone(),
                    gpu_renderer: gpu_renderer.clone(),
                    gpu_gl_version: run.gpu.gl_version.clone(),
                    gpu_glsl_version: run.gpu.glsl_version.clone(),
                    machine_id: run.identity.machine_id.clone(),
                    machine_id_with_renderer: run.identity.machine_id_with_renderer.clone(),
                    trend: None,
                });
            }

            log_debug!(
                component = "flatten",
                event = "run_flattened",
                source = %run.source_name,
                version = %version,
                tests = doc.results.len(),
            );
        }
        Ok(records)
    }

    fn patch_gpu_renderer(&self, renderer: &str, cpu_manufacturer: &str) -> String {
        if self
            .config
            .generic_gpu_renderers
            .iter()
            .any(|generic| generic == renderer)
        {
            cpu_manufacturer.to_string()
        } else {
            renderer.to_string()
        }
    }
}

/// Text before the first `::`, or [`SUITE_NOT_APPLICABLE`].
pub fn suite_name(test_name: &str) -> &str {
    test_name
        .split_once("::")
        .map(|(suite, _)| suite)
        .unwrap_or(SUITE_NOT_APPLICABLE)
}

/// Mean of all iterations but the slowest. Single-iteration results keep their
/// raw average.
pub fn average_excluding_max(result: &RawTestResult) -> f64 {
    if result.iterations > 1 {
        (result.total_us - result.max_us) / f64::from(result.iterations - 1)
    } else {
        result.average_us
    }
}

/// Doubly trimmed statistics, present only with at least `min_samples` raw
/// samples and more than two iterations.
pub fn inner_stats(result: &RawTestResult, min_samples: usize) -> Option<InnerStats> {
    let samples = result.raw_results.as_deref()?;
    if samples.len() < min_samples.max(3) || result.iterations <= 2 {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let inner_min_us = sorted[1];
    let inner_max_us = sorted[sorted.len() - 2];
    let inner_average_us =
        (result.total_us - result.max_us - result.min_us) / f64::from(result.iterations - 2);

    Some(InnerStats {
        inner_min_us,
        inner_max_us,
        inner_average_us,
        inner_error_plus_us: inner_max_us - inner_average_us,
        inner_error_minus_us: inner_average_us - inner_min_us,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(iterations: u32, total: f64, avg: f64, min: f64, max: f64) -> RawTestResult {
        RawTestResult {
            name: "Suite::test".to_string(),
            iterations,
            total_us: total,
            average_us: avg,
            min_us: min,
            max_us: max,
            raw_results: None,
        }
    }

    fn run_json(renderer: &str, tag_url: Option<&str>) -> String {
        let tag_url = tag_url
            .map(|url| format!(r#""xemu_tag_url": "{url}","#))
            .unwrap_or_default();
        format!(
            r#"{{
                "xemu_version": "xemu-0.8.5-master-abc",
                "renderer": "OPENGL",
                {tag_url}
                "machine_info": {{"os_system": "Linux", "cpu_manufacturer": "AuthenticAMD", "cpu_freq_max": 4000}},
                "xemu_machine_info": "GL_VENDOR: AMD\nGL_RENDERER: {renderer}",
                "results": [
                    {{"name": "Lighting::spot", "iterations": 5, "total_us": 500, "average_us": 100,
                      "min_us": 50, "max_us": 200, "raw_results": [50, 80, 90, 80, 200]}},
                    {{"name": "standalone", "iterations": 1, "total_us": 42, "average_us": 42,
                      "min_us": 42, "max_us": 42}}
                ]
            }}"#
        )
    }

    #[test]
    fn suite_is_prefix_or_sentinel() {
        assert_eq!(suite_name("Lighting::spot::bright"), "Lighting");
        assert_eq!(suite_name("standalone"), SUITE_NOT_APPLICABLE);
        assert_eq!(suite_name("::odd"), "");
    }

    #[test]
    fn excludes_slowest_iteration() {
        assert_eq!(average_excluding_max(&raw(5, 500.0, 100.0, 50.0, 200.0)), 75.0);
    }

    #[test]
    fn single_iteration_keeps_average() {
        assert_eq!(average_excluding_max(&raw(1, 37.5, 37.5, 37.5, 37.5)), 37.5);
        assert_eq!(average_excluding_max(&raw(0, 0.0, 12.0, 0.0, 0.0)), 12.0);
    }

    #[test]
    fn inner_stats_need_four_samples() {
        let mut result = raw(3, 30.0, 10.0, 5.0, 15.0);
        result.raw_results = Some(vec![5.0, 10.0, 15.0]);
        assert_eq!(inner_stats(&result, 4), None);

        let mut result = raw(5, 500.0, 100.0, 50.0, 200.0);
        result.raw_results = Some(vec![200.0, 50.0, 90.0, 80.0, 80.0]);
        let inner = inner_stats(&result, 4).unwrap();
        assert_eq!(inner.inner_min_us, 80.0);
        assert_eq!(inner.inner_max_us, 90.0);
        assert_eq!(inner.inner_average_us, 250.0 / 3.0);
        assert_eq!(inner.inner_error_plus_us, 90.0 - 250.0 / 3.0);
        assert_eq!(inner.inner_error_minus_us, 250.0 / 3.0 - 80.0);
    }

    #[test]
    fn flattens_in_document_order() {
        let run =
            LoadedRun::from_json("box-GL.json", &run_json("Mesa Intel(R) UHD", None)).unwrap();
        let records = ResultFlattener::default().flatten(&[run]).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.suite, "Lighting");
        assert_eq!(first.average_excluding_max_us, 75.0);
        assert_eq!(first.error_plus_us, 100.0);
        assert_eq!(first.error_minus_us, 50.0);
        assert!(first.inner.is_some());
        assert_eq!(first.machine_id, "box");
        assert_eq!(first.machine_id_with_renderer, "box-GL");
        assert_eq!(first.gpu_renderer.as_deref(), Some("Mesa Intel(R) UHD"));
        assert_eq!(first.xemu_version_obj.short_name(), "0.8.5");
        assert_eq!(first.trend, None);

        let second = &records[1];
        assert_eq!(second.suite, SUITE_NOT_APPLICABLE);
        assert_eq!(second.average_excluding_max_us, 42.0);
        assert_eq!(second.inner, None);
    }

    #[test]
    fn patches_generic_integrated_renderer() {
        let json = run_json(GENERIC_AMD_IGPU_RENDERER, None);
        let run = LoadedRun::from_json("box-GL.json", &json).unwrap();
        let records = ResultFlattener::default().flatten(&[run]).unwrap();
        assert_eq!(records[0].gpu_renderer.as_deref(), Some("AuthenticAMD"));
    }

    #[test]
    fn strips_tag_url_prefix() {
        let url = format!("{DEFAULT_TAG_URL_PREFIX}v0.8.5");
        let run = LoadedRun::from_json("box-GL.json", &run_json("x", Some(&url))).unwrap();
        let records = ResultFlattener::default().flatten(&[run]).unwrap();
        assert_eq!(records[0].xemu_tag.as_deref(), Some("v0.8.5"));

        let json = run_json("x", Some("elsewhere/v1"));
        let run = LoadedRun::from_json("box-GL.json", &json).unwrap();
        let records = ResultFlattener::default().flatten(&[run]).unwrap();
        assert_eq!(records[0].xemu_tag.as_deref(), Some("elsewhere/v1"));
    }

    #[test]
    fn unknown_version_aborts() {
        let json = run_json("x", None).replace("xemu-0.8.5-master-abc", "not-a-version");
        let run = LoadedRun::from_json("box-GL.json", &json).unwrap();
        let err = ResultFlattener::default().flatten(&[run]).unwrap_err();
        assert!(matches!(
            err,
            Error::DocumentVersion { ref source_name, ref source }
                if source_name == "box-GL.json" && source.tag == "not-a-version"
        ));
        let message = err.to_string();
        assert!(message.contains("box-GL.json"), "{message}");
        assert!(message.contains("not-a-version"), "{message}");
    }

    #[test]
    fn serializes_flat_shape() {
        let run = LoadedRun::from_json("box-GL.json", &run_json("x", None)).unwrap();
        let records = ResultFlattener::default().flatten(&[run]).unwrap();
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["average_us_exmax"], 75.0);
        assert_eq!(json["inner_min_us"], 80.0);
        assert_eq!(json["xemu_version_obj"]["short"], "0.8.5");
        assert!(json.get("trend").is_none());
        assert!(json.get("inner").is_none());

        let json = serde_json::to_value(&records[1]).unwrap();
        assert!(json.get("inner_min_us").is_none());
    }
}
