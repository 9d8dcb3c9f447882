//! Raw result documents as written by the perf tester.

use serde::Deserialize;

/// One result file: a single (version, machine, backend) run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRunDocument {
    /// Raw version tag, see [`crate::xemu_version::VersionParser`].
    pub xemu_version: String,
    /// Renderer backend tag reported by the harness.
    pub renderer: String,
    /// Host the run executed on.
    pub machine_info: MachineInfo,
    /// One entry per executed test.
    pub results: Vec<RawTestResult>,
    /// Name of the test ISO the run used.
    #[serde(default)]
    pub iso: Option<String>,
    /// Multi-line `KEY: VALUE` dump of the GL driver strings.
    #[serde(default)]
    pub xemu_machine_info: Option<String>,
    /// Link to the source tag the build was produced from.
    #[serde(default)]
    pub xemu_tag_url: Option<String>,
}

/// Host details recorded by the harness.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MachineInfo {
    /// Host operating system.
    pub os_system: String,
    /// CPU vendor string, e.g. `AuthenticAMD`.
    pub cpu_manufacturer: String,
    /// Maximum CPU frequency in MHz.
    pub cpu_freq_max: f64,
}

/// Aggregated timings of one test in one run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTestResult {
    /// Fully qualified `Suite::Test` name.
    pub name: String,
    /// Number of timed iterations.
    pub iterations: u32,
    /// Sum of all iterations.
    pub total_us: f64,
    /// Mean iteration time.
    pub average_us: f64,
    /// Fastest iteration.
    pub min_us: f64,
    /// Slowest iteration.
    pub max_us: f64,
    /// Per-iteration samples, when the harness recorded them.
    #[serde(default)]
    pub raw_results: Option<Vec<f64>>,
}

/// GL driver identification extracted from `xemu_machine_info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuInfo {
    /// `GL_VENDOR`.
    pub vendor: Option<String>,
    /// `GL_RENDERER`.
    pub renderer: Option<String>,
    /// `GL_VERSION`.
    pub gl_version: Option<String>,
    /// `GL_SHADING_LANGUAGE_VERSION`.
    pub glsl_version: Option<String>,
}

impl GpuInfo {
    /// Parses the `KEY: VALUE` lines of a machine info dump. Lines without a
    /// `": "` separator and unknown keys are ignored.
    pub fn parse(machine_info: &str) -> Self {
        let mut info = GpuInfo::default();
        for line in machine_info.lines() {
            let Some((key, value)) = line.split_once(": ") else {
                continue;
            };
            let slot = match key {
                "GL_VENDOR" => &mut info.vendor,
                "GL_RENDERER" => &mut info.renderer,
                "GL_VERSION" => &mut info.gl_version,
                "GL_SHADING_LANGUAGE_VERSION" => &mut info.glsl_version,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        info
    }
}
