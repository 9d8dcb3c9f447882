//! Test-only helpers for building flat records.

use crate::{
    flatten::{suite_name, FlatTestRecord},
    xemu_version::SemanticVersion,
};

/// A record for release `0.8.<patch>` of `test` on `machine` (a
/// `machine_id_with_renderer` value such as `m1-GL`) with a trimmed average of
/// `value`.
pub(crate) fn record(test: &str, machine: &str, patch: u32, value: f64) -> FlatTestRecord {
    let machine_id = machine
        .strip_suffix("-GL")
        .or_else(|| machine.strip_suffix("-VK"))
        .unwrap_or(machine);
    FlatTestRecord {
        suite: suite_name(test).to_string(),
        test_name: test.to_string(),
        iterations: 2,
        average_us: value,
        average_excluding_max_us: value,
        total_us: value * 2.0,
        min_us: value,
        max_us: value,
        error_plus_us: 0.0,
        error_minus_us: 0.0,
        inner: None,
        xemu_version: format!("xemu-0.8.{patch}-master-abc"),
        xemu_version_obj: SemanticVersion::release(0, 8, patch, "abc"),
        xemu_tag: None,
        renderer: "OPENGL".to_string(),
        iso: None,
        os_system: "Linux".to_string(),
        cpu_manufacturer: "GenuineIntel".to_string(),
        cpu_freq_max: 4000.0,
        gpu_vendor: None,
        gpu_renderer: None,
        gpu_gl_version: None,
        gpu_glsl_version: None,
        machine_id: machine_id.to_string(),
        machine_id_with_renderer: machine.to_string(),
        trend: None,
    }
}
