#![allow(dead_code)]

use std::{fs, path::Path};

use indoc::formatdoc;

/// A result document for `version` with one entry per `(name, average_us)`.
/// Every entry has five iterations whose slowest sample is twice the average.
pub fn result_doc(version: &str, tests: &[(&str, f64)]) -> String {
    let results = tests
        .iter()
        .map(|(name, avg)| {
            let max = avg * 2.0;
            let total = avg * 5.0;
            format!(
                r#"{{"name": "{name}", "iterations": 5, "total_us": {total}, "average_us": {avg}, "min_us": {min}, "max_us": {max}, "raw_results": [{min}, {avg}, {avg}, {avg}, {max}]}}"#,
                min = avg / 2.0,
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");
    formatdoc!(
        r#"
        {{
            "xemu_version": "{version}",
            "renderer": "OPENGL",
            "iso": "xemu_perf_tests.iso",
            "machine_info": {{
                "os_system": "Linux",
                "cpu_manufacturer": "AuthenticAMD",
                "cpu_freq_max": 4672.0
            }},
            "xemu_machine_info": "GL_VENDOR: AMD\nGL_RENDERER: AMD Radeon (TM) Graphics\nGL_VERSION: 4.6",
            "results": [
                {results}
            ]
        }}
        "#,
        version = version,
        results = results,
    )
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
