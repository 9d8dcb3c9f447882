mod support;

use std::fs;

use serde_json::Value;
use tempfile::TempDir;
use xemu_perf_report::{clean::CleanSummary, AnalysisConfig};

use crate::support::{result_doc, write};

#[test]
fn rewrites_only_files_with_stripped_tests() {
    let dir = TempDir::new().unwrap();
    let dirty = result_doc(
        "xemu-0.8.1-master-aaa",
        &[
            ("High vertex count::MixedVtxCount-10", 5.0),
            ("High vertex count::Fixed", 5.0),
        ],
    );
    let pristine = result_doc("xemu-0.8.1-master-aaa", &[("Lighting::a", 5.0)]);
    write(dir.path(), "run1/dirty-GL.json", &dirty);
    write(dir.path(), "run1/pristine-VK.json", &pristine);

    let cleaner = AnalysisConfig::default().cleaner().unwrap();
    let summary = cleaner.clean_dirs(&[dir.path()]).unwrap();
    assert_eq!(
        summary,
        CleanSummary {
            files_scanned: 2,
            files_updated: 1,
            tests_removed: 1,
        }
    );

    let rewritten = fs::read_to_string(dir.path().join("run1/dirty-GL.json")).unwrap();
    let cleaned: Value = serde_json::from_str(&rewritten).unwrap();
    let names: Vec<_> = cleaned["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["High vertex count::Fixed"]);
    assert_eq!(cleaned["machine_info"]["os_system"], "Linux");

    // Keys keep their on-disk order so a rewrite only shows the removed entries.
    let top_level: Vec<_> = cleaned.as_object().unwrap().keys().cloned().collect();
    assert_eq!(
        top_level,
        vec![
            "xemu_version",
            "renderer",
            "iso",
            "machine_info",
            "xemu_machine_info",
            "results",
        ]
    );
    let result_keys: Vec<_> = cleaned["results"][0]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(
        result_keys,
        vec!["name", "iterations", "total_us", "average_us", "min_us", "max_us", "raw_results"]
    );
    assert!(rewritten.find("\"xemu_version\"") < rewritten.find("\"machine_info\""));

    // Untouched files keep their exact bytes.
    assert_eq!(
        fs::read_to_string(dir.path().join("run1/pristine-VK.json")).unwrap(),
        pristine
    );

    // A second pass finds nothing left to do.
    let again = cleaner.clean_dirs(&[dir.path()]).unwrap();
    assert_eq!(again.files_updated, 0);
}
