//! Discovery and decoding of result files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    document::{GpuInfo, RawRunDocument},
    error::{Error, MalformedInputError, Result},
    machine::MachineIdentity,
    observability::{log_debug, log_info},
};

/// A decoded result document together with what its file name tells us.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRun {
    /// File name (or label) the document came from, used in error reports.
    pub source_name: String,
    /// Machine and backend taken from the file name.
    pub identity: MachineIdentity,
    /// Driver strings parsed from `xemu_machine_info`.
    pub gpu: GpuInfo,
    /// The decoded document.
    pub document: RawRunDocument,
}

impl LoadedRun {
    /// Decodes one result document. `file_name` must carry the backend suffix,
    /// e.g. `f00dcafe-GL.json`.
    pub fn from_json(file_name: &str, content: &str) -> Result<Self, MalformedInputError> {
        let identity = MachineIdentity::from_file_name(file_name)?;
        let document: RawRunDocument = serde_json::from_str(content)
            .map_err(|err| MalformedInputError::new(file_name, err.to_string()))?;
        let gpu = document
            .xemu_machine_info
            .as_deref()
            .map(GpuInfo::parse)
            .unwrap_or_default();

        Ok(Self {
            source_name: file_name.to_string(),
            identity,
            gpu,
            document,
        })
    }
}

/// Loads every `*.json` file below each of `results_dirs`.
///
/// Files are visited in sorted path order per directory, so the returned runs
/// are stable across invocations. Any unreadable or malformed file aborts the
/// load.
pub fn load_results<P: AsRef<Path>>(results_dirs: &[P]) -> Result<Vec<LoadedRun>> {
    let mut runs = Vec::new();
    for dir in results_dirs {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::MissingResultsDir(dir.to_path_buf()));
        }

        for path in find_result_files(dir)? {
            let content = fs::read_to_string(&path).map_err(|err| Error::io(&path, err))?;
            let file_name = path
                .file_name()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    MalformedInputError::new(path.display().to_string(), "non UTF-8 file name")
                })?;
            let mut run = LoadedRun::from_json(file_name, &content).map_err(|mut err| {
                err.source_name = path.display().to_string();
                err
            })?;
            run.source_name = path.display().to_string();
            log_debug!(
                component = "loader",
                event = "result_loaded",
                path = %path.display(),
                machine = %run.identity.machine_id_with_renderer,
                tests = run.document.results.len(),
            );
            runs.push(run);
        }
    }

    log_info!(component = "loader", event = "results_loaded", runs = runs.len());
    Ok(runs)
}

/// Recursively collects `*.json` paths below `root`, sorted.
pub fn find_result_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let listing = fs::read_dir(&dir).map_err(|err| Error::io(&dir, err))?;
        for entry in listing {
            let path = entry.map_err(|err| Error::io(&dir, err))?.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
