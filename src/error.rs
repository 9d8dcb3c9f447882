use std::path::PathBuf;

use thiserror::Error;

/// A version tag that matched none of the recognized shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized xemu version tag '{tag}'")]
pub struct VersionParseError {
    /// The offending tag, verbatim.
    pub tag: String,
}

impl VersionParseError {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// A result document that is missing required data or cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed result document {source_name}: {detail}")]
pub struct MalformedInputError {
    /// File name (or caller supplied label) of the offending document.
    pub source_name: String,
    /// What was wrong with it.
    pub detail: String,
}

impl MalformedInputError {
    pub(crate) fn new(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }
}

/// Crate level error.
#[derive(Debug, Error)]
pub enum Error {
    /// A version tag failed to parse outside of any result document.
    #[error(transparent)]
    Version(#[from] VersionParseError),
    /// A result document carries a version tag that failed to parse.
    #[error("{source_name}: {source}")]
    DocumentVersion {
        /// File name (or label) of the document holding the tag.
        source_name: String,
        /// The parse failure, including the tag.
        #[source]
        source: VersionParseError,
    },
    /// A result document could not be decoded.
    #[error(transparent)]
    Malformed(#[from] MalformedInputError),
    /// A results directory passed by the caller does not exist.
    #[error("results directory '{}' does not exist", .0.display())]
    MissingResultsDir(PathBuf),
    /// Reading or writing a file failed.
    #[error("io error on {}: {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },
    /// Encoding or decoding JSON failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The YAML configuration could not be decoded.
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
    /// A strip pattern is not a valid regex.
    #[error("invalid test strip pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias defaulting to the crate [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
