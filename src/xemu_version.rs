//! Parsing of raw xemu version tags into comparable semantic versions.
//!
//! Tags come in three recognized shapes, tried in order after an exact lookup
//! in the special-case table:
//!
//! - release: `xemu-0.8.5-master-<hash>`
//! - dev / pull request: `xemu-0.8.5-12-g<short hash>-<branch>-<hash>`
//! - fork: `xemu-0.8.5- -<hash>` (blank build/branch token)
//!
//! `compare_name` zero pads every numeric component so that plain string
//! ordering matches numeric ordering within one build type and branch. Ordering
//! across branches or build types is not meaningful.

use std::{collections::HashMap, fmt};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::VersionParseError;

/// Branch name assigned to fork builds, which carry no branch information.
pub const FORK_BRANCH: &str = "unofficial";

static RELEASE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^-]+-v?(\d{1,6})\.(\d{1,6})\.(\d{1,6})-master-([0-9A-Za-z]+)$")
        .expect("release tag pattern is valid")
});

static DEV_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[^-]+-v?(\d{1,6})\.(\d{1,6})\.(\d{1,6})-(\d{1,6})-g([0-9A-Fa-f]+)-([^-\s]+)-([0-9A-Za-z]+)$",
    )
    .expect("dev tag pattern is valid")
});

static FORK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^-]+-v?(\d{1,6})\.(\d{1,6})\.(\d{1,6})-\s*-([0-9A-Za-z]+)$")
        .expect("fork tag pattern is valid")
});

/// Origin of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildType {
    /// Tagged release from the main repository.
    Release,
    /// Development build or pull request artifact.
    DevOrPr,
    /// Build from an unofficial fork.
    Fork,
}

/// Structured decomposition of an xemu version tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
    build: Option<u32>,
    branch: Option<String>,
    git_hash: String,
    build_type: BuildType,
    #[serde(rename = "short")]
    short_name: String,
    #[serde(rename = "compare")]
    compare_name: String,
}

impl SemanticVersion {
    /// A tagged release.
    pub fn release(major: u32, minor: u32, patch: u32, git_hash: impl Into<String>) -> Self {
        Self::from_parts(major, minor, patch, None, None, git_hash, BuildType::Release)
    }

    /// A development or pull request build `build` commits past the last release.
    pub fn dev_or_pr(
        major: u32,
        minor: u32,
        patch: u32,
        build: u32,
        branch: impl Into<String>,
        git_hash: impl Into<String>,
    ) -> Self {
        Self::from_parts(
            major,
            minor,
            patch,
            Some(build),
            Some(branch.into()),
            git_hash,
            BuildType::DevOrPr,
        )
    }

    /// A build from an unofficial fork.
    pub fn fork(major: u32, minor: u32, patch: u32, git_hash: impl Into<String>) -> Self {
        Self::from_parts(
            major,
            minor,
            patch,
            Some(0),
            Some(FORK_BRANCH.to_string()),
            git_hash,
            BuildType::Fork,
        )
    }

    /// Builds a version from its raw parts, deriving both name projections.
    pub fn from_parts(
        major: u32,
        minor: u32,
        patch: u32,
        build: Option<u32>,
        branch: Option<String>,
        git_hash: impl Into<String>,
        build_type: BuildType,
    ) -> Self {
        let git_hash = git_hash.into();
        let (short_name, compare_name) = match build_type {
            BuildType::Release => (
                format!("{major}.{minor}.{patch}"),
                format!("{major:06}.{minor:06}.{patch:06}"),
            ),
            BuildType::DevOrPr => {
                let build = build.unwrap_or(0);
                let branch = branch.as_deref().unwrap_or_default();
                (
                    format!("{major}.{minor}.{patch}-{build}-{branch}"),
                    format!("{major:06}.{minor:06}.{patch:06}.{build:06}-{branch}"),
                )
            }
            BuildType::Fork => {
                let name = format!("fork-{git_hash}");
                (name.clone(), name)
            }
        };

        Self {
            major,
            minor,
            patch,
            build,
            branch,
            git_hash,
            build_type,
            short_name,
            compare_name,
        }
    }

    /// Major version number.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor version number.
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Patch version number.
    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// Commits since the last release; absent for releases.
    pub fn build(&self) -> Option<u32> {
        self.build
    }

    /// Source branch of a dev or PR build; `unofficial` for forks.
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Commit hash; empty for some special-cased tags.
    pub fn git_hash(&self) -> &str {
        &self.git_hash
    }

    /// Which tagging convention the tag followed.
    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    /// Human readable label.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Fixed-width key whose string order matches version order within a
    /// single build type and branch.
    pub fn compare_name(&self) -> &str {
        &self.compare_name
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name)
    }
}

/// Explicit version for a tag that does not follow the tagging convention.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionOverride {
    /// Major version number.
    pub major: u32,
    /// Minor version number.
    pub minor: u32,
    /// Patch version number.
    pub patch: u32,
    /// Commits since the release; set only for dev or PR builds.
    #[serde(default)]
    pub build: Option<u32>,
    /// Source branch; set only for dev or PR builds.
    #[serde(default)]
    pub branch: Option<String>,
    /// Commit hash; empty for some special-cased tags.
    #[serde(default)]
    pub git_hash: String,
    /// Which tagging convention the tag followed.
    pub build_type: BuildType,
}

impl From<VersionOverride> for SemanticVersion {
    fn from(value: VersionOverride) -> Self {
        SemanticVersion::from_parts(
            value.major,
            value.minor,
            value.patch,
            value.build,
            value.branch,
            value.git_hash,
            value.build_type,
        )
    }
}

struct KnownTag {
    tag: &'static str,
    major: u32,
    minor: u32,
    patch: u32,
    git_hash: &'static str,
}

/// Release tags recorded before the `-master-<hash>` suffix was introduced.
const KNOWN_IRREGULAR_TAGS: &[KnownTag] = &[
    KnownTag {
        tag: "xemu-0.8.5-master",
        major: 0,
        minor: 8,
        patch: 5,
        git_hash: "",
    },
    KnownTag {
        tag: "xemu-v0.8.5",
        major: 0,
        minor: 8,
        patch: 5,
        git_hash: "",
    },
];

/// Turns raw version tags into [`SemanticVersion`]s.
#[derive(Debug, Clone)]
pub struct VersionParser {
    special_cases: HashMap<String, SemanticVersion>,
}

impl Default for VersionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionParser {
    /// Parser seeded with the built-in special-case table.
    pub fn new() -> Self {
        let special_cases = KNOWN_IRREGULAR_TAGS
            .iter()
            .map(|known| {
                (
                    known.tag.to_string(),
                    SemanticVersion::release(known.major, known.minor, known.patch, known.git_hash),
                )
            })
            .collect();
        Self { special_cases }
    }

    /// Adds (or replaces) special-case entries.
    pub fn with_overrides<I, S, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<SemanticVersion>,
    {
        self.special_cases.extend(
            overrides
                .into_iter()
                .map(|(tag, version)| (tag.into(), version.into())),
        );
        self
    }

    /// Parses `tag`, failing when no recognized shape matches.
    pub fn parse(&self, tag: &str) -> Result<SemanticVersion, VersionParseError> {
        if let Some(version) = self.special_cases.get(tag) {
            return Ok(version.clone());
        }

        if let Some(caps) = RELEASE_TAG.captures(tag) {
            let (major, minor, patch) = triple(&caps, tag)?;
            return Ok(SemanticVersion::release(major, minor, patch, &caps[4]));
        }

        if let Some(caps) = DEV_TAG.captures(tag) {
            let (major, minor, patch) = triple(&caps, tag)?;
            let build = number(&caps, 4, tag)?;
            return Ok(SemanticVersion::dev_or_pr(
                major,
                minor,
                patch,
                build,
                &caps[6],
                &caps[7],
            ));
        }

        if let Some(caps) = FORK_TAG.captures(tag) {
            let (major, minor, patch) = triple(&caps, tag)?;
            return Ok(SemanticVersion::fork(major, minor, patch, &caps[4]));
        }

        Err(VersionParseError::new(tag))
    }
}

fn triple(caps: &Captures<'_>, tag: &str) -> Result<(u32, u32, u32), VersionParseError> {
    Ok((
        number(caps, 1, tag)?,
        number(caps, 2, tag)?,
        number(caps, 3, tag)?,
    ))
}

fn number(caps: &Captures<'_>, index: usize, tag: &str) -> Result<u32, VersionParseError> {
    caps.get(index)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| VersionParseError::new(tag))
}
