//! Version ranking by normalized performance.
//!
//! Every record's trimmed average is divided by the mean trimmed average of its
//! (machine, suite, test) group, so each test contributes on the same scale
//! regardless of its absolute cost. Versions are then ranked by the mean of
//! those ratios; lower is faster.

use std::{collections::HashMap, fmt::Write as _};

use itertools::Itertools;
use serde::Serialize;

use crate::{flatten::FlatTestRecord, observability::log_warn};

/// Relative performance of one version; lower is faster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionRank {
    /// Raw version tag.
    pub xemu_version: String,
    /// Mean normalized performance across all records of this version.
    pub normalized_perf: f64,
    /// Number of records that contributed.
    pub samples: usize,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Ranks versions best (lowest normalized time) first. Ties keep version tag
/// order.
pub fn rank_versions(records: &[FlatTestRecord]) -> Vec<VersionRank> {
    let mut baselines: HashMap<(&str, &str, &str), Mean> = HashMap::new();
    for record in records {
        baselines
            .entry((
                record.machine_id.as_str(),
                record.suite.as_str(),
                record.test_name.as_str(),
            ))
            .or_default()
            .push(record.average_excluding_max_us);
    }

    let mut per_version: HashMap<&str, Mean> = HashMap::new();
    let mut skipped = 0usize;
    for record in records {
        let baseline = baselines[&(
            record.machine_id.as_str(),
            record.suite.as_str(),
            record.test_name.as_str(),
        )]
            .value();
        if baseline == 0.0 {
            skipped += 1;
            continue;
        }
        per_version
            .entry(record.xemu_version.as_str())
            .or_default()
            .push(record.average_excluding_max_us / baseline);
    }

    if skipped > 0 {
        log_warn!(
            component = "rank",
            event = "zero_baseline_skipped",
            records = skipped,
        );
    }

    per_version
        .into_iter()
        .map(|(version, mean)| VersionRank {
            xemu_version: version.to_string(),
            normalized_perf: mean.value(),
            samples: mean.count,
        })
        .sorted_by(|a, b| {
            a.normalized_perf
                .total_cmp(&b.normalized_perf)
                .then_with(|| a.xemu_version.cmp(&b.xemu_version))
        })
        .collect_vec()
}

/// Plain-text table of a ranking.
pub fn render_ranking(ranking: &[VersionRank]) -> String {
    let width = ranking
        .iter()
        .map(|r| r.xemu_version.len())
        .chain(std::iter::once("xemu_version".len()))
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  normalized_perf  samples", "xemu_version");
    for rank in ranking {
        let _ = writeln!(
            out,
            "{:<width$}  {:>15.6}  {:>7}",
            rank.xemu_version, rank.normalized_perf, rank.samples
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::record;

    #[test]
    fn normalizes_per_machine_and_test() {
        // Test "S::a" is ten times more expensive than "S::b"; both get 1.0 as
        // their own baseline scale.
        let records = vec![
            record("S::a", "m1-GL", 1, 1000.0),
            record("S::a", "m1-GL", 2, 3000.0),
            record("S::b", "m1-GL", 1, 100.0),
            record("S::b", "m1-GL", 2, 300.0),
        ];
        let ranking = rank_versions(&records);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].xemu_version, "xemu-0.8.1-master-abc");
        assert_eq!(ranking[0].normalized_perf, 0.5);
        assert_eq!(ranking[0].samples, 2);
        assert_eq!(ranking[1].xemu_version, "xemu-0.8.2-master-abc");
        assert_eq!(ranking[1].normalized_perf, 1.5);
    }

    #[test]
    fn backends_share_machine_baseline() {
        // machine_id drops the backend, so GL and VK runs normalize together.
        let records = vec![
            record("S::a", "m1-GL", 1, 100.0),
            record("S::a", "m1-VK", 2, 300.0),
        ];
        let ranking = rank_versions(&records);
        assert_eq!(ranking[0].normalized_perf, 0.5);
        assert_eq!(ranking[1].normalized_perf, 1.5);
    }

    #[test]
    fn skips_zero_baselines() {
        let records = vec![record("S::a", "m1-GL", 1, 0.0), record("S::b", "m1-GL", 1, 5.0)];
        let ranking = rank_versions(&records);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].samples, 1);
        assert_eq!(ranking[0].normalized_perf, 1.0);
    }

    #[test]
    fn renders_table() {
        let table = render_ranking(&[VersionRank {
            xemu_version: "xemu-0.8.5-master-abc".to_string(),
            normalized_perf: 0.25,
            samples: 4,
        }]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("xemu_version"));
        assert!(lines[1].starts_with("xemu-0.8.5-master-abc"));
        assert!(lines[1].contains("0.250000"));
    }
}
