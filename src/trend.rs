//! Per-series trend classification across the version history.
//!
//! Records are grouped by (test name, machine + backend). Each group with
//! enough members is ordered by version, a least-squares line is fitted over
//! `(rank, average_us_exmax)` and its slope is compared against a noise floor
//! proportional to the group's own mean latency. Using the rank rather than
//! the version number keeps uneven release gaps from skewing the fit.
//!
//! Version ordering uses `compare_name`, which is only meaningful within one
//! build type and branch. Groups that mix branches are ordered by plain string
//! comparison.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{flatten::FlatTestRecord, observability::log_debug};

/// Classification of one (test, machine) series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TrendLabel {
    /// Latency is trending up.
    #[serde(rename = "W")]
    Worsening,
    /// Latency is trending down.
    #[serde(rename = "I")]
    Improving,
    /// Neither slope exceeds the threshold.
    #[serde(rename = "S")]
    Stable,
    /// Too few data points to fit a trend.
    #[serde(rename = "N")]
    NoTrend,
}

impl TrendLabel {
    /// Human readable name, as opposed to the serialized code.
    pub fn as_str(self) -> &'static str {
        match self {
            TrendLabel::Worsening => "Worsening",
            TrendLabel::Improving => "Improving",
            TrendLabel::Stable => "Stable",
            TrendLabel::NoTrend => "No trend",
        }
    }
}

/// Tuning for the trend classifier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Fraction of the group's mean latency the slope must exceed (per version
    /// step) before a series counts as improving or worsening.
    pub threshold_ratio: f64,
    /// Smallest group that gets a fitted trend.
    pub min_group_size: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: 0.08,
            min_group_size: 3,
        }
    }
}

impl TrendConfig {
    /// Sets [`TrendConfig::threshold_ratio`].
    pub fn threshold_ratio(self, threshold_ratio: f64) -> Self {
        TrendConfig {
            threshold_ratio,
            ..self
        }
    }

    /// Sets [`TrendConfig::min_group_size`].
    pub fn min_group_size(self, min_group_size: usize) -> Self {
        TrendConfig {
            min_group_size,
            ..self
        }
    }
}

/// Labels each (machine, test) series with the direction of its latency across versions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    /// An analyzer with the given tuning.
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// Tuning in effect.
    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Computes one label per record, index-aligned with `records`.
    pub fn classify(&self, records: &[FlatTestRecord]) -> Vec<TrendLabel> {
        let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            groups
                .entry((
                    record.test_name.as_str(),
                    record.machine_id_with_renderer.as_str(),
                ))
                .or_default()
                .push(idx);
        }

        let mut labels = vec![TrendLabel::NoTrend; records.len()];
        for (_, mut members) in groups {
            if members.len() < self.config.min_group_size {
                continue;
            }
            members.sort_by(|a, b| {
                records[*a]
                    .xemu_version_obj
                    .compare_name()
                    .cmp(records[*b].xemu_version_obj.compare_name())
            });
            let series: Vec<f64> = members
                .iter()
                .map(|idx| records[*idx].average_excluding_max_us)
                .collect();
            let label = self.classify_series(&series);
            for idx in members {
                labels[idx] = label;
            }
        }
        labels
    }

    /// Attaches trend labels to `records`.
    pub fn annotate(&self, records: &mut [FlatTestRecord]) {
        let labels = self.classify(records);
        let mut counts: BTreeMap<TrendLabel, usize> = BTreeMap::new();
        for (record, label) in records.iter_mut().zip(labels) {
            record.trend = Some(label);
            *counts.entry(label).or_default() += 1;
        }
        log_debug!(
            component = "trend",
            event = "trends_annotated",
            records = records.len(),
            counts = ?counts,
        );
    }

    /// Labels a version-ordered series of latencies.
    pub fn classify_series(&self, series: &[f64]) -> TrendLabel {
        if series.len() < self.config.min_group_size {
            return TrendLabel::NoTrend;
        }

        let points: Vec<(f64, f64)> = series
            .iter()
            .enumerate()
            .map(|(rank, y)| (rank as f64, *y))
            .collect();
        let slope = linear_slope(&points);
        let mean = series.iter().sum::<f64>() / series.len() as f64;
        let threshold = mean * self.config.threshold_ratio;

        if slope > threshold {
            TrendLabel::Worsening
        } else if slope < -threshold {
            TrendLabel::Improving
        } else {
            TrendLabel::Stable
        }
    }
}

/// Least-squares slope of `points`; 0 for fewer than two points or when all x
/// are equal.
pub fn linear_slope(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_xx) = points.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sxx), (x, y)| (sx + x, sy + y, sxy + x * y, sxx + x * x),
    );
    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::record;

    #[test]
    fn slope_of_line() {
        assert_eq!(linear_slope(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]), 2.0);
        assert_eq!(linear_slope(&[(0.0, 5.0)]), 0.0);
        assert_eq!(linear_slope(&[]), 0.0);
        assert_eq!(linear_slope(&[(1.0, 1.0), (1.0, 9.0)]), 0.0);
    }

    #[test]
    fn series_labels() {
        let analyzer = TrendAnalyzer::default();
        assert_eq!(analyzer.classify_series(&[100.0, 120.0, 140.0]), TrendLabel::Worsening);
        assert_eq!(analyzer.classify_series(&[140.0, 120.0, 100.0]), TrendLabel::Improving);
        assert_eq!(analyzer.classify_series(&[100.0, 100.0, 100.0]), TrendLabel::Stable);
        assert_eq!(analyzer.classify_series(&[100.0, 200.0]), TrendLabel::NoTrend);
        // Slope 5 against a threshold of 8 (8% of 100).
        assert_eq!(analyzer.classify_series(&[95.0, 100.0, 105.0]), TrendLabel::Stable);
    }

    #[test]
    fn slope_equal_to_threshold_is_stable() {
        let analyzer = TrendAnalyzer::new(TrendConfig::default().threshold_ratio(0.5));
        // Mean 2, threshold 1, slope exactly 1.
        assert_eq!(analyzer.classify_series(&[1.0, 2.0, 3.0]), TrendLabel::Stable);
        assert_eq!(analyzer.classify_series(&[3.0, 2.0, 1.0]), TrendLabel::Stable);
    }

    #[test]
    fn groups_by_test_and_machine_and_sorts_by_version() {
        // Input order is scrambled; version order is 0.8.1 < 0.8.2 < 0.8.10.
        let records = vec![
            record("a", "m1-GL", 10, 140.0),
            record("a", "m1-GL", 1, 100.0),
            record("a", "m2-GL", 1, 50.0),
            record("a", "m1-GL", 2, 120.0),
            record("b", "m1-GL", 1, 10.0),
            record("b", "m1-GL", 2, 10.0),
            record("b", "m1-GL", 3, 10.0),
        ];
        let labels = TrendAnalyzer::default().classify(&records);
        assert_eq!(
            labels,
            vec![
                TrendLabel::Worsening,
                TrendLabel::Worsening,
                TrendLabel::NoTrend,
                TrendLabel::Worsening,
                TrendLabel::Stable,
                TrendLabel::Stable,
                TrendLabel::Stable,
            ]
        );
    }

    #[test]
    fn annotate_sets_every_record() {
        let mut records = vec![
            record("a", "m1-GL", 3, 100.0),
            record("a", "m1-GL", 2, 120.0),
            record("a", "m1-GL", 1, 140.0),
            record("c", "m1-GL", 1, 1.0),
        ];
        TrendAnalyzer::default().annotate(&mut records);
        let trends: Vec<_> = records.iter().map(|r| r.trend).collect();
        assert_eq!(
            trends,
            vec![
                Some(TrendLabel::Improving),
                Some(TrendLabel::Improving),
                Some(TrendLabel::Improving),
                Some(TrendLabel::NoTrend),
            ]
        );
        let json = serde_json::to_value(&records[3]).unwrap();
        assert_eq!(json["trend"], "N");
    }
}
