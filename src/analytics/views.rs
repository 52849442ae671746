//! Presentation-ready views derived from a [`StabilityReport`].
//!
//! These shape engine output for charting; they never recompute statistics.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::stability::{GroupStat, StabilityReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGroup {
    /// 1-based.
    pub rank: usize,
    pub group: String,
    pub stability_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanStdPoint {
    pub group: String,
    pub mean: f64,
    pub std: f64,
}

/// A group's yearly values aligned to a shared year axis; gaps stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub group: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtremeSeries {
    pub years: Vec<i64>,
    /// Highest stability index first.
    pub top: Vec<AlignedSeries>,
    /// Lowest stability index first.
    pub bottom: Vec<AlignedSeries>,
}

/// Groups with a defined index, descending; ties broken by name.
fn indexed_desc(stats: &[GroupStat]) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = stats
        .iter()
        .filter_map(|s| Some((s.group.as_str(), s.stability_index?)))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked
}

pub fn stability_ranking(stats: &[GroupStat]) -> Vec<RankedGroup> {
    indexed_desc(stats)
        .into_iter()
        .enumerate()
        .map(|(i, (group, stability_index))| RankedGroup {
            rank: i + 1,
            group: group.to_string(),
            stability_index,
        })
        .collect()
}

pub fn mean_std_points(stats: &[GroupStat]) -> Vec<MeanStdPoint> {
    stats
        .iter()
        .filter_map(|s| {
            Some(MeanStdPoint {
                group: s.group.clone(),
                mean: s.mean?,
                std: s.std?,
            })
        })
        .collect()
}

/// Yearly series for the `n` most and `n` least stable groups.
///
/// With fewer than `2n` indexed groups the two lists may share members.
pub fn extreme_series(report: &StabilityReport, n: usize) -> ExtremeSeries {
    let ranked = indexed_desc(&report.group_stats);

    let mut by_group: BTreeMap<&str, BTreeMap<i64, f64>> = BTreeMap::new();
    for p in &report.year_series {
        by_group.entry(p.group.as_str()).or_default().insert(p.year, p.value);
    }

    let align = |group: &str| AlignedSeries {
        group: group.to_string(),
        values: report
            .years
            .iter()
            .map(|y| by_group.get(group).and_then(|m| m.get(y)).copied())
            .collect(),
    };

    ExtremeSeries {
        years: report.years.clone(),
        top: ranked.iter().take(n).map(|&(g, _)| align(g)).collect(),
        bottom: ranked.iter().rev().take(n).map(|&(g, _)| align(g)).collect(),
    }
}
