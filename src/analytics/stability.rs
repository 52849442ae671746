use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::stats::{guarded_ratio, mean, sample_std};
use super::{observations, yearly_means, EMPLOYMENT_RATE_OVERALL, UNIVERSITY, YEAR};
use crate::data::model::Dataset;
use crate::data::normalize::{normalize_columns, ColumnSpec};
use crate::error::Result;

/// Default grouping column for [`stability_index`].
pub const DEFAULT_GROUP_COLUMN: &str = UNIVERSITY;

/// Dispersion-normalized summary of one group's yearly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub group: String,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    /// `mean / std`; `None` whenever `std` is absent or zero.
    pub stability_index: Option<f64>,
}

/// One yearly-averaged figure for a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    pub group: String,
    pub year: i64,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    /// Sorted by group name.
    pub group_stats: Vec<GroupStat>,
    /// Sorted by group, then year. At most one entry per pair.
    pub year_series: Vec<YearValue>,
    /// Distinct years across all groups, ascending.
    pub years: Vec<i64>,
}

/// Employability stability per group.
///
/// `employment_rate_overall` is first averaged per `(group, year)` so that a
/// group with many degree programmes counts once per year. The mean and sample
/// standard deviation of that yearly series give `stability_index = mean / std`.
pub fn stability_index(dataset: &Dataset, group_column: &str) -> Result<StabilityReport> {
    let clean = normalize_columns(
        dataset,
        &[
            ColumnSpec::text(group_column),
            ColumnSpec::int(YEAR),
            ColumnSpec::float(EMPLOYMENT_RATE_OVERALL),
        ],
    )?;

    let obs = observations(&clean, group_column, &[EMPLOYMENT_RATE_OVERALL]);
    let yearly = yearly_means(&obs);

    let mut per_group: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    let mut years = BTreeSet::new();
    let mut year_series = Vec::with_capacity(yearly.len());

    for ((group, year), value) in &yearly {
        per_group.entry(group.as_str()).or_default().push(*value);
        years.insert(*year);
        year_series.push(YearValue {
            group: group.clone(),
            year: *year,
            value: *value,
        });
    }

    let group_stats: Vec<GroupStat> = per_group
        .into_iter()
        .map(|(group, series)| summarize(group, &series))
        .collect();

    info!(
        "stability_index: {} groups by '{group_column}' over {} years",
        group_stats.len(),
        years.len()
    );

    Ok(StabilityReport {
        group_stats,
        year_series,
        years: years.into_iter().collect(),
    })
}

fn summarize(group: &str, series: &[f64]) -> GroupStat {
    let m = mean(series);
    let sd = sample_std(series);
    let stability_index = match (m, sd) {
        (Some(m), Some(sd)) => guarded_ratio(m, sd),
        _ => None,
    };
    if stability_index.is_none() {
        debug!(
            "stability_index: group '{group}' has no defined index ({} yearly points)",
            series.len()
        );
    }
    GroupStat {
        group: group.to_string(),
        mean: m,
        std: sd,
        stability_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::error::AnalyticsError;

    fn dataset(rows: &[(&str, i64, CellValue)]) -> Dataset {
        Dataset::from_columns(vec![
            (
                "university",
                rows.iter().map(|r| CellValue::from(r.0)).collect::<Vec<_>>(),
            ),
            ("year", rows.iter().map(|r| CellValue::Integer(r.1)).collect::<Vec<_>>()),
            (
                "employment_rate_overall",
                rows.iter().map(|r| r.2.clone()).collect::<Vec<_>>(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn index_is_mean_over_sample_std_of_yearly_means() {
        let ds = dataset(&[
            ("A", 2018, 80.0.into()),
            ("A", 2018, 90.0.into()), // averages to 85 with the row above
            ("A", 2019, 90.0.into()),
            ("A", 2020, 95.0.into()),
        ]);
        let report = stability_index(&ds, DEFAULT_GROUP_COLUMN).unwrap();
        assert_eq!(report.years, vec![2018, 2019, 2020]);
        assert_eq!(report.year_series.len(), 3);
        assert_eq!(report.year_series[0].value, 85.0);

        let stat = &report.group_stats[0];
        assert_eq!(stat.mean, Some(90.0));
        assert!((stat.std.unwrap() - 5.0).abs() < 1e-9);
        assert!((stat.stability_index.unwrap() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn zero_or_undefined_std_yields_null_index() {
        let ds = dataset(&[
            ("Flat", 2018, 90.0.into()),
            ("Flat", 2019, 90.0.into()),
            ("Single", 2019, 70.0.into()),
        ]);
        let report = stability_index(&ds, "university").unwrap();
        let flat = &report.group_stats[0];
        assert_eq!(flat.group, "Flat");
        assert_eq!(flat.std, Some(0.0));
        assert_eq!(flat.stability_index, None);

        let single = &report.group_stats[1];
        assert_eq!(single.mean, Some(70.0));
        assert_eq!(single.std, None);
        assert_eq!(single.stability_index, None);
    }

    #[test]
    fn constant_inexact_rate_has_zero_std_and_no_index() {
        let ds = dataset(&[
            ("A", 2018, 3.3.into()),
            ("A", 2019, 3.3.into()),
            ("A", 2020, 3.3.into()),
            ("B", 2018, 0.1.into()),
            ("B", 2019, 0.1.into()),
            ("B", 2020, 0.1.into()),
        ]);
        let report = stability_index(&ds, "university").unwrap();
        for stat in &report.group_stats {
            assert_eq!(stat.std, Some(0.0), "group {}", stat.group);
            assert_eq!(stat.stability_index, None, "group {}", stat.group);
        }
        assert_eq!(report.group_stats[0].mean, Some(3.3));
    }

    #[test]
    fn non_numeric_metric_rows_are_excluded_not_zeroed() {
        let ds = dataset(&[
            ("A", 2018, 80.0.into()),
            ("A", 2019, "NA".into()),
            ("A", 2019, 90.0.into()),
        ]);
        let report = stability_index(&ds, "university").unwrap();
        let v2019 = report
            .year_series
            .iter()
            .find(|p| p.year == 2019)
            .unwrap();
        assert_eq!(v2019.value, 90.0);
        assert_eq!(report.group_stats[0].mean, Some(85.0));
    }

    #[test]
    fn missing_columns_error_names_every_column() {
        let ds = Dataset::from_columns(vec![("university", vec![CellValue::from("A")])]).unwrap();
        let err = stability_index(&ds, "degree").unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::MissingColumns {
                missing: vec![
                    "degree".into(),
                    "year".into(),
                    "employment_rate_overall".into()
                ]
            }
        );
    }

    #[test]
    fn empty_dataset_gives_empty_report() {
        let ds = dataset(&[]);
        assert_eq!(
            stability_index(&ds, "university").unwrap(),
            StabilityReport::default()
        );
    }
}
