use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::stats::{linear_fit, round2, trailing_mean};
use super::{observations, yearly_means, GROSS_MONTHLY_MEDIAN, UNIVERSITY, YEAR};
use crate::data::filter::{AllowList, YearBounds};
use crate::data::model::Dataset;
use crate::data::normalize::{normalize_columns, ColumnSpec};
use crate::error::Result;

/// Trailing window of the salary moving average.
pub const MOVING_AVERAGE_WINDOW: usize = 3;

/// Fewest distinct years a university needs to be analysed.
pub const MIN_DATA_POINTS: usize = 2;

/// Filters for [`salary_trend_analysis`]. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendQuery {
    /// Universities to include; `None` or empty means all.
    pub universities: Option<Vec<String>>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
}

/// Salary history and fitted trend for one university.
///
/// All arrays share one length and follow ascending year order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub years: Vec<i64>,
    pub salaries: Vec<f64>,
    pub moving_averages: Vec<f64>,
    pub trend_line: Vec<f64>,
    /// Fitted slope in salary per year, unrounded.
    pub trend_slope: f64,
    pub data_points: usize,
    pub salary_change: f64,
    pub salary_change_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredPeriod {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub universities: BTreeMap<String, TrendRecord>,
    /// Names of the universities in `universities`, sorted.
    pub all_universities: Vec<String>,
    /// Distinct years across the included universities, ascending.
    pub years_range: Vec<i64>,
    /// `None` when nothing survived the filters.
    pub filtered_period: Option<FilteredPeriod>,
}

/// Median salary trend per university.
///
/// Salaries are averaged per `(university, year)` and rounded to cents, then
/// smoothed with a trailing moving average and fitted with a least-squares line.
/// Universities with fewer than [`MIN_DATA_POINTS`] years are left out.
pub fn salary_trend_analysis(dataset: &Dataset, query: &TrendQuery) -> Result<TrendReport> {
    let clean = normalize_columns(
        dataset,
        &[
            ColumnSpec::int(YEAR),
            ColumnSpec::text(UNIVERSITY),
            ColumnSpec::float(GROSS_MONTHLY_MEDIAN),
        ],
    )?;

    let bounds = YearBounds::new(query.start_year, query.end_year);
    let allow = AllowList::new(query.universities.iter().flatten().cloned());

    let obs: Vec<_> = observations(&clean, UNIVERSITY, &[GROSS_MONTHLY_MEDIAN])
        .into_iter()
        .filter(|o| bounds.contains(o.year) && allow.allows(&o.group))
        .collect();

    // BTreeMap order gives ascending years within each university.
    let mut series: BTreeMap<String, Vec<(i64, f64)>> = BTreeMap::new();
    for ((university, year), salary) in yearly_means(&obs) {
        series.entry(university).or_default().push((year, round2(salary)));
    }

    let mut report = TrendReport::default();
    let mut years = BTreeSet::new();

    for (university, points) in series {
        let Some(record) = build_record(&points) else {
            debug!(
                "salary_trend_analysis: skipping '{university}' ({} yearly points)",
                points.len()
            );
            continue;
        };
        years.extend(record.years.iter().copied());
        report.all_universities.push(university.clone());
        report.universities.insert(university, record);
    }

    report.years_range = years.into_iter().collect();
    report.filtered_period = match (report.years_range.first(), report.years_range.last()) {
        (Some(&start), Some(&end)) => Some(FilteredPeriod { start, end }),
        _ => None,
    };

    info!(
        "salary_trend_analysis: {} universities over {} years",
        report.universities.len(),
        report.years_range.len()
    );
    Ok(report)
}

/// `points` must be sorted by year with one entry per year.
fn build_record(points: &[(i64, f64)]) -> Option<TrendRecord> {
    if points.len() < MIN_DATA_POINTS {
        return None;
    }

    let years: Vec<i64> = points.iter().map(|p| p.0).collect();
    let salaries: Vec<f64> = points.iter().map(|p| p.1).collect();

    let moving_averages = trailing_mean(&salaries, MOVING_AVERAGE_WINDOW)
        .into_iter()
        .map(round2)
        .collect();

    let xy: Vec<(f64, f64)> = points.iter().map(|&(y, s)| (y as f64, s)).collect();
    let fit = linear_fit(&xy)?;
    let trend_line = years.iter().map(|&y| round2(fit.predict(y as f64))).collect();

    let first = salaries[0];
    let last = salaries[salaries.len() - 1];
    let salary_change = last - first;
    let salary_change_pct = if first > 0.0 {
        salary_change / first * 100.0
    } else {
        0.0
    };

    Some(TrendRecord {
        data_points: years.len(),
        years,
        salaries,
        moving_averages,
        trend_line,
        trend_slope: fit.slope,
        salary_change: round2(salary_change),
        salary_change_pct: round2(salary_change_pct),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn dataset(rows: &[(i64, &str, CellValue)]) -> Dataset {
        Dataset::from_columns(vec![
            ("year", rows.iter().map(|r| CellValue::Integer(r.0)).collect::<Vec<_>>()),
            ("university", rows.iter().map(|r| CellValue::from(r.1)).collect::<Vec<_>>()),
            ("gross_monthly_median", rows.iter().map(|r| r.2.clone()).collect::<Vec<_>>()),
        ])
        .unwrap()
    }

    fn two_universities() -> Dataset {
        dataset(&[
            (2018, "A", 3000.0.into()),
            (2019, "A", 3200.0.into()),
            (2020, "A", 3400.0.into()),
            (2019, "B", 4000.0.into()),
        ])
    }

    #[test]
    fn universities_with_one_year_are_excluded() {
        let report = salary_trend_analysis(&two_universities(), &TrendQuery::default()).unwrap();
        assert_eq!(report.all_universities, vec!["A".to_string()]);
        assert!(!report.universities.contains_key("B"));

        let a = &report.universities["A"];
        assert!((a.trend_slope - 200.0).abs() < 1e-6);
        assert!((a.salary_change_pct - 13.33).abs() < 1e-9);
        assert_eq!(a.salary_change, 400.0);
        assert_eq!(a.data_points, 3);
        assert_eq!(a.trend_line, vec![3000.0, 3200.0, 3400.0]);
        assert_eq!(report.years_range, vec![2018, 2019, 2020]);
        assert_eq!(
            report.filtered_period,
            Some(FilteredPeriod {
                start: 2018,
                end: 2020
            })
        );
    }

    #[test]
    fn moving_average_of_three_points() {
        let ds = dataset(&[
            (2020, "A", 3300.0.into()),
            (2018, "A", 3000.0.into()),
            (2019, "A", 3100.0.into()),
        ]);
        let report = salary_trend_analysis(&ds, &TrendQuery::default()).unwrap();
        let a = &report.universities["A"];
        assert_eq!(a.years, vec![2018, 2019, 2020]);
        assert_eq!(a.moving_averages, vec![3000.0, 3050.0, round2(9400.0 / 3.0)]);
    }

    #[test]
    fn duplicate_rows_are_averaged_and_rounded() {
        let ds = dataset(&[
            (2018, "A", 3000.0.into()),
            (2018, "A", 3000.015.into()),
            (2019, "A", "3500".into()),
        ]);
        let report = salary_trend_analysis(&ds, &TrendQuery::default()).unwrap();
        let a = &report.universities["A"];
        assert_eq!(a.salaries, vec![3000.01, 3500.0]);
    }

    #[test]
    fn year_bounds_are_applied_independently() {
        let lower = TrendQuery {
            start_year: Some(2019),
            ..Default::default()
        };
        let report = salary_trend_analysis(&two_universities(), &lower).unwrap();
        assert_eq!(report.universities["A"].years, vec![2019, 2020]);

        let upper = TrendQuery {
            end_year: Some(2018),
            ..Default::default()
        };
        let report = salary_trend_analysis(&two_universities(), &upper).unwrap();
        assert!(report.universities.is_empty());
        assert_eq!(report.filtered_period, None);
    }

    #[test]
    fn allow_list_limits_universities() {
        let ds = dataset(&[
            (2018, "A", 3000.0.into()),
            (2019, "A", 3200.0.into()),
            (2018, "C", 2000.0.into()),
            (2019, "C", 1800.0.into()),
        ]);
        let query = TrendQuery {
            universities: Some(vec!["C".into()]),
            ..Default::default()
        };
        let report = salary_trend_analysis(&ds, &query).unwrap();
        assert_eq!(report.all_universities, vec!["C".to_string()]);
        let c = &report.universities["C"];
        assert!((c.trend_slope + 200.0).abs() < 1e-6);
        assert_eq!(c.salary_change_pct, -10.0);

        let empty = TrendQuery {
            universities: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(
            salary_trend_analysis(&ds, &empty).unwrap().universities.len(),
            2
        );
    }

    #[test]
    fn huge_finite_salaries_keep_the_university() {
        let ds = dataset(&[(2018, "A", 1e307.into()), (2019, "A", 1.5e307.into())]);
        let report = salary_trend_analysis(&ds, &TrendQuery::default()).unwrap();
        let a = &report.universities["A"];
        assert_eq!(a.salaries, vec![1e307, 1.5e307]);
        assert!((a.trend_slope - 5e306).abs() <= 5e306 * 1e-12);
        assert!(a.trend_line.iter().all(|v| v.is_finite()));
        assert!(a.moving_averages.iter().all(|v| v.is_finite()));
        assert!((a.salary_change_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_first_salary_gives_zero_pct() {
        let ds = dataset(&[(2018, "A", 0.0.into()), (2019, "A", 100.0.into())]);
        let report = salary_trend_analysis(&ds, &TrendQuery::default()).unwrap();
        assert_eq!(report.universities["A"].salary_change_pct, 0.0);
        assert_eq!(report.universities["A"].salary_change, 100.0);
    }
}
