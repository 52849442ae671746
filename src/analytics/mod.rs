/// Analytics core: three engines over a normalized survey dataset.
///
/// ```text
///   Dataset ──► normalize ──► group by (key, year) ──► reduce
///                                   │
///            ┌──────────────────────┼──────────────────────┐
///            ▼                      ▼                      ▼
///      stability_index        university_roi        salary_trend_analysis
/// ```
///
/// All engines are pure: they borrow the dataset, never mutate it, and return
/// serializable structures. They fail only when required columns are absent.

pub mod roi;
pub mod stability;
pub mod stats;
pub mod trend;
pub mod views;

use std::collections::BTreeMap;

use crate::data::model::Dataset;
use crate::data::normalize::parse_text;

pub use roi::{university_roi, RoiQuery, RoiRow};
pub use stability::{stability_index, GroupStat, StabilityReport, YearValue};
pub use trend::{salary_trend_analysis, FilteredPeriod, TrendQuery, TrendRecord, TrendReport};

// Survey column names.
pub const YEAR: &str = "year";
pub const UNIVERSITY: &str = "university";
pub const EMPLOYMENT_RATE_OVERALL: &str = "employment_rate_overall";
pub const EMPLOYMENT_RATE_FT_PERM: &str = "employment_rate_ft_perm";
pub const GROSS_MONTHLY_MEDIAN: &str = "gross_monthly_median";

/// One clean observation pulled out of a normalized dataset.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Observation {
    pub group: String,
    pub year: i64,
    pub values: Vec<f64>,
}

/// Read `(group, year, metrics...)` from every row of a normalized dataset.
///
/// Rows that somehow fail to read are skipped rather than reported; the
/// normalizer has already dropped anything incomplete.
pub(crate) fn observations(clean: &Dataset, group_col: &str, metrics: &[&str]) -> Vec<Observation> {
    let (Some(groups), Some(years)) = (clean.column(group_col), clean.column(YEAR)) else {
        return Vec::new();
    };
    let metric_cols: Option<Vec<_>> = metrics.iter().map(|m| clean.column(m)).collect();
    let Some(metric_cols) = metric_cols else {
        return Vec::new();
    };

    (0..clean.len())
        .filter_map(|row| {
            let group = parse_text(groups.get(row)?)?;
            let year = years.get(row)?.as_i64()?;
            let values = metric_cols
                .iter()
                .map(|col| col.get(row)?.as_f64())
                .collect::<Option<Vec<f64>>>()?;
            Some(Observation {
                group,
                year,
                values,
            })
        })
        .collect()
}

/// Average the first metric of each observation within every `(group, year)`
/// pair. Keys come back sorted by group then year.
pub(crate) fn yearly_means(obs: &[Observation]) -> BTreeMap<(String, i64), f64> {
    let mut buckets: BTreeMap<(String, i64), Vec<f64>> = BTreeMap::new();
    for o in obs {
        if let Some(&v) = o.values.first() {
            buckets.entry((o.group.clone(), o.year)).or_default().push(v);
        }
    }
    buckets
        .into_iter()
        .filter_map(|(key, vals)| stats::mean(&vals).map(|m| (key, m)))
        .collect()
}
