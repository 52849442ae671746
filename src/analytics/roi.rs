use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use super::stats::{mean, round2};
use super::{observations, EMPLOYMENT_RATE_FT_PERM, GROSS_MONTHLY_MEDIAN, UNIVERSITY, YEAR};
use crate::data::filter::YearBounds;
use crate::data::model::Dataset;
use crate::data::normalize::{normalize_columns, ColumnSpec};
use crate::error::Result;

/// Year filter for [`university_roi`].
///
/// `year` wins when set. Otherwise `start_year` and `end_year` each bound the
/// window on their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiQuery {
    pub year: Option<i64>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
}

impl RoiQuery {
    pub fn for_year(year: i64) -> Self {
        RoiQuery {
            year: Some(year),
            ..Default::default()
        }
    }

    pub fn between(start_year: Option<i64>, end_year: Option<i64>) -> Self {
        RoiQuery {
            year: None,
            start_year,
            end_year,
        }
    }

    fn bounds(&self) -> YearBounds {
        match self.year {
            Some(y) => YearBounds::exact(y),
            None => YearBounds::new(self.start_year, self.end_year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiRow {
    pub university: String,
    pub avg_ft_employment_rate: f64,
    pub avg_median_salary: f64,
    /// `avg_ft_employment_rate * avg_median_salary`, both already rounded.
    pub roi_score: f64,
}

/// Rank universities by the ROI proxy, highest first.
pub fn university_roi(dataset: &Dataset, query: &RoiQuery) -> Result<Vec<RoiRow>> {
    let clean = normalize_columns(
        dataset,
        &[
            ColumnSpec::int(YEAR),
            ColumnSpec::text(UNIVERSITY),
            ColumnSpec::float(EMPLOYMENT_RATE_FT_PERM),
            ColumnSpec::float(GROSS_MONTHLY_MEDIAN),
        ],
    )?;

    let bounds = query.bounds();
    let mut per_uni: BTreeMap<String, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for o in observations(&clean, UNIVERSITY, &[EMPLOYMENT_RATE_FT_PERM, GROSS_MONTHLY_MEDIAN]) {
        if !bounds.contains(o.year) {
            continue;
        }
        let (rates, salaries) = per_uni.entry(o.group).or_default();
        rates.push(o.values[0]);
        salaries.push(o.values[1]);
    }

    let mut rows: Vec<RoiRow> = per_uni
        .into_iter()
        .filter_map(|(university, (rates, salaries))| {
            let rate = round2(mean(&rates)?);
            let salary = round2(mean(&salaries)?);
            let score = round2(rate * salary);
            score.is_finite().then_some(RoiRow {
                university,
                avg_ft_employment_rate: rate,
                avg_median_salary: salary,
                roi_score: score,
            })
        })
        .collect();

    // Stable sort keeps name order among equal scores.
    rows.sort_by(|a, b| b.roi_score.partial_cmp(&a.roi_score).unwrap_or(Ordering::Equal));

    info!("university_roi: {} universities ranked", rows.len());
    Ok(rows)
}
