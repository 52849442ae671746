//! # Graduate employment analytics
//!
//! Derives three views from a graduate employment survey table (one row per
//! university, degree and year):
//!
//! - [`stability_index`]: mean over standard deviation of each group's
//!   yearly-averaged overall employment rate.
//! - [`university_roi`]: average full-time employment rate times average
//!   median salary, ranked.
//! - [`salary_trend_analysis`]: yearly median salary per university with a
//!   trailing moving average and a least-squares trend line.
//!
//! The engines are pure functions over a borrowed [`Dataset`]. Loading a file
//! (see [`data::loader`]) and holding the snapshot (see [`state`]) are kept
//! separate so callers decide when data is read.

pub mod analytics;
pub mod data;
pub mod error;
pub mod state;

pub use analytics::stability::DEFAULT_GROUP_COLUMN;
pub use analytics::{
    salary_trend_analysis, stability_index, university_roi, GroupStat, RoiQuery, RoiRow,
    StabilityReport, TrendQuery, TrendRecord, TrendReport, YearValue,
};
pub use data::model::{CellValue, Dataset};
pub use error::AnalyticsError;
pub use state::DatasetState;
