use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Year bounds
// ---------------------------------------------------------------------------

/// Inclusive year window. Each bound is optional and applied on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl YearBounds {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        YearBounds { start, end }
    }

    /// A window matching exactly one year.
    pub fn exact(year: i64) -> Self {
        YearBounds {
            start: Some(year),
            end: Some(year),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, year: i64) -> bool {
        self.start.map_or(true, |s| year >= s) && self.end.map_or(true, |e| year <= e)
    }
}

// ---------------------------------------------------------------------------
// Group allow-list
// ---------------------------------------------------------------------------

/// Set of group names to keep. An empty list means "keep everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    names: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowList {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.contains(name)
    }
}
