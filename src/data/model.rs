use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::error::{AnalyticsError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell in a survey column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a survey extract arrives in.
///
/// Loaders keep whatever they find; turning cells into numbers is the
/// normalizer's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

impl CellValue {
    /// Numeric view of an already-typed cell. No text parsing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Key used when collecting distinct values; floats compare by bit pattern.
    fn distinct_key(&self) -> String {
        match self {
            CellValue::Text(s) => format!("t:{s}"),
            CellValue::Integer(i) => format!("i:{i}"),
            CellValue::Float(v) => format!("f:{:016x}", v.to_bits()),
            CellValue::Bool(b) => format!("b:{b}"),
            CellValue::Null => "n".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded survey table
// ---------------------------------------------------------------------------

/// A rectangular, column-oriented table.
///
/// Engines only ever borrow a `Dataset`; every transformation returns a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Column names in source order.
    column_names: Vec<String>,
    /// column_name → cells, each exactly `n_rows` long.
    columns: BTreeMap<String, Vec<CellValue>>,
    n_rows: usize,
}

impl Dataset {
    /// Build from `(name, cells)` pairs. Every column must have the same length.
    ///
    /// A repeated column name replaces the earlier one but keeps its position.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<CellValue>)>,
        S: Into<String>,
    {
        let mut column_names = Vec::new();
        let mut map = BTreeMap::new();
        let mut n_rows = None;

        for (name, cells) in columns {
            let name = name.into();
            let expected = *n_rows.get_or_insert(cells.len());
            if cells.len() != expected {
                return Err(AnalyticsError::RaggedColumn {
                    column: name,
                    expected,
                    found: cells.len(),
                });
            }
            if map.insert(name.clone(), cells).is_none() {
                column_names.push(name);
            }
        }

        Ok(Dataset {
            column_names,
            columns: map,
            n_rows: n_rows.unwrap_or(0),
        })
    }

    /// Build from row records (column_name → value). Columns absent from a
    /// record are filled with `Null`. Column order follows first appearance.
    pub fn from_records(records: Vec<BTreeMap<String, CellValue>>) -> Self {
        Self::from_records_ordered(Vec::new(), records)
    }

    /// Like [`Dataset::from_records`], but `header` fixes the leading column
    /// order (e.g. the CSV header row).
    pub fn from_records_ordered(
        header: Vec<String>,
        records: Vec<BTreeMap<String, CellValue>>,
    ) -> Self {
        let mut column_names = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let names_from_records = records.iter().flat_map(|rec| rec.keys().cloned());
        for name in header.into_iter().chain(names_from_records) {
            if seen.insert(name.clone()) {
                column_names.push(name);
            }
        }

        let n_rows = records.len();
        let mut columns: BTreeMap<String, Vec<CellValue>> = column_names
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(n_rows)))
            .collect();

        for mut rec in records {
            for (name, cells) in columns.iter_mut() {
                cells.push(rec.remove(name).unwrap_or(CellValue::Null));
            }
        }

        Dataset {
            column_names,
            columns,
            n_rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// The subset of `required` not present, in the order requested.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Fail with [`AnalyticsError::MissingColumns`] unless every column exists.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing = self.missing_columns(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalyticsError::MissingColumns { missing })
        }
    }

    /// A new dataset holding only `rows` (in the given order).
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|(name, cells)| {
                let picked = rows.iter().filter_map(|&i| cells.get(i).cloned()).collect();
                (name.clone(), picked)
            })
            .collect();
        Dataset {
            column_names: self.column_names.clone(),
            columns,
            n_rows: rows.iter().filter(|&&i| i < self.n_rows).count(),
        }
    }

    /// Replace the cells of an existing column. Length must match.
    pub(crate) fn replace_column(&mut self, name: &str, cells: Vec<CellValue>) -> Result<()> {
        if cells.len() != self.n_rows {
            return Err(AnalyticsError::RaggedColumn {
                column: name.to_string(),
                expected: self.n_rows,
                found: cells.len(),
            });
        }
        match self.columns.get_mut(name) {
            Some(slot) => {
                *slot = cells;
                Ok(())
            }
            None => Err(AnalyticsError::MissingColumns {
                missing: vec![name.to_string()],
            }),
        }
    }

    /// Distinct values of a column in first-seen order (Null included).
    pub fn distinct_values(&self, name: &str) -> Vec<CellValue> {
        let Some(cells) = self.columns.get(name) else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        cells
            .iter()
            .filter(|cell| seen.insert(cell.distinct_key()))
            .cloned()
            .collect()
    }
}
