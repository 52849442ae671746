use log::debug;

use super::model::{CellValue, Dataset};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Column specs
// ---------------------------------------------------------------------------

/// The semantic type a column must parse to before a computation can use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Finite floating point value.
    Float,
    /// Finite number truncated toward zero; must fit in `i32`.
    Int,
    /// Non-blank text (numbers are rendered as text).
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec<'a> {
    pub name: &'a str,
    pub kind: ColumnKind,
}

impl<'a> ColumnSpec<'a> {
    pub const fn float(name: &'a str) -> Self {
        ColumnSpec {
            name,
            kind: ColumnKind::Float,
        }
    }

    pub const fn int(name: &'a str) -> Self {
        ColumnSpec {
            name,
            kind: ColumnKind::Int,
        }
    }

    pub const fn text(name: &'a str) -> Self {
        ColumnSpec {
            name,
            kind: ColumnKind::Text,
        }
    }
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Parse a cell as a finite float. `None` marks the cell as missing.
pub fn parse_float(cell: &CellValue) -> Option<f64> {
    let v = match cell {
        CellValue::Float(v) => *v,
        CellValue::Integer(i) => *i as f64,
        CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        CellValue::Bool(_) | CellValue::Null => return None,
    };
    v.is_finite().then_some(v)
}

/// Parse a cell as an integer, truncating fractional parts.
pub fn parse_int(cell: &CellValue) -> Option<i64> {
    if let CellValue::Integer(i) = cell {
        return (i32::MIN as i64..=i32::MAX as i64)
            .contains(i)
            .then_some(*i);
    }
    let v = parse_float(cell)?.trunc();
    (v >= i32::MIN as f64 && v <= i32::MAX as f64).then_some(v as i64)
}

/// Parse a cell as non-blank text.
pub fn parse_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        CellValue::Integer(_) | CellValue::Float(_) | CellValue::Bool(_) => Some(cell.to_string()),
        CellValue::Null => None,
    }
}

fn coerce(cell: &CellValue, kind: ColumnKind) -> Option<CellValue> {
    match kind {
        ColumnKind::Float => parse_float(cell).map(CellValue::Float),
        ColumnKind::Int => parse_int(cell).map(CellValue::Integer),
        ColumnKind::Text => parse_text(cell).map(CellValue::Text),
    }
}

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

/// Coerce every spec'd column and keep only rows where all of them parse.
///
/// The caller's dataset is untouched. Unlisted columns are carried through
/// as-is. Fails only when a spec'd column is absent, naming all of them.
/// Running this on its own output returns an identical dataset.
pub fn normalize_columns(dataset: &Dataset, specs: &[ColumnSpec<'_>]) -> Result<Dataset> {
    let names: Vec<&str> = specs.iter().map(|s| s.name).collect();
    dataset.require_columns(&names)?;

    let mut coerced: Vec<Vec<Option<CellValue>>> = Vec::with_capacity(specs.len());
    for spec in specs {
        let cells = dataset.column(spec.name).unwrap_or(&[]);
        coerced.push(cells.iter().map(|c| coerce(c, spec.kind)).collect());
    }

    let keep: Vec<usize> = (0..dataset.len())
        .filter(|&row| {
            coerced
                .iter()
                .all(|col| col.get(row).is_some_and(Option::is_some))
        })
        .collect();

    let dropped = dataset.len() - keep.len();
    if dropped > 0 {
        debug!(
            "normalize: dropped {dropped} of {} rows missing one of [{}]",
            dataset.len(),
            names.join(", ")
        );
    }

    let mut out = dataset.select_rows(&keep);
    for (spec, col) in specs.iter().zip(coerced) {
        let cells: Vec<CellValue> = keep
            .iter()
            .filter_map(|&row| col.get(row).cloned().flatten())
            .collect();
        out.replace_column(spec.name, cells)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;

    fn survey() -> Dataset {
        Dataset::from_columns(vec![
            (
                "year",
                vec![
                    CellValue::Integer(2019),
                    CellValue::from("2020"),
                    CellValue::Float(2021.0),
                    CellValue::from("2022"),
                ],
            ),
            (
                "university",
                vec!["NUS".into(), "NTU".into(), "  ".into(), "SMU".into()],
            ),
            (
                "employment_rate_overall",
                vec![
                    CellValue::from("91.5"),
                    CellValue::from("NA"),
                    CellValue::Float(88.0),
                    CellValue::Integer(90),
                ],
            ),
        ])
        .unwrap()
    }

    const SPECS: [ColumnSpec<'static>; 3] = [
        ColumnSpec::int("year"),
        ColumnSpec::text("university"),
        ColumnSpec::float("employment_rate_overall"),
    ];

    #[test]
    fn parse_float_rejects_non_numeric_and_non_finite() {
        assert_eq!(parse_float(&CellValue::from(" 3.5 ")), Some(3.5));
        assert_eq!(parse_float(&CellValue::from("NA")), None);
        assert_eq!(parse_float(&CellValue::from("")), None);
        assert_eq!(parse_float(&CellValue::from("inf")), None);
        assert_eq!(parse_float(&CellValue::Float(f64::NAN)), None);
        assert_eq!(parse_float(&CellValue::Bool(true)), None);
        assert_eq!(parse_float(&CellValue::Null), None);
    }

    #[test]
    fn parse_int_truncates_and_bounds() {
        assert_eq!(parse_int(&CellValue::from("2019.7")), Some(2019));
        assert_eq!(parse_int(&CellValue::Float(-3.9)), Some(-3));
        assert_eq!(parse_int(&CellValue::Integer(i64::MAX)), None);
        assert_eq!(parse_int(&CellValue::from("1e12")), None);
    }

    #[test]
    fn rows_with_any_missing_required_value_are_dropped() {
        let clean = normalize_columns(&survey(), &SPECS).unwrap();
        assert_eq!(clean.len(), 2);
        assert_eq!(
            clean.column("university").unwrap(),
            &[CellValue::from("NUS"), CellValue::from("SMU")][..]
        );
        assert_eq!(
            clean.column("employment_rate_overall").unwrap(),
            &[CellValue::Float(91.5), CellValue::Float(90.0)][..]
        );
        assert_eq!(
            clean.column("year").unwrap(),
            &[CellValue::Integer(2019), CellValue::Integer(2022)][..]
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_columns(&survey(), &SPECS).unwrap();
        let twice = normalize_columns(&once, &SPECS).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn input_dataset_is_not_mutated() {
        let ds = survey();
        let before = ds.clone();
        let _ = normalize_columns(&ds, &SPECS).unwrap();
        assert_eq!(ds, before);
    }

    #[test]
    fn missing_columns_are_all_reported() {
        let ds = Dataset::from_columns(vec![("university", vec![CellValue::from("NUS")])]).unwrap();
        let err = normalize_columns(&ds, &SPECS).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::MissingColumns {
                missing: vec!["year".into(), "employment_rate_overall".into()]
            }
        );
    }
}
