use thiserror::Error;

/// Failures raised by the analytics core.
///
/// Only schema problems are errors. Empty filters, single-year groups and
/// zero variance all produce (possibly empty) results instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Missing columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Column '{column}' has {found} values but the dataset has {expected} rows")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
