/// Data layer: core types, loading, normalization and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (cells kept as found)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  column name → Vec<CellValue>
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  coerce required columns, drop incomplete rows
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year bounds, university allow-list
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
