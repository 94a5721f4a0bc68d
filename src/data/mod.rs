/// Data layer: core table types, loading, and validity masks.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table, decimal-comma cleanup
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Vec<Record>, ordered column names
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  numeric completeness → valid row indices
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
