/// Data layer: core types, loading, and statistics.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .json / .parquet  (bytes)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → Dataset (lowercase column names)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  ordered columns of Values
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  describe → Vec<ColumnStats>
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod stats;
