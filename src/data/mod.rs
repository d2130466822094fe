/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ObservationTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ ObservationTable │  Vec<Observation>, distinct species
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  species predicates → subsets, counts, summary
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
