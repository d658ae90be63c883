/// Data layer: core types, loading, classification and filtering.
///
/// Architecture:
/// ```text
///   .csv / .xlsx bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → Dataset (unnamed columns dropped)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  force configured columns to categorical
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  widget   │  one filter control per column (by ColumnKind)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  per-column predicates, AND-combined → filtered view
///   └──────────┘
/// ```

pub mod classify;
pub mod filter;
pub mod loader;
pub mod model;
pub mod widget;
