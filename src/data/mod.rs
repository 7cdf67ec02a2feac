/// Data layer: particle tables and how they are read.
///
/// Architecture:
/// ```text
///   part_rfq.txt / accepted.txt
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  classify extension → parse ASCII → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  named f64 columns, one row per particle
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
