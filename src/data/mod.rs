/// Data layer: core types, loading, transforms and binning.
///
/// Architecture:
/// ```text
///  .csv / .tsv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Vec<Record>, column index
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ transform │  lookup → calculate → filter → aggregate / bin
///   └───────────┘
/// ```

pub mod bin;
pub mod loader;
pub mod model;
pub mod transform;

use thiserror::Error;

/// Errors raised by transform stages.  Data-quality problems (missing keys,
/// unparsable numbers) are not errors; they exclude a row or produce nulls.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("field '{field}' not found in {table}")]
    MissingField { field: String, table: &'static str },

    #[error("bin extent [{min}, {max}] is invalid")]
    InvalidExtent { min: f64, max: f64 },

    #[error("maxbins must be at least 1")]
    InvalidMaxbins,
}
