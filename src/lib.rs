//! A Rust library for filtering higher-education census microdata.
//!
//! The dataset is loaded once from a Parquet snapshot or a CSV fallback,
//! then filtered repeatedly by specifications built from control
//! selections. Filtering can run in memory over Arrow arrays or through an
//! embedded SQL engine; both produce the same records in the same order.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod loader;
pub mod rows;
pub mod schema;
pub mod utils;

// Core types
pub use config::{DatasetConfig, ExplorerConfig};
pub use dataset::{DataSource, Dataset, DatasetView};
pub use error::{CensoError, Result};
pub use explorer::{Explorer, ExplorerViews};

// Loading
pub use cache::DatasetCache;
pub use loader::{DatasetLoader, convert_csv_to_parquet};

// Filtering capabilities
pub use filter::{
    FieldControl, FilterCriterion, FilterSpec, FilterSpecBuilder, InMemoryEvaluator, KeyDerivation,
    LiteralValue, PredicateEvaluator, QueryEngineEvaluator, Selection, Selections, Strategy,
};

// Typed rows
pub use rows::{CourseRow, InstitutionRow};

// Arrow types
pub use arrow::record_batch::RecordBatch;
