//! Error handling for the census filter engine.

pub mod util;

use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for loading and filtering census data
#[derive(Debug, thiserror::Error)]
pub enum CensoError {
    /// No supported source could be read; the caller must halt
    #[error("Data unavailable (tried {}): {reason}", display_paths(.tried))]
    DataUnavailable {
        /// Every source that was attempted, in fallback order
        tried: Vec<PathBuf>,
        /// Why the last attempt failed
        reason: String,
    },

    /// Filter configuration does not match the loaded schema
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from an Arrow kernel
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error from the embedded query engine
    #[error("Query engine error: {0}")]
    Query(#[from] rusqlite::Error),

    /// Error converting record batches into typed rows
    #[error("Row conversion error: {0}")]
    Conversion(#[from] serde_arrow::Error),

    /// Error parsing selections
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CensoError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether the error means the dataset could not be loaded at all
    #[must_use]
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for census filter operations
pub type Result<T> = std::result::Result<T, CensoError>;
