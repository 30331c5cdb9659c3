//! Log lines for loading and filter cycles
//!
//! Source reads and conversions log at info level. Cycle summaries log at
//! debug level since they repeat on every selection change.

use std::path::Path;
use std::time::Duration;

use crate::dataset::DataSource;

/// Log that a source is about to be read
///
/// # Arguments
/// * `action` - What is being done with the file
/// * `path` - The file being read
pub fn log_source_read(action: &str, path: &Path) {
    log::info!("{action} {}", path.display());
}

/// Log a completed load or conversion
pub fn log_rows_read(source: &DataSource, rows: usize, elapsed: Duration) {
    match source {
        DataSource::Parquet(path) => {
            log::info!("Read {rows} records from snapshot {} in {elapsed:?}", path.display());
        }
        DataSource::Csv(path) => {
            log::info!("Read {rows} records from CSV {} in {elapsed:?}", path.display());
        }
        DataSource::Memory => log::info!("Built {rows} records in memory in {elapsed:?}"),
    }
}

/// Log a source that could not be used, before the next one is tried
pub fn log_source_skipped(operation: &str, path: &Path, reason: &dyn std::fmt::Display) {
    log::warn!("{operation} failed for {} ({reason})", path.display());
}

/// Log the outcome of one filter evaluation cycle
///
/// # Arguments
/// * `institutions` - Rows in the deduplicated institution view
/// * `courses` - Rows in the course view
/// * `keys` - Size of the derived key set, if one was applied
/// * `elapsed` - Time spent evaluating the cycle
pub fn log_cycle_summary(institutions: usize, courses: usize, keys: Option<usize>, elapsed: Duration) {
    match keys {
        Some(keys) => log::debug!(
            "Evaluated cycle: {institutions} institutions, {keys} keys, {courses} courses in {elapsed:?}"
        ),
        None => log::debug!(
            "Evaluated cycle: {institutions} institutions, {courses} courses (no institution restriction) in {elapsed:?}"
        ),
    }
}
