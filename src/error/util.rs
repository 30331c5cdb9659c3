//! Helpers for fallible source access

use std::path::{Path, PathBuf};

use crate::error::{CensoError, Result};
use crate::utils::logging::log_source_skipped;

/// Try each source in order, returning the first successful load
///
/// Every failure is logged as a warning. When all sources fail, the
/// combined failure is reported as [`CensoError::DataUnavailable`] so the
/// caller halts instead of continuing without data.
///
/// # Example
/// ```
/// use censo_filter::error::util::try_sources;
/// use censo_filter::{CensoError, Result};
/// use std::path::{Path, PathBuf};
///
/// fn from_snapshot(_: &Path) -> Result<usize> {
///     Err(CensoError::configuration("no snapshot"))
/// }
///
/// fn from_text(_: &Path) -> Result<usize> {
///     Ok(3)
/// }
///
/// let loaders: Vec<(PathBuf, fn(&Path) -> Result<usize>)> = vec![
///     (PathBuf::from("missing.parquet"), from_snapshot),
///     (PathBuf::from("fallback.csv"), from_text),
/// ];
/// assert_eq!(try_sources("loading dataset", loaders).unwrap(), 3);
/// ```
pub fn try_sources<T, F>(operation_name: &str, sources: Vec<(PathBuf, F)>) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let mut tried = Vec::with_capacity(sources.len());
    let mut failures = Vec::new();

    for (path, load) in sources {
        match load(&path) {
            Ok(result) => return Ok(result),
            Err(e) => {
                log_source_skipped(operation_name, &path, &e);
                failures.push(format!("{}: {e}", path.display()));
                tried.push(path);
            }
        }
    }

    let reason = if failures.is_empty() {
        format!("no sources configured for {operation_name}")
    } else {
        failures.join("; ")
    };

    Err(CensoError::DataUnavailable { tried, reason })
}

/// Check that a file exists before handing it to a reader
pub fn ensure_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )
        .into());
    }
    Ok(())
}
