//! Error helpers for the filter module

use crate::error::CensoError;
use crate::schema::StorageType;

/// Error for a column absent from the data being filtered
pub fn column_not_found(column_name: &str) -> CensoError {
    CensoError::configuration(format!("Column '{column_name}' not found"))
}

/// Error for a column whose array does not match its storage type
pub fn column_type_error(column_name: &str, expected: StorageType) -> CensoError {
    CensoError::configuration(format!(
        "Column '{column_name}' is not stored as {expected:?}"
    ))
}

/// Error for a numeric minimum on a text column
pub fn non_numeric_minimum(column_name: &str) -> CensoError {
    CensoError::configuration(format!(
        "Numeric minimum on non-numeric column '{column_name}'"
    ))
}
