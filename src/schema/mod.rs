//! Column definitions, storage types and load-time coercion
//!
//! Every dataset column is normalized to one of three storage types so the
//! in-memory and query-engine evaluators compare values the same way.

pub mod census;
pub mod conversions;
pub mod field;

use arrow::datatypes::{DataType, Schema};

use crate::error::{CensoError, Result};

pub use census::{apply_census_transform, census_fields};
pub use conversions::{coerce_integer, coerce_numeric, map_codes, normalize_array, normalize_batch};
pub use field::{FieldDefinition, FieldType};

/// The storage type of a normalized column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// `Utf8`
    Text,
    /// `Int64`
    Integer,
    /// `Float64`
    Float,
}

impl StorageType {
    /// Storage type of an Arrow type, if it is one of the normalized types
    #[must_use]
    pub fn of(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Utf8 => Some(Self::Text),
            DataType::Int64 => Some(Self::Integer),
            DataType::Float64 => Some(Self::Float),
            _ => None,
        }
    }

    /// Whether numeric thresholds can be applied
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// SQL column type used when registering with the query engine
    #[must_use]
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Float => "REAL",
        }
    }
}

/// Resolve the storage type of a named column
///
/// # Errors
/// Returns a configuration error if the column is absent or not normalized
pub fn column_storage(schema: &Schema, column: &str) -> Result<StorageType> {
    let field = schema.field_with_name(column).map_err(|_| {
        CensoError::configuration(format!("Column '{column}' not found in dataset schema"))
    })?;
    StorageType::of(field.data_type()).ok_or_else(|| {
        CensoError::configuration(format!(
            "Column '{column}' has unsupported type {}",
            field.data_type()
        ))
    })
}
