//! Field definitions for census columns
//!
//! A field definition names a column, says how its raw values are coerced
//! on load and, for coded columns, which label each code maps to.

use arrow_schema::{DataType, Field};

/// Semantic type of a census column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Institution or course identifier
    Identifier,
    /// Free text (names, states, municipalities)
    Text,
    /// Whole number (years)
    Integer,
    /// Score or count; unparseable cells become missing
    Decimal,
    /// Integer code remapped to a text label
    Category,
}

impl FieldType {
    /// Arrow type the column has after loading
    #[must_use]
    pub fn to_arrow_type(self) -> DataType {
        match self {
            Self::Identifier | Self::Integer => DataType::Int64,
            Self::Decimal => DataType::Float64,
            Self::Text | Self::Category => DataType::Utf8,
        }
    }
}

/// A census column definition
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Column name as it appears in the source file
    pub name: String,
    /// Semantic type of the field
    pub field_type: FieldType,
    /// Code to label mapping for `Category` fields
    pub labels: Vec<(f64, String)>,
}

impl FieldDefinition {
    /// Create a new field definition
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            labels: Vec::new(),
        }
    }

    /// Add a code label; only meaningful for `Category` fields
    #[must_use]
    pub fn with_label(mut self, code: f64, label: impl Into<String>) -> Self {
        self.labels.push((code, label.into()));
        self
    }

    /// Look up the label for a code
    #[must_use]
    pub fn label_for(&self, code: f64) -> Option<&str> {
        self.labels
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| label.as_str())
    }

    /// Whether `value` is already one of this field's labels
    #[must_use]
    pub fn is_label(&self, value: &str) -> bool {
        self.labels.iter().any(|(_, label)| label == value)
    }

    /// Convert to an Arrow Field
    #[must_use]
    pub fn to_arrow_field(&self) -> Field {
        Field::new(&self.name, self.field_type.to_arrow_type(), true)
    }
}
