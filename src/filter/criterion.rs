//! Filter criteria and literal values
//!
//! Literals are coerced to the storage type of the column they are compared
//! against before either evaluator sees them. A literal that cannot be
//! coerced can never match.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::schema::StorageType;

/// Operand list of an in-set criterion
pub type ValueSet = SmallVec<[LiteralValue; 4]>;

/// A literal value used as a filter operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// Integer value
    Int(i64),

    /// Floating point value
    Float(f64),

    /// String value
    String(String),
}

impl LiteralValue {
    /// Coerce this literal to the storage type of a column
    ///
    /// Returns `None` when no value of that column could equal the literal.
    #[must_use]
    pub fn coerce_to(&self, storage: StorageType) -> Option<Self> {
        match (self, storage) {
            (Self::String(s), StorageType::Text) => Some(Self::String(s.clone())),
            (Self::Int(n), StorageType::Text) => Some(Self::String(n.to_string())),
            (Self::Float(f), StorageType::Text) => Some(Self::String(f.to_string())),

            (Self::Int(n), StorageType::Integer) => Some(Self::Int(*n)),
            (Self::Float(f), StorageType::Integer) => float_to_int(*f).map(Self::Int),
            (Self::String(s), StorageType::Integer) => {
                let trimmed = s.trim();
                match trimmed.parse::<i64>() {
                    Ok(n) => Some(Self::Int(n)),
                    Err(_) => trimmed.parse::<f64>().ok().and_then(float_to_int).map(Self::Int),
                }
            }

            (Self::Int(n), StorageType::Float) => Some(Self::Float(*n as f64)),
            (Self::Float(f), StorageType::Float) => (!f.is_nan()).then_some(Self::Float(*f)),
            (Self::String(s), StorageType::Float) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| !f.is_nan())
                .map(Self::Float),
        }
    }

    /// Numeric value, if this literal is a number
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::String(_) => None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

fn float_to_int(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
}

/// The kind of restriction a criterion applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionKind {
    /// Value must be one of a set
    InSet,
    /// Numeric value must be at least a threshold
    NumericMinimum,
    /// Value must equal a scalar
    EqualsScalar,
}

/// One field-level restriction
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCriterion {
    /// Column value is in a set of values
    In(String, ValueSet),

    /// Column value is greater than or equal to a threshold
    Min(String, f64),

    /// Column equals a literal value
    Eq(String, LiteralValue),
}

impl FilterCriterion {
    /// Create an in-set criterion
    pub fn in_set<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<LiteralValue>,
    {
        Self::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Create a numeric-minimum criterion
    pub fn minimum(field: impl Into<String>, threshold: f64) -> Self {
        Self::Min(field.into(), threshold)
    }

    /// Create an equality criterion
    pub fn equals(field: impl Into<String>, value: impl Into<LiteralValue>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    /// The column this criterion restricts
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::In(field, _) | Self::Min(field, _) | Self::Eq(field, _) => field,
        }
    }

    #[must_use]
    pub fn kind(&self) -> CriterionKind {
        match self {
            Self::In(..) => CriterionKind::InSet,
            Self::Min(..) => CriterionKind::NumericMinimum,
            Self::Eq(..) => CriterionKind::EqualsScalar,
        }
    }

    /// An empty in-set operand means "no restriction on this field"
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Self::In(_, values) => !values.is_empty(),
            Self::Min(_, threshold) => !threshold.is_nan(),
            Self::Eq(..) => true,
        }
    }

    /// Operand values coerced for a column, dropping those that cannot match
    #[must_use]
    pub fn coerced_values(&self, storage: StorageType) -> Vec<LiteralValue> {
        match self {
            Self::In(_, values) => values.iter().filter_map(|v| v.coerce_to(storage)).collect(),
            Self::Eq(_, value) => value.coerce_to(storage).into_iter().collect(),
            Self::Min(_, threshold) => vec![LiteralValue::Float(*threshold)],
        }
    }
}

impl fmt::Display for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In(field, values) => {
                let values = values.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "{field} IN ({})", values.join(", "))
            }
            Self::Min(field, threshold) => write!(f, "{field} >= {threshold}"),
            Self::Eq(field, value) => write!(f, "{field} = {value}"),
        }
    }
}

/// Collect the distinct column names referenced by criteria
pub(crate) fn required_columns<'a>(criteria: impl IntoIterator<Item = &'a FilterCriterion>) -> HashSet<String> {
    criteria.into_iter().map(|c| c.field().to_string()).collect()
}
