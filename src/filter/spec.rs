//! Filter specifications
//!
//! A specification is the conjunction of its criteria. It is rebuilt from
//! the current selections on every cycle; the combinators return a new
//! specification instead of modifying the receiver.

use std::collections::HashSet;
use std::fmt;

use arrow::datatypes::Schema;

use crate::error::Result;
use crate::filter::criterion::{FilterCriterion, required_columns};
use crate::filter::error::non_numeric_minimum;
use crate::schema::column_storage;

/// An ordered conjunction of active filter criteria
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    criteria: Vec<FilterCriterion>,
}

impl FilterSpec {
    /// A specification with no criteria; matches every record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a specification, dropping inactive criteria
    pub fn from_criteria(criteria: impl IntoIterator<Item = FilterCriterion>) -> Self {
        Self {
            criteria: criteria.into_iter().filter(FilterCriterion::is_active).collect(),
        }
    }

    /// A new specification with one more criterion, if it is active
    #[must_use]
    pub fn and(&self, criterion: FilterCriterion) -> Self {
        let mut criteria = self.criteria.clone();
        if criterion.is_active() {
            criteria.push(criterion);
        }
        Self { criteria }
    }

    /// A new specification with one more criterion, kept even if empty
    ///
    /// Used for derived restrictions: an empty in-set added this way
    /// matches nothing instead of being dropped.
    #[must_use]
    pub fn restrict_to(&self, criterion: FilterCriterion) -> Self {
        let mut criteria = self.criteria.clone();
        criteria.push(criterion);
        Self { criteria }
    }

    #[must_use]
    pub fn criteria(&self) -> &[FilterCriterion] {
        &self.criteria
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterCriterion> {
        self.criteria.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Whether no criterion is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Returns a set of all column names required by this specification
    #[must_use]
    pub fn required_columns(&self) -> HashSet<String> {
        required_columns(&self.criteria)
    }

    /// Check every criterion against a schema
    ///
    /// # Errors
    /// Returns a configuration error for unknown columns and for numeric
    /// minimums on text columns
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for criterion in &self.criteria {
            let storage = column_storage(schema, criterion.field())?;
            if let FilterCriterion::Min(field, _) = criterion {
                if !storage.is_numeric() {
                    return Err(non_numeric_minimum(field));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.criteria.is_empty() {
            return write!(f, "TRUE");
        }
        let parts = self.criteria.iter().map(ToString::to_string).collect::<Vec<_>>();
        write!(f, "{}", parts.join(" AND "))
    }
}

impl<'a> IntoIterator for &'a FilterSpec {
    type Item = &'a FilterCriterion;
    type IntoIter = std::slice::Iter<'a, FilterCriterion>;

    fn into_iter(self) -> Self::IntoIter {
        self.criteria.iter()
    }
}
