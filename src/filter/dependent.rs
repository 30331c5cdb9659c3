//! Restricting one view by the keys of another
//!
//! Courses are shown only for institutions that survive the institution
//! filters. The surviving institutions' keys become an extra in-set
//! criterion on the course specification, applied even when that set is
//! empty.

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use rustc_hash::FxHashSet;

use crate::dataset::{Dataset, DatasetView, RowKey};
use crate::error::Result;
use crate::filter::core::PredicateEvaluator;
use crate::filter::criterion::{FilterCriterion, LiteralValue};
use crate::filter::error::column_not_found;
use crate::filter::spec::FilterSpec;

/// Which institution records the key set is taken from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyDerivation {
    /// Every record matching the institution filters
    #[default]
    FilteredRows,
    /// Only the first record per institution, then filtered
    ///
    /// An institution whose first record fails a filter is excluded even
    /// if a later record would pass.
    DeduplicatedRows,
}

/// Distinct keys of a view's records, in first-seen order
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedKeySet {
    field: String,
    keys: Vec<LiteralValue>,
}

impl DerivedKeySet {
    /// Collect the distinct non-missing values of `field` in a view
    ///
    /// # Errors
    /// Returns a configuration error if the view has no such column
    pub fn from_view(view: &DatasetView, field: &str) -> Result<Self> {
        let column = view.column(field).map_err(|_| column_not_found(field))?;
        let mut seen = FxHashSet::default();
        let mut keys = Vec::new();

        for i in 0..column.len() {
            let key = RowKey::at(column, i);
            if key == RowKey::Missing || !seen.insert(key) {
                continue;
            }
            let any = column.as_any();
            let value = if let Some(ints) = any.downcast_ref::<Int64Array>() {
                LiteralValue::Int(ints.value(i))
            } else if let Some(strings) = any.downcast_ref::<StringArray>() {
                LiteralValue::from(strings.value(i))
            } else if let Some(floats) = any.downcast_ref::<Float64Array>() {
                LiteralValue::Float(floats.value(i))
            } else {
                continue;
            };
            keys.push(value);
        }

        Ok(Self {
            field: field.to_string(),
            keys,
        })
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn keys(&self) -> &[LiteralValue] {
        &self.keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// An in-set criterion over the keys
    #[must_use]
    pub fn to_criterion(&self) -> FilterCriterion {
        FilterCriterion::in_set(&self.field, self.keys.iter().cloned())
    }
}

/// Add a key restriction to a specification
///
/// With no key set the specification is returned unchanged. An empty key
/// set yields a specification that matches nothing.
#[must_use]
pub fn restrict_to_keys(spec: &FilterSpec, keys: Option<&DerivedKeySet>) -> FilterSpec {
    match keys {
        Some(keys) => spec.restrict_to(keys.to_criterion()),
        None => spec.clone(),
    }
}

/// Institution and course views of one filter cycle
#[derive(Debug, Clone)]
pub struct DependentViews {
    /// One record per institution passing the institution filters
    pub institutions: DatasetView,
    /// Course records passing the course filters and the key restriction
    pub courses: DatasetView,
    /// Keys used to restrict courses; `None` when no institution filter is active
    pub key_set: Option<DerivedKeySet>,
}

/// Evaluate the institution specification, then the course specification
/// restricted to the surviving institutions
///
/// When `institution_spec` is empty no restriction is derived, so courses
/// with a missing key remain visible.
///
/// # Errors
/// Returns an error if either specification fails to evaluate or the key
/// column is absent
pub fn derive_dependent_views<E>(
    evaluator: &E,
    dataset: &Dataset,
    institution_spec: &FilterSpec,
    course_spec: &FilterSpec,
    key_field: &str,
    derivation: KeyDerivation,
) -> Result<DependentViews>
where
    E: PredicateEvaluator + ?Sized,
{
    let filtered = evaluator.evaluate(dataset, institution_spec)?;

    let (institutions, key_set) = match derivation {
        KeyDerivation::FilteredRows => {
            let institutions = filtered.dedup_by(key_field)?;
            let key_set = if institution_spec.is_empty() {
                None
            } else {
                Some(DerivedKeySet::from_view(&filtered, key_field)?)
            };
            (institutions, key_set)
        }
        KeyDerivation::DeduplicatedRows => {
            let first_rows = DatasetView::full(dataset).dedup_by(key_field)?;
            let institutions = if institution_spec.is_empty() {
                first_rows
            } else {
                let passing: FxHashSet<u32> = filtered.row_ids().iter().copied().collect();
                let rows = first_rows
                    .row_ids()
                    .iter()
                    .copied()
                    .filter(|row| passing.contains(row))
                    .collect::<Vec<_>>();
                DatasetView::from_rows(dataset, rows.into())?
            };
            let key_set = if institution_spec.is_empty() {
                None
            } else {
                Some(DerivedKeySet::from_view(&institutions, key_field)?)
            };
            (institutions, key_set)
        }
    };

    let courses = evaluator.evaluate(dataset, &restrict_to_keys(course_spec, key_set.as_ref()))?;

    Ok(DependentViews {
        institutions,
        courses,
        key_set,
    })
}
