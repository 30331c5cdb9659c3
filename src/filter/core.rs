//! Core filtering functionality
//!
//! This module defines the evaluator seam: anything that can turn a
//! [`FilterSpec`] into the positions of the matching records. Views are
//! materialized from those positions, so every evaluator yields records in
//! original order.

use arrow::array::{Array, BooleanArray, UInt32Array};
use arrow::compute::{and, prep_null_mask_filter};

use crate::dataset::{Dataset, DatasetView};
use crate::error::{CensoError, Result};
use crate::filter::spec::FilterSpec;

/// Turns a filter specification into the matching records of a dataset
///
/// Implementations must agree exactly: for the same dataset and
/// specification, every evaluator selects the same positions.
pub trait PredicateEvaluator: std::fmt::Debug {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Positions of the matching records, ascending
    ///
    /// Called only with non-empty specifications that have been validated
    /// against the dataset schema.
    ///
    /// # Errors
    /// Returns an error if evaluation fails
    fn select_rows(&self, dataset: &Dataset, spec: &FilterSpec) -> Result<UInt32Array>;

    /// Evaluate a specification into a view
    ///
    /// An empty specification yields the full collection unchanged.
    ///
    /// # Errors
    /// Returns a configuration error if the specification references an
    /// unknown column or applies a minimum to a text column
    fn evaluate(&self, dataset: &Dataset, spec: &FilterSpec) -> Result<DatasetView> {
        if spec.is_empty() {
            return Ok(DatasetView::full(dataset));
        }
        spec.validate(&dataset.schema())?;
        let rows = self.select_rows(dataset, spec)?;
        DatasetView::from_rows(dataset, rows)
    }
}

impl<E: PredicateEvaluator + ?Sized> PredicateEvaluator for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn select_rows(&self, dataset: &Dataset, spec: &FilterSpec) -> Result<UInt32Array> {
        (**self).select_rows(dataset, spec)
    }
}

/// Positions of the rows where a mask is true; nulls count as false
#[must_use]
pub fn mask_to_rows(mask: &BooleanArray) -> UInt32Array {
    let mask = if mask.null_count() > 0 {
        prep_null_mask_filter(mask)
    } else {
        mask.clone()
    };
    UInt32Array::from_iter_values(mask.values().set_indices().map(|i| i as u32))
}

/// Combine masks with a logical AND
///
/// # Errors
/// Returns an error if the masks differ in length
pub fn and_masks(left: &BooleanArray, right: &BooleanArray) -> Result<BooleanArray> {
    if left.len() != right.len() {
        return Err(CensoError::configuration(format!(
            "Mask length ({}) doesn't match ({})",
            right.len(),
            left.len()
        )));
    }
    Ok(and(left, right)?)
}

/// A mask with every row set to `value`
#[must_use]
pub fn constant_mask(len: usize, value: bool) -> BooleanArray {
    BooleanArray::from(vec![value; len])
}
