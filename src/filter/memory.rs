//! In-memory predicate evaluation with Arrow compute kernels
//!
//! Each criterion becomes a boolean mask over the dataset; the masks are
//! combined with AND. Missing values never satisfy a criterion.

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, UInt32Array};
use arrow::compute::kernels::cmp::eq;
use arrow::compute::prep_null_mask_filter;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::filter::core::{PredicateEvaluator, and_masks, constant_mask, mask_to_rows};
use crate::filter::criterion::{FilterCriterion, LiteralValue};
use crate::filter::error::{column_not_found, column_type_error, non_numeric_minimum};
use crate::filter::spec::FilterSpec;
use crate::schema::{StorageType, column_storage};

/// Evaluates specifications directly over the dataset's columns
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryEvaluator;

impl InMemoryEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a specification into a mask over a normalized batch
    ///
    /// # Errors
    /// Returns an error if a column is missing or has an unexpected type
    pub fn evaluate_mask(&self, batch: &RecordBatch, spec: &FilterSpec) -> Result<BooleanArray> {
        let mut mask = constant_mask(batch.num_rows(), true);

        for criterion in spec {
            let criterion_mask = self.evaluate_criterion(batch, criterion)?;
            mask = and_masks(&mask, &criterion_mask)?;

            if mask.true_count() == 0 {
                break;
            }
        }

        Ok(mask)
    }

    /// Evaluate a single criterion against a record batch
    fn evaluate_criterion(&self, batch: &RecordBatch, criterion: &FilterCriterion) -> Result<BooleanArray> {
        let field = criterion.field();
        let storage = column_storage(&batch.schema(), field)?;
        let column = batch
            .column_by_name(field)
            .ok_or_else(|| column_not_found(field))?;

        let mask = match criterion {
            FilterCriterion::Min(_, threshold) => {
                if !storage.is_numeric() {
                    return Err(non_numeric_minimum(field));
                }
                evaluate_minimum(column, field, storage, *threshold)?
            }
            FilterCriterion::Eq(..) => {
                let values = criterion.coerced_values(storage);
                match (values.first(), storage) {
                    (None, _) => constant_mask(column.len(), false),
                    (Some(LiteralValue::String(s)), StorageType::Text) => {
                        eq(column, &StringArray::new_scalar(s.as_str()))?
                    }
                    (Some(LiteralValue::Int(n)), StorageType::Integer) => {
                        eq(column, &Int64Array::new_scalar(*n))?
                    }
                    _ => evaluate_membership(column, field, storage, &values)?,
                }
            }
            FilterCriterion::In(..) => {
                evaluate_membership(column, field, storage, &criterion.coerced_values(storage))?
            }
        };

        if mask.null_count() > 0 {
            Ok(prep_null_mask_filter(&mask))
        } else {
            Ok(mask)
        }
    }
}

impl PredicateEvaluator for InMemoryEvaluator {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn select_rows(&self, dataset: &Dataset, spec: &FilterSpec) -> Result<UInt32Array> {
        let mask = self.evaluate_mask(dataset.batch(), spec)?;
        Ok(mask_to_rows(&mask))
    }
}

fn downcast<'a, T: 'static>(column: &'a ArrayRef, field: &str, storage: StorageType) -> Result<&'a T> {
    column
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| column_type_error(field, storage))
}

/// `column >= threshold`, comparing integers as floats
fn evaluate_minimum(column: &ArrayRef, field: &str, storage: StorageType, threshold: f64) -> Result<BooleanArray> {
    let values: Vec<bool> = match storage {
        StorageType::Integer => downcast::<Int64Array>(column, field, storage)?
            .iter()
            .map(|v| v.is_some_and(|n| n as f64 >= threshold))
            .collect(),
        StorageType::Float => downcast::<Float64Array>(column, field, storage)?
            .iter()
            .map(|v| v.is_some_and(|f| f >= threshold))
            .collect(),
        StorageType::Text => vec![false; column.len()],
    };
    Ok(BooleanArray::from(values))
}

/// Membership in a set of already coerced values
fn evaluate_membership(
    column: &ArrayRef,
    field: &str,
    storage: StorageType,
    values: &[LiteralValue],
) -> Result<BooleanArray> {
    if values.is_empty() {
        return Ok(constant_mask(column.len(), false));
    }

    let mask: Vec<bool> = match storage {
        StorageType::Text => {
            let set: FxHashSet<&str> = values
                .iter()
                .filter_map(|v| match v {
                    LiteralValue::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect();
            downcast::<StringArray>(column, field, storage)?
                .iter()
                .map(|v| v.is_some_and(|s| set.contains(s)))
                .collect()
        }
        StorageType::Integer => {
            let set: FxHashSet<i64> = values
                .iter()
                .filter_map(|v| match v {
                    LiteralValue::Int(n) => Some(*n),
                    _ => None,
                })
                .collect();
            downcast::<Int64Array>(column, field, storage)?
                .iter()
                .map(|v| v.is_some_and(|n| set.contains(&n)))
                .collect()
        }
        StorageType::Float => {
            let set: FxHashSet<u64> = values
                .iter()
                .filter_map(LiteralValue::as_f64)
                .map(float_key)
                .collect();
            downcast::<Float64Array>(column, field, storage)?
                .iter()
                .map(|v| v.is_some_and(|f| set.contains(&float_key(f))))
                .collect()
        }
    };

    Ok(BooleanArray::from(mask))
}

/// Bit pattern used for float equality; -0.0 and 0.0 compare equal
fn float_key(f: f64) -> u64 {
    (f + 0.0).to_bits()
}
