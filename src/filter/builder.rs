//! Translating control selections into filter specifications
//!
//! A [`FieldControl`] binds a column to the kind of input that restricts
//! it. [`FilterSpecBuilder`] checks the controls against the dataset schema
//! once, then turns [`Selections`] into a [`FilterSpec`] on every cycle.

use std::collections::BTreeMap;

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use itertools::Itertools;
use log::warn;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{CensoError, Result};
use crate::filter::criterion::{FilterCriterion, LiteralValue};
use crate::filter::error::column_type_error;
use crate::filter::spec::FilterSpec;
use crate::schema::{StorageType, column_storage};

/// The input kind a control offers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    /// Any number of values; none selected means no restriction
    MultiSelect,
    /// A threshold within `[min, max]`; a threshold at `min` means no restriction
    Minimum { min: f64, max: f64 },
    /// A single value, or none
    SingleSelect,
}

/// A filter input bound to one column
#[derive(Debug, Clone, PartialEq)]
pub struct FieldControl {
    pub field: String,
    pub kind: ControlKind,
}

impl FieldControl {
    pub fn multi_select(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: ControlKind::MultiSelect,
        }
    }

    pub fn minimum(field: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            field: field.into(),
            kind: ControlKind::Minimum { min, max },
        }
    }

    pub fn single_select(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: ControlKind::SingleSelect,
        }
    }

    /// Sorted distinct non-missing values of the control's column
    ///
    /// # Errors
    /// Returns a configuration error if the column is absent
    pub fn options(&self, dataset: &Dataset) -> Result<Vec<LiteralValue>> {
        let storage = column_storage(&dataset.schema(), &self.field)?;
        let column = dataset.column(&self.field)?;
        let any = column.as_any();

        let options = match storage {
            StorageType::Text => any
                .downcast_ref::<StringArray>()
                .ok_or_else(|| column_type_error(&self.field, storage))?
                .iter()
                .flatten()
                .unique()
                .sorted()
                .map(LiteralValue::from)
                .collect(),
            StorageType::Integer => any
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| column_type_error(&self.field, storage))?
                .iter()
                .flatten()
                .unique()
                .sorted()
                .map(LiteralValue::Int)
                .collect(),
            StorageType::Float => {
                let mut seen = FxHashSet::default();
                any.downcast_ref::<Float64Array>()
                    .ok_or_else(|| column_type_error(&self.field, storage))?
                    .iter()
                    .flatten()
                    .filter(|f| seen.insert((f + 0.0).to_bits()))
                    .sorted_by(f64::total_cmp)
                    .map(LiteralValue::Float)
                    .collect()
            }
        };
        Ok(options)
    }

    /// Criterion for a selection, or `None` if it imposes no restriction
    fn criterion(&self, selection: &Selection) -> Option<FilterCriterion> {
        let criterion = match (self.kind, selection) {
            (ControlKind::MultiSelect, Selection::Values(values)) => {
                FilterCriterion::in_set(&self.field, values.iter().cloned())
            }
            (ControlKind::MultiSelect, Selection::Threshold(t)) => FilterCriterion::in_set(&self.field, [*t]),
            (ControlKind::MultiSelect, Selection::Scalar(v)) => {
                FilterCriterion::in_set(&self.field, [v.clone()])
            }

            (ControlKind::SingleSelect, Selection::Values(values)) => match values.as_slice() {
                [] => return None,
                [value] => FilterCriterion::equals(&self.field, value.clone()),
                _ => FilterCriterion::in_set(&self.field, values.iter().cloned()),
            },
            (ControlKind::SingleSelect, Selection::Threshold(t)) => FilterCriterion::equals(&self.field, *t),
            (ControlKind::SingleSelect, Selection::Scalar(v)) => FilterCriterion::equals(&self.field, v.clone()),

            (ControlKind::Minimum { min, max }, selection) => {
                let threshold = match selection {
                    Selection::Threshold(t) => Some(*t),
                    Selection::Scalar(v) => numeric_threshold(v),
                    Selection::Values(values) => match values.as_slice() {
                        [value] => numeric_threshold(value),
                        _ => None,
                    },
                };
                let Some(threshold) = threshold.filter(|t| !t.is_nan()) else {
                    warn!("Ignoring non-numeric selection for '{}'", self.field);
                    return None;
                };
                let clamped = threshold.clamp(min, max);
                if clamped != threshold {
                    warn!(
                        "Threshold {threshold} for '{}' outside [{min}, {max}], using {clamped}",
                        self.field
                    );
                }
                if clamped <= min {
                    return None;
                }
                FilterCriterion::minimum(&self.field, clamped)
            }
        };
        criterion.is_active().then_some(criterion)
    }
}

/// The value chosen on one control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// Several values (multi-select)
    Values(Vec<LiteralValue>),
    /// A number (slider)
    Threshold(f64),
    /// A single non-numeric value
    Scalar(LiteralValue),
}

impl From<Vec<&str>> for Selection {
    fn from(values: Vec<&str>) -> Self {
        Self::Values(values.into_iter().map(LiteralValue::from).collect())
    }
}

impl From<Vec<LiteralValue>> for Selection {
    fn from(values: Vec<LiteralValue>) -> Self {
        Self::Values(values)
    }
}

impl From<f64> for Selection {
    fn from(threshold: f64) -> Self {
        Self::Threshold(threshold)
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Self::Scalar(LiteralValue::from(value))
    }
}

fn numeric_threshold(value: &LiteralValue) -> Option<f64> {
    value.coerce_to(StorageType::Float).as_ref().and_then(LiteralValue::as_f64)
}

/// The current value of every control, keyed by column
///
/// Serialized as a JSON object, e.g.
/// `{"SG_UF_IES": ["SC"], "IGC": 3}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selections {
    values: BTreeMap<String, Selection>,
}

impl Selections {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the selection for a column
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, selection: impl Into<Selection>) -> Self {
        self.values.insert(field.into(), selection.into());
        self
    }

    /// Parse selections from a JSON object
    ///
    /// # Errors
    /// Returns an error if the text is not a JSON object of selections
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Selection> {
        self.values.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builds filter specifications from a fixed set of controls
#[derive(Debug, Clone)]
pub struct FilterSpecBuilder {
    controls: Vec<FieldControl>,
}

impl FilterSpecBuilder {
    /// Check controls against a dataset schema
    ///
    /// # Errors
    /// Returns a configuration error if a control names an unknown column,
    /// a column appears twice, a minimum control targets a non-numeric
    /// column, or a minimum control has an invalid range
    pub fn new(controls: Vec<FieldControl>, schema: &arrow::datatypes::Schema) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for control in &controls {
            if !seen.insert(control.field.as_str()) {
                return Err(CensoError::configuration(format!(
                    "Column '{}' has more than one control",
                    control.field
                )));
            }

            let storage = column_storage(schema, &control.field)?;
            if let ControlKind::Minimum { min, max } = control.kind {
                if !storage.is_numeric() {
                    return Err(CensoError::configuration(format!(
                        "Minimum control on non-numeric column '{}'",
                        control.field
                    )));
                }
                if !(min.is_finite() && max.is_finite() && min <= max) {
                    return Err(CensoError::configuration(format!(
                        "Invalid range [{min}, {max}] for '{}'",
                        control.field
                    )));
                }
            }
        }
        Ok(Self { controls })
    }

    #[must_use]
    pub fn controls(&self) -> &[FieldControl] {
        &self.controls
    }

    /// Whether a column has a control in this builder
    #[must_use]
    pub fn handles(&self, field: &str) -> bool {
        self.controls.iter().any(|c| c.field == field)
    }

    /// Build the specification for the current selections
    ///
    /// Criteria appear in control order. Selections for columns without a
    /// control here are not consulted.
    #[must_use]
    pub fn build(&self, selections: &Selections) -> FilterSpec {
        FilterSpec::from_criteria(
            self.controls
                .iter()
                .filter_map(|control| control.criterion(selections.get(&control.field)?)),
        )
    }
}
