//! The institution/course explorer cycle
//!
//! Each cycle rebuilds both filter specifications from the current
//! selections and re-evaluates them against the loaded dataset. Nothing is
//! carried over between cycles.

use std::sync::Arc;
use std::time::Instant;

use log::warn;

use crate::config::ExplorerConfig;
use crate::dataset::{Dataset, DatasetView};
use crate::error::{CensoError, Result};
use crate::filter::builder::{FilterSpecBuilder, Selections};
use crate::filter::core::PredicateEvaluator;
use crate::filter::criterion::LiteralValue;
use crate::filter::dependent::{DerivedKeySet, KeyDerivation, derive_dependent_views};
use crate::filter::spec::FilterSpec;
use crate::rows::{CourseRow, InstitutionRow};
use crate::utils::logging::log_cycle_summary;

/// Views produced by one explorer cycle
#[derive(Debug, Clone)]
pub struct ExplorerViews {
    /// One record per institution passing the institution filters
    pub institutions: DatasetView,
    /// Courses of those institutions passing the course filters
    pub courses: DatasetView,
    /// Institution keys the courses were restricted to, if any
    pub key_set: Option<DerivedKeySet>,
}

impl ExplorerViews {
    /// The institution view as typed rows
    pub fn institution_rows(&self) -> Result<Vec<InstitutionRow>> {
        self.institutions.records()
    }

    /// The course view as typed rows
    pub fn course_rows(&self) -> Result<Vec<CourseRow>> {
        self.courses.records()
    }
}

/// Runs filter cycles over one dataset with one evaluator
#[derive(Debug)]
pub struct Explorer<E> {
    dataset: Arc<Dataset>,
    evaluator: E,
    institution_builder: FilterSpecBuilder,
    course_builder: FilterSpecBuilder,
    key_field: String,
    key_derivation: KeyDerivation,
}

impl<E: PredicateEvaluator> Explorer<E> {
    /// Validate the configured controls against the dataset
    ///
    /// # Errors
    /// Returns a configuration error if a control or the key column does not
    /// fit the dataset schema
    pub fn new(dataset: Arc<Dataset>, evaluator: E, config: ExplorerConfig) -> Result<Self> {
        let schema = dataset.schema();
        if schema.column_with_name(&config.key_field).is_none() {
            return Err(CensoError::configuration(format!(
                "Key column '{}' not found in dataset schema",
                config.key_field
            )));
        }

        Ok(Self {
            institution_builder: FilterSpecBuilder::new(config.institution_controls, &schema)?,
            course_builder: FilterSpecBuilder::new(config.course_controls, &schema)?,
            key_field: config.key_field,
            key_derivation: config.key_derivation,
            dataset,
            evaluator,
        })
    }

    #[must_use]
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    #[must_use]
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Sorted distinct values offered by the control on `field`
    pub fn options(&self, field: &str) -> Result<Vec<LiteralValue>> {
        self.institution_builder
            .controls()
            .iter()
            .chain(self.course_builder.controls())
            .find(|c| c.field == field)
            .ok_or_else(|| CensoError::configuration(format!("No control for column '{field}'")))?
            .options(&self.dataset)
    }

    /// The institution specification for the current selections
    #[must_use]
    pub fn institution_spec(&self, selections: &Selections) -> FilterSpec {
        self.institution_builder.build(selections)
    }

    /// The course specification for the current selections, before the key restriction
    #[must_use]
    pub fn course_spec(&self, selections: &Selections) -> FilterSpec {
        self.course_builder.build(selections)
    }

    /// Run one full cycle
    pub fn run(&self, selections: &Selections) -> Result<ExplorerViews> {
        let start = Instant::now();

        for field in selections.fields() {
            if !self.institution_builder.handles(field) && !self.course_builder.handles(field) {
                warn!("Ignoring selection for '{field}': no control on that column");
            }
        }

        let institution_spec = self.institution_spec(selections);
        let course_spec = self.course_spec(selections);

        let views = derive_dependent_views(
            &self.evaluator,
            &self.dataset,
            &institution_spec,
            &course_spec,
            &self.key_field,
            self.key_derivation,
        )?;

        log_cycle_summary(
            views.institutions.num_rows(),
            views.courses.num_rows(),
            views.key_set.as_ref().map(DerivedKeySet::len),
            start.elapsed(),
        );

        Ok(ExplorerViews {
            institutions: views.institutions,
            courses: views.courses,
            key_set: views.key_set,
        })
    }
}
