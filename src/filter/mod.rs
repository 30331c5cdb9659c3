//! Filtering for census datasets
//!
//! Selections on field controls are translated into a [`FilterSpec`], a
//! conjunction of [`FilterCriterion`]s. A [`PredicateEvaluator`] turns the
//! specification into a [`DatasetView`](crate::dataset::DatasetView). Two
//! evaluators are provided and must agree record for record: one running
//! Arrow kernels in memory, one querying an embedded SQL engine.

pub mod builder;
pub mod core;
pub mod criterion;
pub mod dependent;
pub mod error;
pub mod memory;
pub mod spec;
pub mod sql;

use std::fmt;
use std::str::FromStr;

pub use builder::{ControlKind, FieldControl, FilterSpecBuilder, Selection, Selections};
pub use self::core::{PredicateEvaluator, mask_to_rows};
pub use criterion::{CriterionKind, FilterCriterion, LiteralValue, ValueSet};
pub use dependent::{DependentViews, DerivedKeySet, KeyDerivation, derive_dependent_views, restrict_to_keys};
pub use memory::InMemoryEvaluator;
pub use spec::FilterSpec;
pub use sql::{QueryEngineEvaluator, SqlQuery};

use crate::dataset::Dataset;
use crate::error::{CensoError, Result};

/// Available evaluation strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Arrow compute kernels over the loaded columns
    #[default]
    InMemory,
    /// Parameterized queries against an embedded SQLite copy
    QueryEngine,
}

impl Strategy {
    /// Create an evaluator for a dataset
    ///
    /// # Errors
    /// Returns an error if the dataset cannot be registered with the query engine
    pub fn evaluator(self, dataset: &Dataset) -> Result<Box<dyn PredicateEvaluator + Send + Sync>> {
        Ok(match self {
            Self::InMemory => Box::new(InMemoryEvaluator),
            Self::QueryEngine => Box::new(QueryEngineEvaluator::new(dataset)?),
        })
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory => write!(f, "memory"),
            Self::QueryEngine => write!(f, "sql"),
        }
    }
}

impl FromStr for Strategy {
    type Err = CensoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::InMemory),
            "sql" | "query-engine" | "sqlite" => Ok(Self::QueryEngine),
            other => Err(CensoError::configuration(format!("Unknown strategy '{other}'"))),
        }
    }
}
