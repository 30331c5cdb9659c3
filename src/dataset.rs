//! The loaded dataset and the views produced by filtering it
//!
//! A [`Dataset`] is loaded once and never mutated. A [`DatasetView`] keeps
//! both the materialized rows and the positions they came from, so views
//! produced by different evaluators can be compared row for row.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;
use serde::de::DeserializeOwned;

use crate::error::{CensoError, Result};
use crate::schema::normalize_batch;

static NEXT_DATASET_ID: AtomicU64 = AtomicU64::new(1);

/// Where a dataset was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Columnar snapshot
    Parquet(PathBuf),
    /// Text file with a header row
    Csv(PathBuf),
    /// Built in memory (tests, fixtures)
    Memory,
}

/// An immutable, fully loaded record collection
#[derive(Debug)]
pub struct Dataset {
    id: u64,
    batch: RecordBatch,
    source: DataSource,
}

impl Dataset {
    /// Wrap a record batch, normalizing its columns
    ///
    /// # Errors
    /// Returns an error if a column cannot be normalized or the batch has
    /// more rows than can be addressed
    pub fn new(batch: RecordBatch, source: DataSource) -> Result<Self> {
        if u32::try_from(batch.num_rows()).is_err() {
            return Err(CensoError::configuration(format!(
                "Dataset has {} rows, more than can be addressed",
                batch.num_rows()
            )));
        }

        Ok(Self {
            id: NEXT_DATASET_ID.fetch_add(1, Ordering::Relaxed),
            batch: normalize_batch(&batch)?,
            source,
        })
    }

    /// Process-unique identity of this dataset
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// All records as a single batch
    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    #[must_use]
    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| CensoError::configuration(format!("Column '{name}' not found in dataset")))
    }
}

/// An ordered subset of a dataset's records
#[derive(Debug, Clone)]
pub struct DatasetView {
    rows: UInt32Array,
    batch: RecordBatch,
}

impl DatasetView {
    /// A view containing every record in original order
    #[must_use]
    pub fn full(dataset: &Dataset) -> Self {
        let rows = (0..dataset.num_rows() as u32).collect::<Vec<_>>();
        Self {
            rows: UInt32Array::from(rows),
            batch: dataset.batch().clone(),
        }
    }

    /// Materialize the given source positions, in the order given
    pub fn from_rows(dataset: &Dataset, rows: UInt32Array) -> Result<Self> {
        let batch = take_record_batch(dataset.batch(), &rows)?;
        Ok(Self { rows, batch })
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the filters matched nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Positions of the selected records in the source dataset
    #[must_use]
    pub fn row_ids(&self) -> &[u32] {
        self.rows.values()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| CensoError::configuration(format!("Column '{name}' not found in view")))
    }

    /// Keep the first record for each distinct value of `field`
    ///
    /// Order is preserved. Missing values form a single group.
    pub fn dedup_by(&self, field: &str) -> Result<Self> {
        let column = self.column(field)?;
        let mut seen = FxHashSet::default();
        let positions: Vec<u32> = (0..column.len())
            .filter(|&i| seen.insert(RowKey::at(column, i)))
            .map(|i| i as u32)
            .collect();

        if positions.len() == self.num_rows() {
            return Ok(self.clone());
        }

        let rows = UInt32Array::from_iter_values(positions.iter().map(|&p| self.rows.value(p as usize)));
        let batch = take_record_batch(&self.batch, &UInt32Array::from(positions))?;
        Ok(Self { rows, batch })
    }

    /// Deserialize the records into typed rows
    ///
    /// Struct fields absent from the view must be `Option`s; extra columns
    /// are ignored.
    pub fn records<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        Ok(serde_arrow::from_record_batch(&self.batch)?)
    }
}

/// A hashable cell value of a normalized column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RowKey<'a> {
    Missing,
    Integer(i64),
    Text(&'a str),
    Float(u64),
}

impl<'a> RowKey<'a> {
    /// Key of row `i` of a `Utf8`, `Int64` or `Float64` column
    pub(crate) fn at(column: &'a ArrayRef, i: usize) -> Self {
        if column.is_null(i) {
            return Self::Missing;
        }
        if let Some(ints) = column.as_any().downcast_ref::<Int64Array>() {
            return Self::Integer(ints.value(i));
        }
        if let Some(strings) = column.as_any().downcast_ref::<StringArray>() {
            return Self::Text(strings.value(i));
        }
        if let Some(floats) = column.as_any().downcast_ref::<Float64Array>() {
            // -0.0 and 0.0 are the same key
            return Self::Float((floats.value(i) + 0.0).to_bits());
        }
        Self::Missing
    }
}
