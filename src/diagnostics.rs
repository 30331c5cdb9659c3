//! Data quality report for a loaded dataset

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::dataset::{Dataset, RowKey};
use crate::schema::census;

/// Missing values in one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingValues {
    pub column: String,
    pub count: usize,
    pub percent: f64,
}

/// Coverage and completeness of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub total_rows: usize,
    pub total_columns: usize,
    /// Distinct non-missing values per key column, for the key columns present
    pub distinct: Vec<(String, usize)>,
    /// Columns with at least one missing value, most missing first
    pub missing: Vec<MissingValues>,
}

impl DataQualityReport {
    /// Columns whose distinct values are counted
    pub const DISTINCT_COLUMNS: [&'static str; 4] =
        [census::CO_IES, census::NO_CURSO, census::SG_UF_IES, census::NO_MUNICIPIO];

    #[must_use]
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let batch = dataset.batch();
        let total_rows = batch.num_rows();

        let distinct = Self::DISTINCT_COLUMNS
            .iter()
            .filter_map(|name| {
                let column = batch.column_by_name(name)?;
                let values: FxHashSet<RowKey<'_>> = (0..column.len())
                    .map(|i| RowKey::at(column, i))
                    .filter(|key| *key != RowKey::Missing)
                    .collect();
                Some(((*name).to_string(), values.len()))
            })
            .collect();

        let mut missing: Vec<MissingValues> = batch
            .schema()
            .fields()
            .iter()
            .zip(batch.columns())
            .filter(|(_, column)| column.null_count() > 0)
            .map(|(field, column)| MissingValues {
                column: field.name().clone(),
                count: column.null_count(),
                percent: column.null_count() as f64 / total_rows as f64 * 100.0,
            })
            .collect();
        missing.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total_rows,
            total_columns: batch.num_columns(),
            distinct,
            missing,
        }
    }

    /// Distinct count for a key column, if it was present
    #[must_use]
    pub fn distinct_count(&self, column: &str) -> Option<usize> {
        self.distinct.iter().find(|(name, _)| name == column).map(|(_, n)| *n)
    }
}

/// The first `n` records of a dataset
#[must_use]
pub fn sample(dataset: &Dataset, n: usize) -> RecordBatch {
    dataset.batch().slice(0, n.min(dataset.num_rows()))
}
