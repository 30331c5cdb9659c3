//! Dataset loading
//!
//! The columnar snapshot is preferred. When it is missing or unreadable the
//! text source is read instead, every column as text, and the census
//! transform coerces it. If neither can be read, loading fails with
//! [`CensoError::DataUnavailable`](crate::error::CensoError::DataUnavailable).

use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::config::DatasetConfig;
use crate::dataset::{DataSource, Dataset};
use crate::error::Result;
use crate::error::util::{ensure_file, try_sources};
use crate::schema::{FieldDefinition, apply_census_transform, census_fields};
use crate::utils::logging::{create_spinner, finish_spinner, log_rows_read, log_source_read};

type SourceLoader<'a> = Box<dyn FnOnce(&Path) -> Result<(RecordBatch, DataSource)> + 'a>;

/// Read a Parquet file into a single record batch
pub fn read_parquet(path: &Path, batch_size: usize) -> Result<RecordBatch> {
    ensure_file(path)?;
    let file = File::open(path)?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.with_batch_size(batch_size).build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Read a CSV file with a header row into a single record batch
///
/// With `infer_types` unset every column is read as nullable text; empty
/// cells are missing.
pub fn read_csv(path: &Path, batch_size: usize, infer_types: bool) -> Result<RecordBatch> {
    ensure_file(path)?;
    let mut file = File::open(path)?;

    let format = Format::default().with_header(true);
    let max_records = if infer_types { None } else { Some(0) };
    let (inferred, _) = format.infer_schema(&mut file, max_records)?;
    file.rewind()?;

    let schema: SchemaRef = if infer_types {
        Arc::new(inferred)
    } else {
        Arc::new(Schema::new(
            inferred
                .fields()
                .iter()
                .map(|f| Field::new(f.name(), DataType::Utf8, true))
                .collect::<Vec<_>>(),
        ))
    };

    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .with_batch_size(batch_size)
        .build(file)?;

    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Loads the census dataset from the configured sources
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    config: DatasetConfig,
    fields: Vec<FieldDefinition>,
}

impl DatasetLoader {
    /// Create a loader applying the census column definitions
    #[must_use]
    pub fn new(config: DatasetConfig) -> Self {
        Self {
            config,
            fields: census_fields(),
        }
    }

    /// Use different column definitions for the transform
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<FieldDefinition>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Load and transform the dataset
    ///
    /// # Errors
    /// Returns [`DataUnavailable`](crate::error::CensoError::DataUnavailable)
    /// if no source can be read
    pub fn load(&self) -> Result<Dataset> {
        self.load_with(true)
    }

    /// Load the dataset without coercing or relabelling census columns
    pub fn load_raw(&self) -> Result<Dataset> {
        self.load_with(false)
    }

    fn load_with(&self, transform: bool) -> Result<Dataset> {
        let start = Instant::now();
        let batch_size = self.config.batch_size;
        let spinner = self
            .config
            .show_progress
            .then(|| create_spinner(Some("Loading census data...")));

        let sources: Vec<(PathBuf, SourceLoader<'_>)> = vec![
            (
                self.config.parquet_path.clone(),
                Box::new(move |path: &Path| {
                    log_source_read("Reading parquet snapshot", path);
                    let batch = read_parquet(path, batch_size)?;
                    Ok((batch, DataSource::Parquet(path.to_path_buf())))
                }),
            ),
            (
                self.config.csv_path.clone(),
                Box::new(move |path: &Path| {
                    log_source_read("Reading CSV source", path);
                    let batch = read_csv(path, batch_size, false)?;
                    Ok((batch, DataSource::Csv(path.to_path_buf())))
                }),
            ),
        ];

        let loaded = try_sources("Loading dataset", sources);
        if let Some(spinner) = &spinner {
            finish_spinner(spinner, None);
        }
        let (batch, source) = loaded?;

        let batch = if transform {
            apply_census_transform(&batch, &self.fields)?
        } else {
            batch
        };

        log_rows_read(&source, batch.num_rows(), start.elapsed());
        let dataset = Dataset::new(batch, source)?;

        Ok(dataset)
    }
}

/// Convert a CSV file into a Snappy-compressed Parquet snapshot
///
/// Column types are inferred from the whole file. Returns the number of
/// rows written.
pub fn convert_csv_to_parquet(csv_path: &Path, parquet_path: &Path, batch_size: usize) -> Result<usize> {
    let start = Instant::now();
    log_source_read("Converting to parquet", csv_path);

    let batch = read_csv(csv_path, batch_size, true)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let file = File::create(parquet_path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    log_rows_read(&DataSource::Csv(csv_path.to_path_buf()), batch.num_rows(), start.elapsed());
    log_source_read("Wrote parquet snapshot", parquet_path);
    Ok(batch.num_rows())
}
