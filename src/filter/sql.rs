//! Predicate evaluation through an embedded SQL engine
//!
//! The dataset is registered once as a table in an in-memory SQLite
//! database, with an extra column holding each record's position. Columns
//! are stored under positional aliases, since SQLite compares names without
//! regard to case and dataset names need not be distinct that way. A filter
//! specification is translated into a parameterized `SELECT` of those
//! positions; selection values are always bound, never spliced into the
//! query text.

use std::sync::Mutex;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, UInt32Array};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};

use crate::dataset::Dataset;
use crate::error::{CensoError, Result};
use crate::filter::core::PredicateEvaluator;
use crate::filter::criterion::{FilterCriterion, LiteralValue};
use crate::filter::error::{column_not_found, column_type_error, non_numeric_minimum};
use crate::filter::spec::FilterSpec;
use crate::schema::{StorageType, column_storage};

/// Table the dataset is registered as
pub const TABLE_NAME: &str = "records";

/// Hidden column holding each record's position in the dataset
pub const ROW_ID_COLUMN: &str = "__censo_row_id";

/// A query and its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Quote an identifier for use in SQL text
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQL name of the dataset column at `index`
fn column_alias(index: usize) -> String {
    quote_identifier(&format!("c{index}"))
}

/// Translate a specification into a query selecting matching positions
///
/// # Errors
/// Returns a configuration error for unknown columns and for minimums on
/// text columns
pub fn build_query(dataset: &Dataset, spec: &FilterSpec) -> Result<SqlQuery> {
    let schema = dataset.schema();
    let row_id = quote_identifier(ROW_ID_COLUMN);
    let mut clauses = Vec::with_capacity(spec.len());
    let mut params = Vec::new();

    for criterion in spec {
        let field = criterion.field();
        let storage = column_storage(&schema, field)?;
        let column = column_alias(schema.index_of(field).map_err(|_| column_not_found(field))?);

        match criterion {
            FilterCriterion::Min(_, threshold) => {
                if !storage.is_numeric() {
                    return Err(non_numeric_minimum(field));
                }
                // integers are compared as f64, the same as in memory
                if storage == StorageType::Integer {
                    clauses.push(format!("CAST({column} AS REAL) >= ?"));
                } else {
                    clauses.push(format!("{column} >= ?"));
                }
                params.push(Value::Real(*threshold));
            }
            FilterCriterion::Eq(..) | FilterCriterion::In(..) => {
                let values = criterion.coerced_values(storage);
                if values.is_empty() {
                    clauses.push("1 = 0".to_string());
                    continue;
                }
                if let (FilterCriterion::Eq(..), 1) = (criterion, values.len()) {
                    clauses.push(format!("{column} = ?"));
                } else {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    clauses.push(format!("{column} IN ({placeholders})"));
                }
                params.extend(values.into_iter().map(to_sql_value));
            }
        }
    }

    let mut sql = format!("SELECT {row_id} FROM {}", quote_identifier(TABLE_NAME));
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY {row_id}"));

    Ok(SqlQuery { sql, params })
}

fn to_sql_value(value: LiteralValue) -> Value {
    match value {
        LiteralValue::Int(n) => Value::Integer(n),
        LiteralValue::Float(f) => Value::Real(f),
        LiteralValue::String(s) => Value::Text(s),
    }
}

/// Typed access to one registered column
enum ColumnCells<'a> {
    Text(&'a StringArray),
    Integer(&'a Int64Array),
    Float(&'a Float64Array),
}

impl<'a> ColumnCells<'a> {
    fn new(name: &str, column: &'a ArrayRef, storage: StorageType) -> Result<Self> {
        let any = column.as_any();
        let cells = match storage {
            StorageType::Text => any.downcast_ref::<StringArray>().map(Self::Text),
            StorageType::Integer => any.downcast_ref::<Int64Array>().map(Self::Integer),
            StorageType::Float => any.downcast_ref::<Float64Array>().map(Self::Float),
        };
        cells.ok_or_else(|| column_type_error(name, storage))
    }

    fn value(&self, i: usize) -> Value {
        match self {
            Self::Text(a) if a.is_valid(i) => Value::Text(a.value(i).to_string()),
            Self::Integer(a) if a.is_valid(i) => Value::Integer(a.value(i)),
            Self::Float(a) if a.is_valid(i) => Value::Real(a.value(i)),
            _ => Value::Null,
        }
    }
}

/// Evaluates specifications by querying an in-memory SQLite copy of a dataset
#[derive(Debug)]
pub struct QueryEngineEvaluator {
    conn: Mutex<Connection>,
    dataset_id: u64,
}

impl QueryEngineEvaluator {
    /// Register a dataset with a fresh in-memory database
    ///
    /// # Errors
    /// Returns an error if a column is not normalized or the database
    /// rejects the data
    pub fn new(dataset: &Dataset) -> Result<Self> {
        let schema = dataset.schema();
        let mut definitions = vec![format!("{} INTEGER PRIMARY KEY", quote_identifier(ROW_ID_COLUMN))];
        let mut columns = Vec::with_capacity(schema.fields().len());
        for (index, (field, array)) in schema.fields().iter().zip(dataset.batch().columns()).enumerate() {
            let storage = StorageType::of(field.data_type()).ok_or_else(|| {
                CensoError::configuration(format!(
                    "Column '{}' has unsupported type {}",
                    field.name(),
                    field.data_type()
                ))
            })?;
            definitions.push(format!("{} {}", column_alias(index), storage.sql_type()));
            columns.push(ColumnCells::new(field.name(), array, storage)?);
        }

        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch(&format!(
            "CREATE TABLE {} ({})",
            quote_identifier(TABLE_NAME),
            definitions.join(", ")
        ))?;

        let placeholders = vec!["?"; columns.len() + 1].join(", ");
        let insert = format!("INSERT INTO {} VALUES ({placeholders})", quote_identifier(TABLE_NAME));

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert)?;
            let mut row = Vec::with_capacity(columns.len() + 1);
            for i in 0..dataset.num_rows() {
                row.clear();
                row.push(Value::Integer(i as i64));
                row.extend(columns.iter().map(|c| c.value(i)));
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        debug!(
            "Registered {} rows with {} columns in query engine",
            dataset.num_rows(),
            columns.len()
        );

        Ok(Self {
            conn: Mutex::new(conn),
            dataset_id: dataset.id(),
        })
    }

    fn run(&self, query: &SqlQuery) -> Result<Vec<u32>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| CensoError::configuration("Query engine connection poisoned".to_string()))?;
        let mut stmt = conn.prepare_cached(&query.sql)?;
        let ids = stmt.query_map(params_from_iter(query.params.iter()), |row| row.get::<_, i64>(0))?;

        let mut rows = Vec::new();
        for id in ids {
            let id = id?;
            let id = u32::try_from(id)
                .map_err(|_| CensoError::configuration(format!("Row position {id} out of range")))?;
            rows.push(id);
        }
        Ok(rows)
    }
}

impl PredicateEvaluator for QueryEngineEvaluator {
    fn name(&self) -> &'static str {
        "query-engine"
    }

    fn select_rows(&self, dataset: &Dataset, spec: &FilterSpec) -> Result<UInt32Array> {
        if dataset.id() != self.dataset_id {
            return Err(CensoError::configuration(format!(
                "Query engine holds dataset {}, asked to filter dataset {}",
                self.dataset_id,
                dataset.id()
            )));
        }

        let query = build_query(dataset, spec)?;
        debug!("{}: {} ({} params)", self.name(), query.sql, query.params.len());
        Ok(UInt32Array::from(self.run(&query)?))
    }
}
