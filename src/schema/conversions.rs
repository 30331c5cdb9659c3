//! Array conversions applied while loading
//!
//! Conversion never fails on bad cell values: anything that cannot be read
//! as the target type becomes null, the missing sentinel.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, new_null_array};
use arrow::compute::kernels::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::schema::FieldDefinition;

/// Normalize an array to `Utf8`, `Int64` or `Float64`
///
/// Integer types widen to `Int64`, floating types to `Float64` (with NaN
/// turned into null) and everything else is rendered as text.
pub fn normalize_array(array: &ArrayRef) -> Result<ArrayRef> {
    match array.data_type() {
        DataType::Utf8 | DataType::Int64 => Ok(array.clone()),
        DataType::Float64 => Ok(nan_to_null(array)),
        DataType::Null => Ok(new_null_array(&DataType::Utf8, array.len())),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Boolean => Ok(cast::cast(array, &DataType::Int64)?),
        DataType::Float16 | DataType::Float32 => {
            let widened = cast::cast(array, &DataType::Float64)?;
            Ok(nan_to_null(&widened))
        }
        _ => Ok(cast::cast(array, &DataType::Utf8)?),
    }
}

/// Coerce an array to `Float64`, substituting null for anything unparseable
pub fn coerce_numeric(array: &ArrayRef) -> Result<ArrayRef> {
    let source = match array.as_any().downcast_ref::<StringArray>() {
        Some(strings) => {
            let trimmed: StringArray = strings.iter().map(|v| v.map(str::trim)).collect();
            Arc::new(trimmed) as ArrayRef
        }
        None => normalize_array(array)?,
    };

    // The default cast options are "safe": failures produce nulls
    let floats = cast::cast(&source, &DataType::Float64)?;
    Ok(nan_to_null(&floats))
}

/// Coerce an array to `Int64`
///
/// Values are read as numbers first, so `"123.0"` becomes 123 while
/// `"12.5"` and `"n/a"` become null.
pub fn coerce_integer(array: &ArrayRef) -> Result<ArrayRef> {
    if array.data_type() == &DataType::Int64 {
        return Ok(array.clone());
    }

    let floats = coerce_numeric(array)?;
    let Some(floats) = floats.as_any().downcast_ref::<Float64Array>() else {
        return Ok(new_null_array(&DataType::Int64, array.len()));
    };

    let integers: Int64Array = floats
        .iter()
        .map(|v| v.filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .collect();
    Ok(Arc::new(integers))
}

/// Replace integer codes with the labels of a `Category` field
///
/// Unknown codes become null. Values that already are labels are kept, so
/// a snapshot that was converted after labelling loads the same way.
pub fn map_codes(array: &ArrayRef, definition: &FieldDefinition) -> Result<ArrayRef> {
    let normalized = normalize_array(array)?;
    let text = normalized.as_any().downcast_ref::<StringArray>();
    let codes = coerce_numeric(array)?;
    let codes = codes
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .unwrap_or_else(|| Float64Array::from(vec![None::<f64>; array.len()]));

    let labels: StringArray = (0..array.len())
        .map(|i| {
            if let Some(text) = text {
                if text.is_valid(i) && definition.is_label(text.value(i)) {
                    return Some(text.value(i).to_string());
                }
            }
            if codes.is_null(i) {
                return None;
            }
            definition.label_for(codes.value(i)).map(str::to_string)
        })
        .collect();

    Ok(Arc::new(labels))
}

/// Normalize every column of a batch with [`normalize_array`]
pub fn normalize_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let normalized = normalize_array(column)?;
        fields.push(Field::new(field.name(), normalized.data_type().clone(), true));
        columns.push(normalized);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Null out NaN values in a `Float64` array
fn nan_to_null(array: &ArrayRef) -> ArrayRef {
    match array.as_any().downcast_ref::<Float64Array>() {
        Some(floats) if floats.iter().any(|v| v.is_some_and(f64::is_nan)) => {
            let cleaned: Float64Array = floats.iter().map(|v| v.filter(|f| !f.is_nan())).collect();
            Arc::new(cleaned)
        }
        _ => array.clone(),
    }
}
