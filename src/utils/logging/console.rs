//! Plain-text reports printed by the binaries

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

use crate::diagnostics::DataQualityReport;
use crate::explorer::ExplorerViews;

/// Print the size of each view of an explorer cycle
pub fn print_view_summary(views: &ExplorerViews, elapsed: std::time::Duration) {
    println!("Evaluated filters in {elapsed:?}");
    println!("Institutions: {}", views.institutions.num_rows());
    println!("Courses: {}", views.courses.num_rows());
    match &views.key_set {
        Some(keys) => println!("Courses restricted to {} institution keys", keys.len()),
        None => println!("No institution filter active"),
    }
}

/// Print detailed schema information from a batch
pub fn print_schema_info(batch: &RecordBatch) {
    println!("Schema:");
    for field in batch.schema().fields() {
        println!("  - {} ({})", field.name(), field.data_type());
    }
}

/// Print sample rows from a batch
pub fn print_sample_rows(batch: &RecordBatch, num_rows: usize) {
    let schema = batch.schema();
    println!("First {} rows:", num_rows.min(batch.num_rows()));
    for row_idx in 0..num_rows.min(batch.num_rows()) {
        let cells = batch
            .columns()
            .iter()
            .zip(schema.fields())
            .map(|(column, field)| {
                let value = if column.is_null(row_idx) {
                    "NULL".to_string()
                } else {
                    array_value_to_string(column, row_idx).unwrap_or_else(|_| "?".to_string())
                };
                format!("{}: {value}", field.name())
            })
            .collect::<Vec<_>>();
        println!("Row {row_idx}: [{}]", cells.join(", "));
    }
}

/// Print a data quality report
pub fn print_quality_report(report: &DataQualityReport) {
    println!("Total rows: {}", report.total_rows);
    println!("Total columns: {}", report.total_columns);
    for (column, count) in &report.distinct {
        println!("Distinct {column}: {count}");
    }
    if report.missing.is_empty() {
        println!("No missing values");
        return;
    }
    println!("Missing values:");
    for missing in &report.missing {
        println!("  - {}: {} ({:.2}%)", missing.column, missing.count, missing.percent);
    }
}
