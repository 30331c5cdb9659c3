//! Aggregates over filtered course views

use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::dataset::{DatasetView, RowKey};
use crate::error::Result;
use crate::rows::CourseRow;

/// Count the non-missing values of a column
///
/// Sorted by count, descending; equal counts are ordered by label.
pub fn value_counts(view: &DatasetView, column: &str) -> Result<Vec<(String, usize)>> {
    let array = view.column(column)?;
    let mut counts: FxHashMap<RowKey<'_>, (usize, usize)> = FxHashMap::default();

    for i in 0..array.len() {
        let key = RowKey::at(array, i);
        if key == RowKey::Missing {
            continue;
        }
        counts.entry(key).or_insert((i, 0)).1 += 1;
    }

    let mut labelled = Vec::with_capacity(counts.len());
    for (first_row, count) in counts.into_values() {
        labelled.push((array_value_to_string(array, first_row)?, count));
    }

    Ok(labelled
        .into_iter()
        .sorted_by(|(a_label, a_count), (b_label, b_count)| {
            b_count.cmp(a_count).then_with(|| a_label.cmp(b_label))
        })
        .collect())
}

/// The `n` most frequent values of a column
pub fn top_n(view: &DatasetView, column: &str, n: usize) -> Result<Vec<(String, usize)>> {
    let mut counts = value_counts(view, column)?;
    counts.truncate(n);
    Ok(counts)
}

/// One row of the competition table
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionRow {
    pub course: Option<String>,
    pub institution: Option<String>,
    /// Candidates per seat, rounded to two decimals
    pub candidates_per_seat: f64,
    pub inscribed: f64,
    pub seats: f64,
}

/// Candidates per seat for every course with positive inscriptions and seats
///
/// Sorted by candidates per seat, descending; ties keep view order.
pub fn competition_table(view: &DatasetView) -> Result<Vec<CompetitionRow>> {
    let rows: Vec<CourseRow> = view.records()?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let ratio = row.candidates_per_seat()?;
            Some(CompetitionRow {
                candidates_per_seat: (ratio * 100.0).round() / 100.0,
                inscribed: row.qt_inscrito_total?,
                seats: row.qt_vg_total?,
                course: row.no_curso,
                institution: row.no_ies,
            })
        })
        .sorted_by(|a, b| b.candidates_per_seat.total_cmp(&a.candidates_per_seat))
        .collect())
}
