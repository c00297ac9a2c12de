//! Fed stress-test scenario tables.
//!
//! Periods are quarter labels (`2025 Q1`), kept as text. The date range
//! reports the first and last label and `days` is always 0.

use std::cmp::Ordering;

use crate::document::{CanonicalDocument, DateRange, Stats};
use crate::table::Scalar;

use super::descriptor::DataOrder;
use super::{sorted_unique, to_json_list, Input, NormalizeError};

pub(super) fn build(input: &Input<'_>) -> Result<CanonicalDocument, NormalizeError> {
    let table = &input.table;
    let distinct = |column: &str| -> Vec<Scalar> {
        match input.column(column) {
            Some(col) => sorted_unique(table.rows().map(|cells| &cells[col])),
            None => Vec::new(),
        }
    };

    let years = distinct("year");
    let scenarios = distinct("table");

    let mut periods: Vec<String> = distinct(input.descriptor.date_column)
        .iter()
        .map(Scalar::key_string)
        .collect();
    periods.sort();
    periods.dedup();
    let date_range = DateRange {
        min: periods.first().cloned(),
        max: periods.last().cloned(),
        days: 0,
    };

    let sort_columns: Vec<usize> = match input.descriptor.order {
        DataOrder::PresentColumns(names) => names.iter().filter_map(|n| input.column(n)).collect(),
        _ => Vec::new(),
    };
    let mut order: Vec<usize> = (0..table.len()).collect();
    if !sort_columns.is_empty() {
        order.sort_by(|&a, &b| compare_rows(input, a, b, &sort_columns));
    }

    let picks = input.projection();
    let data = order
        .iter()
        .map(|&i| input.project(&picks, i, None, |_| String::new()))
        .collect();

    let stats = Stats::Stress {
        date_range,
        years: years.clone(),
        scenarios: scenarios.clone(),
        record_count: table.len(),
    };
    Ok(input.document(
        table.len(),
        stats,
        data,
        vec![
            ("years", to_json_list(&years)),
            ("scenarios", to_json_list(&scenarios)),
        ],
    ))
}

fn compare_rows(input: &Input<'_>, a: usize, b: usize, columns: &[usize]) -> Ordering {
    let (Some(ra), Some(rb)) = (input.table.row(a), input.table.row(b)) else {
        return Ordering::Equal;
    };
    columns
        .iter()
        .map(|&c| ra[c].cmp_total(&rb[c]))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}
