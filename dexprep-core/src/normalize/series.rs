//! Macro series (FRED/BLS): statistics per `series_id`.

use crate::aggregate::{round4, RunningStats};
use crate::document::{CanonicalDocument, DateRange, KeyedMap, SeriesStats, Stats};
use crate::table::Scalar;
use crate::temporal;

use super::{
    date_range, group_by_key, sort_by_key_then_date, to_json_list, DatedRow, Input,
    NormalizeError,
};

pub(super) fn build(input: &Input<'_>) -> Result<CanonicalDocument, NormalizeError> {
    let descriptor = input.descriptor;
    let (Some(key), Some(date)) = (
        input.column(descriptor.key_column()),
        input.column(descriptor.date_column),
    ) else {
        return Ok(empty(input));
    };
    if input.table.is_empty() {
        return Ok(empty(input));
    }

    let mut rows = input.dated_rows(Some(key), date)?;
    if rows.is_empty() {
        return Ok(empty(input));
    }
    sort_by_key_then_date(&mut rows);

    let value = input.column("value");

    let mut series = Vec::new();
    let mut by_series = KeyedMap::new();
    for group in group_by_key(&rows) {
        let first = &group[0];
        let last = &group[group.len() - 1];

        let mut values = RunningStats::new();
        let mut latest = None;
        if let Some(col) = value {
            for row in group {
                if let Some(x) = input.number(row.index, col)? {
                    values.push(x);
                }
            }
            // Rows are date-ordered, so the last row is the latest observation.
            latest = input.number(last.index, col)?;
        }

        // Descriptive columns are constant per series; the first table row wins.
        let lead = group.iter().min_by_key(|r| r.index).unwrap_or(first);
        by_series.insert(
            first.key.key_string(),
            SeriesStats {
                title: descriptive(input, lead, "title")
                    .unwrap_or_else(|| Scalar::Str(first.key.key_string())),
                units: descriptive(input, lead, "units").unwrap_or_else(|| Scalar::from("")),
                frequency: descriptive(input, lead, "frequency")
                    .unwrap_or_else(|| Scalar::from("")),
                count: group.len(),
                date_min: temporal::iso(&first.at),
                date_max: temporal::iso(&last.at),
                value_mean: values.mean().map(round4),
                value_min: values.min().map(round4),
                value_max: values.max().map(round4),
                value_latest: latest.map(round4),
            },
        );
        series.push(first.key.clone());
    }

    let picks = input.projection();
    let data = rows
        .iter()
        .map(|r| input.project(&picks, r.index, Some(&r.at), temporal::day))
        .collect();

    let stats = Stats::Series {
        date_range: date_range(rows.iter().map(|r| &r.at)),
        by_series,
    };
    Ok(input.document(
        rows.len(),
        stats,
        data,
        vec![("series", to_json_list(&series))],
    ))
}

/// Value of a descriptive column on the given row, `None` if the column is absent.
fn descriptive(input: &Input<'_>, row: &DatedRow, column: &str) -> Option<Scalar> {
    let col = input.column(column)?;
    input
        .table
        .row(row.index)
        .and_then(|cells| cells.get(col))
        .cloned()
}

fn empty(input: &Input<'_>) -> CanonicalDocument {
    let stats = Stats::Series {
        date_range: DateRange::empty(),
        by_series: KeyedMap::new(),
    };
    input.document(0, stats, Vec::new(), vec![("series", to_json_list(&[]))])
}
