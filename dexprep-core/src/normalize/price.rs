//! OHLCV price series: statistics per `symbol`.

use crate::aggregate::{round4, RunningStats};
use crate::document::{CanonicalDocument, DateRange, KeyedMap, Stats, SymbolStats};
use crate::temporal;

use super::{
    date_range, group_by_key, sort_by_key_then_date, to_json_list, Input, NormalizeError,
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

    let close = input.column("close");
    let volume = input.column("volume");

    let mut symbols = Vec::new();
    let mut by_symbol = KeyedMap::new();
    for group in group_by_key(&rows) {
        let first = &group[0];
        let last = &group[group.len() - 1];

        let mut closes = RunningStats::new();
        let mut volume_sum = 0.0;
        for row in group {
            if let Some(col) = close {
                if let Some(x) = input.number(row.index, col)? {
                    closes.push(x);
                }
            }
            if let Some(col) = volume {
                if let Some(v) = input.number(row.index, col)? {
                    volume_sum += v;
                }
            }
        }

        let has_close = close.is_some();
        by_symbol.insert(
            first.key.key_string(),
            SymbolStats {
                count: group.len(),
                date_min: temporal::iso(&first.at),
                date_max: temporal::iso(&last.at),
                close_mean: closes.mean().map(round4),
                close_min: closes.min().map(round4),
                close_max: closes.max().map(round4),
                close_std: has_close.then(|| round4(closes.sample_std())),
                volume_total: volume.map(|_| volume_sum as i64),
            },
        );
        symbols.push(first.key.clone());
    }

    let picks = input.projection();
    let data = rows
        .iter()
        .map(|r| input.project(&picks, r.index, Some(&r.at), temporal::day))
        .collect();

    let stats = Stats::Price {
        date_range: date_range(rows.iter().map(|r| &r.at)),
        by_symbol,
    };
    Ok(input.document(
        rows.len(),
        stats,
        data,
        vec![("symbols", to_json_list(&symbols))],
    ))
}

fn empty(input: &Input<'_>) -> CanonicalDocument {
    let stats = Stats::Price {
        date_range: DateRange::empty(),
        by_symbol: KeyedMap::new(),
    };
    input.document(0, stats, Vec::new(), vec![("symbols", to_json_list(&[]))])
}
