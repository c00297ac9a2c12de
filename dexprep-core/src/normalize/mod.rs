//! Category-parameterized normalization of raw tables into canonical
//! documents.
//!
//! [`normalize`] resolves the category's [`Descriptor`], takes a private copy of
//! the table with storage-internal columns removed, and hands it to the
//! statistic builder for that category. The builders share the helpers on
//! [`Input`]: column lookup, date coercion, key grouping, projection and the
//! `meta` block.

pub mod descriptor;

mod news;
mod price;
mod series;
mod stress;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::aggregate::{to_number, NotANumber};
use crate::category::Category;
use crate::document::{CanonicalDocument, DataRow, DateRange, Meta, Stats};
use crate::metadata::Metadata;
use crate::table::{RawTable, Scalar};
use crate::temporal::{self, coerce_timestamp, TemporalError};

pub use descriptor::{DataOrder, DateMode, Descriptor, Projection, StatSet};

/// Errors that fail a single dataset's normalization.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NormalizeError {
    #[error("column '{column}', row {row}: {source}")]
    InvalidDate {
        column: String,
        row: usize,
        #[source]
        source: TemporalError,
    },

    #[error("column '{column}', row {row}: {source}")]
    InvalidNumber {
        column: String,
        row: usize,
        #[source]
        source: NotANumber,
    },

    #[error("dataset '{0}' has no normalizer (unknown category)")]
    UnsupportedCategory(String),
}

/// Run-level values stamped into every document's `meta`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeContext {
    pub fetched_at: DateTime<Utc>,
    pub location: String,
    pub format: String,
}

impl NormalizeContext {
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at,
            location: "memory".to_string(),
            format: "table".to_string(),
        }
    }
}

/// Normalize one dataset.
///
/// The caller's table is never modified. Degenerate input (empty table,
/// missing key or date column) yields an empty document rather than an error;
/// malformed values on non-empty input are reported as [`NormalizeError`].
pub fn normalize(
    name: &str,
    category: Category,
    table: &RawTable,
    metadata: &Metadata,
    ctx: &NormalizeContext,
) -> Result<CanonicalDocument, NormalizeError> {
    let descriptor = category
        .descriptor()
        .ok_or_else(|| NormalizeError::UnsupportedCategory(name.to_string()))?;
    normalize_with(descriptor, name, table, metadata, ctx)
}

/// Normalize with an explicit descriptor.
pub fn normalize_with(
    descriptor: &'static Descriptor,
    name: &str,
    table: &RawTable,
    metadata: &Metadata,
    ctx: &NormalizeContext,
) -> Result<CanonicalDocument, NormalizeError> {
    let input = Input {
        descriptor,
        name,
        table: table.without_private_columns(),
        metadata,
        ctx,
    };

    match descriptor.stats {
        StatSet::Price => price::build(&input),
        StatSet::Series => series::build(&input),
        StatSet::News => news::build(&input),
        StatSet::Stress => stress::build(&input),
    }
}

/// A row that survived key and date filtering.
#[derive(Debug, Clone)]
pub(crate) struct DatedRow {
    pub index: usize,
    pub key: Scalar,
    pub at: DateTime<Utc>,
}

/// Shared state for one normalization call.
pub(crate) struct Input<'a> {
    pub descriptor: &'static Descriptor,
    pub name: &'a str,
    /// Private copy, public columns only.
    pub table: RawTable,
    pub metadata: &'a Metadata,
    pub ctx: &'a NormalizeContext,
}

impl Input<'_> {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.table.column_index(name)
    }

    fn cell(&self, row: usize, col: usize) -> &Scalar {
        static NULL: Scalar = Scalar::Null;
        self.table
            .row(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&NULL)
    }

    /// Read a numeric cell, failing the dataset on non-numeric text.
    pub fn number(&self, row: usize, col: usize) -> Result<Option<f64>, NormalizeError> {
        to_number(self.cell(row, col)).map_err(|source| NormalizeError::InvalidNumber {
            column: self.table.columns()[col].clone(),
            row,
            source,
        })
    }

    /// Rows with a usable timestamp, coerced per the descriptor's date mode.
    ///
    /// Rows with a missing date are skipped. When the key is required, rows
    /// with a missing key are skipped too; otherwise their key is null.
    pub fn dated_rows(
        &self,
        key: Option<usize>,
        date: usize,
    ) -> Result<Vec<DatedRow>, NormalizeError> {
        let mut rows = Vec::with_capacity(self.table.len());
        for (index, cells) in self.table.rows().enumerate() {
            let key_value = key.map(|k| cells[k].clone()).unwrap_or(Scalar::Null);
            if self.descriptor.key_required && key_value.is_null() {
                continue;
            }

            let at = match coerce_timestamp(&cells[date]) {
                Ok(Some(at)) => at,
                Ok(None) => continue,
                Err(_) if self.descriptor.date_mode == DateMode::DropUnparseable => continue,
                Err(source) => {
                    return Err(NormalizeError::InvalidDate {
                        column: self.descriptor.date_column.to_string(),
                        row: index,
                        source,
                    })
                }
            };

            rows.push(DatedRow {
                index,
                key: key_value,
                at,
            });
        }
        unify_keys(&mut rows);
        Ok(rows)
    }

    /// Columns emitted in `data`, with their table indices.
    pub fn projection(&self) -> Vec<(String, usize)> {
        match self.descriptor.projection {
            Projection::Columns(names) => names
                .iter()
                .filter_map(|n| self.column(n).map(|i| (n.to_string(), i)))
                .collect(),
            Projection::All => self
                .table
                .columns()
                .iter()
                .enumerate()
                .map(|(i, c)| (c.clone(), i))
                .collect(),
        }
    }

    /// Project one table row. When `at` is given, the date column is rendered
    /// from the coerced timestamp with `render`.
    pub fn project(
        &self,
        picks: &[(String, usize)],
        index: usize,
        at: Option<&DateTime<Utc>>,
        render: fn(&DateTime<Utc>) -> String,
    ) -> DataRow {
        let mut row = DataRow::new();
        for (name, col) in picks {
            let value = match at {
                Some(ts) if name == self.descriptor.date_column => Scalar::Str(render(ts)),
                _ => self.cell(index, *col).clone(),
            };
            row.push(name.clone(), value);
        }
        row
    }

    /// Build the document. `derived` fields are written into `meta` last.
    pub fn document(
        &self,
        record_count: usize,
        stats: Stats,
        data: Vec<DataRow>,
        derived: Vec<(&'static str, Value)>,
    ) -> CanonicalDocument {
        let description = self.metadata.description().unwrap_or_default().to_string();

        let mut meta = Meta::new();
        meta.insert("name".into(), Value::from(self.name));
        meta.insert("source_id".into(), Value::from(self.name));
        meta.insert("location".into(), Value::from(self.ctx.location.as_str()));
        meta.insert("format".into(), Value::from(self.ctx.format.as_str()));
        meta.insert("record_count".into(), Value::from(record_count));
        meta.insert(
            "columns".into(),
            Value::from(self.table.columns().to_vec()),
        );
        meta.insert("primary_keys".into(), self.metadata.primary_keys());
        meta.insert(
            "fetched_at".into(),
            Value::from(temporal::iso(&self.ctx.fetched_at)),
        );
        meta.insert("description".into(), Value::from(description.as_str()));

        for (key, value) in self.metadata.iter() {
            meta.insert(key.clone(), value.clone());
        }
        for (key, value) in derived {
            meta.insert(key.to_string(), value);
        }

        CanonicalDocument {
            name: self.name.to_string(),
            doc_type: self.descriptor.document_type,
            description,
            meta,
            stats,
            data,
        }
    }
}

/// Sorted distinct non-null values. Values rendering to the same mapping key
/// (`1` and `"1"`) count once; the lowest under [`Scalar::cmp_total`] is kept.
pub(crate) fn sorted_unique<'a>(values: impl Iterator<Item = &'a Scalar>) -> Vec<Scalar> {
    let mut out: Vec<Scalar> = values.filter(|v| !v.is_null()).cloned().collect();
    out.sort_by(|a, b| a.cmp_total(b));
    let mut seen = HashSet::new();
    out.retain(|v| seen.insert(v.key_string()));
    out
}

/// Rewrite keys that render to the same mapping key to one representative,
/// so they sort and group together instead of emitting duplicate object keys.
fn unify_keys(rows: &mut [DatedRow]) {
    let mut canonical: HashMap<String, Scalar> = HashMap::new();
    for row in rows.iter().filter(|r| !r.key.is_null()) {
        canonical
            .entry(row.key.key_string())
            .and_modify(|kept| {
                if row.key.cmp_total(kept).is_lt() {
                    *kept = row.key.clone();
                }
            })
            .or_insert_with(|| row.key.clone());
    }
    for row in rows.iter_mut().filter(|r| !r.key.is_null()) {
        if let Some(kept) = canonical.get(&row.key.key_string()) {
            row.key = kept.clone();
        }
    }
}

pub(crate) fn to_json_list(values: &[Scalar]) -> Value {
    Value::Array(values.iter().map(Scalar::to_json).collect())
}

/// Stable sort by key, then timestamp.
pub(crate) fn sort_by_key_then_date(rows: &mut [DatedRow]) {
    rows.sort_by(|a, b| a.key.cmp_total(&b.key).then(a.at.cmp(&b.at)));
}

/// Split rows (already sorted by key) into runs of equal key.
pub(crate) fn group_by_key(rows: &[DatedRow]) -> Vec<&[DatedRow]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        if i == rows.len() || !rows[i].key.cmp_total(&rows[start].key).is_eq() {
            if i > start {
                groups.push(&rows[start..i]);
            }
            start = i;
        }
    }
    groups
}

/// Overall date range of a set of rows.
pub(crate) fn date_range<'a>(stamps: impl Iterator<Item = &'a DateTime<Utc>>) -> DateRange {
    let mut bounds: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for ts in stamps {
        bounds = Some(match bounds {
            None => (*ts, *ts),
            Some((lo, hi)) => (lo.min(*ts), hi.max(*ts)),
        });
    }
    match bounds {
        Some((min, max)) => DateRange {
            min: Some(temporal::iso(&min)),
            max: Some(temporal::iso(&max)),
            days: temporal::whole_days(&min, &max),
        },
        None => DateRange::empty(),
    }
}
