//! Raw tabular input as handed over by a table provider.
//!
//! A [`RawTable`] is an ordered list of rows over a named column set. Cells are
//! loosely typed [`Scalar`]s because source schemas vary wildly between
//! datasets: the same `date` column may arrive as a parquet timestamp, an ISO
//! string, or an RFC 2822 feed date.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

/// Columns with this prefix belong to the storage layer and never reach output.
pub const PRIVATE_COLUMN_PREFIX: char = '_';

/// A single loosely typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    /// Null cells and NaN floats are both treated as missing.
    pub fn is_null(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a mapping key (`by_symbol`, `articles_by_feed`, ...).
    pub fn key_string(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Str(s) => s.clone(),
            Scalar::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        }
    }

    /// JSON view of the cell. Non-finite floats become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::Str(s) => Value::String(s.clone()),
            Scalar::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
        }
    }

    /// Build a cell from a JSON value. Nested arrays/objects are kept as their
    /// JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null),
            },
            Value::String(s) => Scalar::Str(s.clone()),
            other => Scalar::Str(other.to_string()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Scalar::Int(_) | Scalar::Float(_) if !self.is_null() => 0,
            Scalar::Bool(_) => 1,
            Scalar::Str(_) => 2,
            Scalar::Timestamp(_) => 3,
            _ => 4,
        }
    }

    /// Total ordering used for key sets and data sorting.
    ///
    /// Numbers compare numerically across `Int`/`Float`, values of different
    /// kinds order by kind, and missing values always sort last.
    pub fn cmp_total(&self, other: &Scalar) -> Ordering {
        let (ra, rb) = (self.type_rank(), other.type_rank());
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Float(b)) => (*a as f64).total_cmp(b),
            (Scalar::Float(a), Scalar::Int(b)) => a.total_cmp(&(*b as f64)),
            (Scalar::Float(a), Scalar::Float(b)) => a.total_cmp(b),
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Str(a), Scalar::Str(b)) => a.cmp(b),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_none(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Scalar::Float(_) => serializer.serialize_none(),
            Scalar::Str(s) => serializer.serialize_str(s),
            Scalar::Timestamp(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(ts: DateTime<Utc>) -> Self {
        Scalar::Timestamp(ts)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("record {row} is not a JSON object")]
    NotAnObject { row: usize },
}

/// Ordered rows over a fixed set of named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl RawTable {
    pub fn new<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if seen.contains(&column) {
                return Err(TableError::DuplicateColumn(column));
            }
            seen.push(column);
        }
        Ok(Self {
            columns: seen,
            rows: Vec::new(),
        })
    }

    /// Build a table from column names and row-major cells.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Scalar>>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Build a table from JSON objects. Column order is order of first
    /// appearance; keys missing from a record become nulls.
    pub fn from_json_records(records: &[Value]) -> Result<Self, TableError> {
        let mut columns: Vec<String> = Vec::new();
        for (row, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or(TableError::NotAnObject { row })?;
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Self::new(columns.clone())?;
        for record in records {
            // Objects were checked above.
            if let Some(object) = record.as_object() {
                let row = columns
                    .iter()
                    .map(|c| object.get(c).map(Scalar::from_json).unwrap_or(Scalar::Null))
                    .collect();
                table.push_row(row)?;
            }
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Scalar>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn row(&self, index: usize) -> Option<&[Scalar]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Scalar]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Copy of the table without storage-internal (`_`-prefixed) columns.
    ///
    /// Normalizers always work on this copy; the caller's table is untouched.
    pub fn without_private_columns(&self) -> RawTable {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.starts_with(PRIVATE_COLUMN_PREFIX))
            .map(|(i, _)| i)
            .collect();

        RawTable {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}
