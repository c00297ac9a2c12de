//! The canonical dataset document: the contract between normalizers and the
//! publisher.
//!
//! Every category produces the same top-level shape
//! (`name`, `type`, `description`, `meta`, `stats`, `data`); only the
//! aggregates inside `stats` and the derived key-set field in `meta` differ.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::table::Scalar;

/// Free-form `meta` block.
pub type Meta = Map<String, Value>;

/// Published document type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Ohlcv,
    Fred,
    Bls,
    Rss,
    FedStress,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Ohlcv,
        DocumentType::Fred,
        DocumentType::Bls,
        DocumentType::Rss,
        DocumentType::FedStress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Ohlcv => "ohlcv",
            DocumentType::Fred => "fred",
            DocumentType::Bls => "bls",
            DocumentType::Rss => "rss",
            DocumentType::FedStress => "fed_stress",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `stats.date_range`. Bounds are null and `days` is 0 when nothing is dated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub min: Option<String>,
    pub max: Option<String>,
    pub days: i64,
}

impl DateRange {
    pub fn empty() -> Self {
        Self {
            min: None,
            max: None,
            days: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// String-keyed mapping that serializes in insertion order.
///
/// Per-key statistics are inserted in the sorted order of the key column, and
/// that order must survive into the published JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> KeyedMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        self.entries.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for KeyedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize> Serialize for KeyedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Per-symbol price statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolStats {
    pub count: usize,
    pub date_min: String,
    pub date_max: String,
    pub close_mean: Option<f64>,
    pub close_min: Option<f64>,
    pub close_max: Option<f64>,
    pub close_std: Option<f64>,
    pub volume_total: Option<i64>,
}

/// Per-series macro statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub title: Scalar,
    pub units: Scalar,
    pub frequency: Scalar,
    pub count: usize,
    pub date_min: String,
    pub date_max: String,
    pub value_mean: Option<f64>,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub value_latest: Option<f64>,
}

/// `stats` block, one shape per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Stats {
    Price {
        date_range: DateRange,
        by_symbol: KeyedMap<SymbolStats>,
    },
    Series {
        date_range: DateRange,
        by_series: KeyedMap<SeriesStats>,
    },
    News {
        date_range: DateRange,
        articles_by_feed: KeyedMap<usize>,
        articles_by_day: BTreeMap<String, usize>,
    },
    Stress {
        date_range: DateRange,
        years: Vec<Scalar>,
        scenarios: Vec<Scalar>,
        record_count: usize,
    },
}

impl Stats {
    pub fn date_range(&self) -> &DateRange {
        match self {
            Stats::Price { date_range, .. }
            | Stats::Series { date_range, .. }
            | Stats::News { date_range, .. }
            | Stats::Stress { date_range, .. } => date_range,
        }
    }
}

/// One display-formatted output row, columns in projection order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRow(Vec<(String, Scalar)>);

impl DataRow {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, column: impl Into<String>, value: Scalar) {
        self.0.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.0.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }
}

impl Serialize for DataRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (c, v) in &self.0 {
            map.serialize_entry(c, v)?;
        }
        map.end()
    }
}

/// A finished, self-describing dataset document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub description: String,
    pub meta: Meta,
    pub stats: Stats,
    pub data: Vec<DataRow>,
}

/// A document with `data` omitted, as stored in the summary collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub description: String,
    pub meta: Meta,
    pub stats: Stats,
}

impl CanonicalDocument {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            name: self.name.clone(),
            doc_type: self.doc_type,
            description: self.description.clone(),
            meta: self.meta.clone(),
            stats: self.stats.clone(),
        }
    }
}
