//! Per-category normalizer descriptors.
//!
//! The four normalizers share one pipeline (private copy, column resolution,
//! date coercion, key grouping, ordering, projection). What differs between
//! categories is captured here as data.

use crate::document::DocumentType;

/// How the date column is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMode {
    /// Coerce to a timestamp; an unparseable value fails the dataset.
    Strict,
    /// Coerce to a timestamp; rows that fail to parse are dropped.
    DropUnparseable,
    /// Keep as an opaque period label (e.g. `2025 Q1`), never parsed.
    PeriodLabel,
}

/// Ordering of the published `data` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrder {
    /// Ascending by key column, then by date.
    KeyThenDate,
    /// Most recent first, capped; ties keep table order.
    NewestFirst { limit: usize },
    /// Ascending by whichever of these columns exist, in priority order.
    PresentColumns(&'static [&'static str]),
}

/// Which statistic set a category publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatSet {
    Price,
    Series,
    News,
    Stress,
}

/// Column projection for `data` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Only these columns, in this order, skipping any that are absent.
    Columns(&'static [&'static str]),
    /// Every public column in table order.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub document_type: DocumentType,
    /// Column(s) identifying a logical series within the dataset.
    pub key_columns: &'static [&'static str],
    /// Whether a table without the key column degrades to an empty document.
    pub key_required: bool,
    pub date_column: &'static str,
    pub date_mode: DateMode,
    pub projection: Projection,
    pub order: DataOrder,
    pub stats: StatSet,
}

pub const NEWS_DATA_LIMIT: usize = 30;

pub const PRICE: Descriptor = Descriptor {
    document_type: DocumentType::Ohlcv,
    key_columns: &["symbol"],
    key_required: true,
    date_column: "date",
    date_mode: DateMode::Strict,
    projection: Projection::Columns(&["symbol", "date", "open", "high", "low", "close", "volume"]),
    order: DataOrder::KeyThenDate,
    stats: StatSet::Price,
};

const SERIES_PROJECTION: Projection =
    Projection::Columns(&["series_id", "date", "value", "title", "units"]);

pub const FRED: Descriptor = Descriptor {
    document_type: DocumentType::Fred,
    key_columns: &["series_id"],
    key_required: true,
    date_column: "date",
    date_mode: DateMode::Strict,
    projection: SERIES_PROJECTION,
    order: DataOrder::KeyThenDate,
    stats: StatSet::Series,
};

pub const BLS: Descriptor = Descriptor {
    document_type: DocumentType::Bls,
    ..FRED
};

pub const NEWS: Descriptor = Descriptor {
    document_type: DocumentType::Rss,
    key_columns: &["feed_name"],
    key_required: false,
    date_column: "published",
    date_mode: DateMode::DropUnparseable,
    projection: Projection::Columns(&["title", "link", "published", "feed_name", "author"]),
    order: DataOrder::NewestFirst {
        limit: NEWS_DATA_LIMIT,
    },
    stats: StatSet::News,
};

pub const STRESS: Descriptor = Descriptor {
    document_type: DocumentType::FedStress,
    key_columns: &["year", "table"],
    key_required: false,
    date_column: "date",
    date_mode: DateMode::PeriodLabel,
    projection: Projection::All,
    order: DataOrder::PresentColumns(&["year", "table", "date"]),
    stats: StatSet::Stress,
};

impl Descriptor {
    /// The single key column of a keyed category.
    pub fn key_column(&self) -> &'static str {
        self.key_columns[0]
    }
}
