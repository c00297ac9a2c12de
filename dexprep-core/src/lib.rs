//! dexprep core: raw tables in, canonical dataset documents out.
//!
//! This crate holds all of the decision logic of the data-preparation
//! pipeline:
//! - Raw table model with loosely typed cells
//! - Timestamp coercion and display formatting
//! - Category classification (price, macro, news, stress, unknown)
//! - One descriptor-driven normalizer with four statistic builders
//! - The canonical document contract shared with publishers

pub mod aggregate;
pub mod category;
pub mod document;
pub mod metadata;
pub mod normalize;
pub mod table;
pub mod temporal;

pub use category::{classify, Category, Classifier, MacroSource};
pub use document::{
    CanonicalDocument, DataRow, DateRange, DocumentSummary, DocumentType, KeyedMap, Meta,
    SeriesStats, Stats, SymbolStats,
};
pub use metadata::Metadata;
pub use normalize::{normalize, NormalizeContext, NormalizeError};
pub use table::{RawTable, Scalar, TableError};
