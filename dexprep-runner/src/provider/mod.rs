//! Table providers: where raw tables and their metadata come from.
//!
//! The pipeline only sees the [`TableProvider`] trait, so the storage layer
//! can be swapped (registry directory, in-memory fixtures) without touching
//! orchestration.

mod directory;
mod formats;
mod memory;

pub use directory::{DirectoryProvider, REGISTRY_FILE};
pub use formats::{read_table_file, TableFormat};
pub use memory::MemoryProvider;

use dexprep_core::{Metadata, RawTable, TableError};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// No backing data for the dataset. The pipeline skips it.
    #[error("dataset '{dataset}' not found: {reason}")]
    NotFound { dataset: String, reason: String },

    #[error("registry {}: {reason}", path.display())]
    Registry { path: PathBuf, reason: String },

    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("json {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("json {}: expected an array of records", path.display())]
    NotRecords { path: PathBuf },

    #[error("parquet {}: {reason}", path.display())]
    Parquet { path: PathBuf, reason: String },

    #[error("unsupported table format '{extension}' for {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("malformed table {}: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }
}

/// What the pipeline asks a provider for.
#[derive(Debug, Clone, Copy)]
pub struct TableRequest<'a> {
    pub dataset: &'a str,
    /// Free-form provider parameters from the dataset's config entry.
    pub params: &'a Map<String, Value>,
}

impl<'a> TableRequest<'a> {
    pub fn new(dataset: &'a str, params: &'a Map<String, Value>) -> Self {
        Self { dataset, params }
    }
}

/// A raw table with the metadata its source recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub table: RawTable,
    pub metadata: Metadata,
    /// Format tag stamped into the document's `meta.format`.
    pub format: String,
}

/// Source of raw tables keyed by dataset name.
pub trait TableProvider: Send + Sync {
    /// Short tag stamped into each document's `meta.location`.
    fn name(&self) -> &str;

    /// Load one dataset's table and metadata.
    fn get_table(&self, request: &TableRequest<'_>) -> Result<SourceTable, ProviderError>;

    /// Names of every dataset this provider can serve, in its own order.
    fn dataset_names(&self) -> Vec<String>;
}
