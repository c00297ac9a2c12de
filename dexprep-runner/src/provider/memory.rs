//! In-process table provider for embedding and tests.

use dexprep_core::{Metadata, RawTable};

use super::{ProviderError, SourceTable, TableProvider, TableRequest};

/// Tables held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    tables: Vec<(String, SourceTable)>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a dataset.
    pub fn insert(&mut self, name: impl Into<String>, table: RawTable, metadata: Metadata) {
        let name = name.into();
        let source = SourceTable {
            table,
            metadata,
            format: "table".to_string(),
        };
        match self.tables.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = source,
            None => self.tables.push((name, source)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, table: RawTable, metadata: Metadata) -> Self {
        self.insert(name, table, metadata);
        self
    }
}

impl TableProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_table(&self, request: &TableRequest<'_>) -> Result<SourceTable, ProviderError> {
        self.tables
            .iter()
            .find(|(name, _)| name == request.dataset)
            .map(|(_, source)| source.clone())
            .ok_or_else(|| ProviderError::NotFound {
                dataset: request.dataset.to_string(),
                reason: "not loaded".to_string(),
            })
    }

    fn dataset_names(&self) -> Vec<String> {
        self.tables.iter().map(|(name, _)| name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn test_insert_replaces_existing() {
        let mut provider = MemoryProvider::new();
        provider.insert("a", RawTable::new(["x"]).unwrap(), Metadata::new());
        provider.insert("b", RawTable::new(["y"]).unwrap(), Metadata::new());
        provider.insert("a", RawTable::new(["z"]).unwrap(), Metadata::new());

        assert_eq!(provider.dataset_names(), vec!["a", "b"]);
        let params = Map::new();
        let source = provider.get_table(&TableRequest::new("a", &params)).unwrap();
        assert_eq!(source.table.columns(), ["z"]);
    }

    #[test]
    fn test_missing_dataset_is_not_found() {
        let params = Map::new();
        let err = MemoryProvider::new()
            .get_table(&TableRequest::new("nope", &params))
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
