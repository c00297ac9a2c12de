//! Registry-backed directory of dataset files.
//!
//! Layout:
//! ```text
//! {data_dir}/index.json
//! {data_dir}/<file_path from the registry entry>
//! ```
//!
//! `index.json` is `{"datasets": {key: {"name": ..., "file_path": ..., ...}}}`.
//! A dataset is found by registry key or by its `name` field. Every entry
//! field except `file_path` is passed on as the dataset's metadata.
//! Relative file paths resolve against `data_dir`, falling back to its
//! parent for registries that record paths from the project root.

use dexprep_core::Metadata;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use super::formats::read_table_file;
use super::{ProviderError, SourceTable, TableProvider, TableRequest};

/// Registry file name inside the data directory.
pub const REGISTRY_FILE: &str = "index.json";

const FILE_PATH_KEY: &str = "file_path";

#[derive(Debug, Deserialize)]
struct Registry {
    #[serde(default)]
    datasets: Map<String, Value>,
}

/// Serves tables listed in a data directory's registry.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    data_dir: PathBuf,
    entries: Vec<(String, Map<String, Value>)>,
}

impl DirectoryProvider {
    /// Open a data directory and read its registry.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let data_dir = data_dir.into();
        let path = data_dir.join(REGISTRY_FILE);
        let registry_err = |reason: String| ProviderError::Registry {
            path: path.clone(),
            reason,
        };

        let content = fs::read_to_string(&path).map_err(|e| registry_err(e.to_string()))?;
        let registry: Registry =
            serde_json::from_str(&content).map_err(|e| registry_err(e.to_string()))?;

        let mut entries = Vec::with_capacity(registry.datasets.len());
        for (key, entry) in registry.datasets {
            match entry {
                Value::Object(fields) => entries.push((key, fields)),
                _ => return Err(registry_err(format!("entry '{key}' is not an object"))),
            }
        }

        tracing::debug!(
            registry = %path.display(),
            datasets = entries.len(),
            "loaded dataset registry"
        );
        Ok(Self { data_dir, entries })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn entry(&self, dataset: &str) -> Option<&Map<String, Value>> {
        self.entries
            .iter()
            .find(|(key, fields)| {
                key == dataset || fields.get("name").and_then(Value::as_str) == Some(dataset)
            })
            .map(|(_, fields)| fields)
    }

    fn resolve(&self, file_path: &str) -> PathBuf {
        let relative = Path::new(file_path);
        if relative.is_absolute() {
            return relative.to_path_buf();
        }
        let direct = self.data_dir.join(relative);
        if direct.exists() {
            return direct;
        }
        match self.data_dir.parent() {
            Some(parent) if parent.join(relative).exists() => parent.join(relative),
            _ => direct,
        }
    }
}

impl TableProvider for DirectoryProvider {
    fn name(&self) -> &str {
        "directory"
    }

    fn get_table(&self, request: &TableRequest<'_>) -> Result<SourceTable, ProviderError> {
        let not_found = |reason: String| ProviderError::NotFound {
            dataset: request.dataset.to_string(),
            reason,
        };

        let entry = self.entry(request.dataset);
        // An explicit `file_path` param points straight at a file.
        let file_path = request
            .params
            .get(FILE_PATH_KEY)
            .or_else(|| entry.and_then(|fields| fields.get(FILE_PATH_KEY)))
            .and_then(Value::as_str)
            .ok_or_else(|| not_found("no registry entry".to_string()))?;

        let path = self.resolve(file_path);
        if !path.is_file() {
            return Err(not_found(format!("file not found at {}", path.display())));
        }

        let (table, format) = read_table_file(&path)?;

        let mut metadata = Metadata::new();
        for (key, value) in entry.into_iter().flatten() {
            if key != FILE_PATH_KEY {
                metadata.insert(key.clone(), value.clone());
            }
        }

        Ok(SourceTable {
            table,
            metadata,
            format: format.as_str().to_string(),
        })
    }

    fn dataset_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(key, fields)| {
                fields
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(key)
                    .to_string()
            })
            .collect()
    }
}
