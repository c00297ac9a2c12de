//! Publishing finished documents.
//!
//! [`JsonPublisher`] layout:
//! ```text
//! {public_dir}/{name}.json   full document, compact
//! {summary_path}             summary collection, pretty-printed
//! ```
//!
//! Writes are atomic: write to `.tmp`, then rename into place.

use dexprep_core::{CanonicalDocument, DocumentSummary};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("invalid dataset name '{0}' for an output file")]
    InvalidName(String),

    #[error("serialize '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Sink for canonical documents.
pub trait Publisher: Send + Sync {
    /// Called once before any document is emitted.
    fn prepare(&self) -> Result<(), PublishError> {
        Ok(())
    }

    /// Persist one full document (with `data`).
    fn emit(&self, name: &str, document: &CanonicalDocument) -> Result<(), PublishError>;

    /// Persist the run's summary collection.
    fn emit_summary_collection(&self, summaries: &[DocumentSummary]) -> Result<(), PublishError>;
}

/// Writes JSON files for a static site.
#[derive(Debug, Clone)]
pub struct JsonPublisher {
    public_dir: PathBuf,
    summary_path: PathBuf,
    clean: bool,
}

impl JsonPublisher {
    pub fn new(public_dir: impl Into<PathBuf>, summary_path: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
            summary_path: summary_path.into(),
            clean: false,
        }
    }

    /// Remove the public directory in [`Publisher::prepare`].
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Output path for a dataset's document.
    pub fn document_path(&self, name: &str) -> Result<PathBuf, PublishError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !valid {
            return Err(PublishError::InvalidName(name.to_string()));
        }
        Ok(self.public_dir.join(format!("{name}.json")))
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }
}

impl Publisher for JsonPublisher {
    fn prepare(&self) -> Result<(), PublishError> {
        if self.clean && self.public_dir.exists() {
            tracing::info!(dir = %self.public_dir.display(), "removing stale output");
            fs::remove_dir_all(&self.public_dir).map_err(|source| PublishError::Io {
                path: self.public_dir.clone(),
                source,
            })?;
        }
        create_dir(&self.public_dir)
    }

    fn emit(&self, name: &str, document: &CanonicalDocument) -> Result<(), PublishError> {
        let path = self.document_path(name)?;
        let bytes = serde_json::to_vec(document).map_err(|source| PublishError::Serialize {
            name: name.to_string(),
            source,
        })?;
        write_atomic(&path, &bytes)?;
        tracing::debug!(dataset = name, path = %path.display(), "wrote document");
        Ok(())
    }

    fn emit_summary_collection(&self, summaries: &[DocumentSummary]) -> Result<(), PublishError> {
        let bytes =
            serde_json::to_vec_pretty(summaries).map_err(|source| PublishError::Serialize {
                name: "summary collection".to_string(),
                source,
            })?;
        write_atomic(&self.summary_path, &bytes)?;
        tracing::info!(
            path = %self.summary_path.display(),
            datasets = summaries.len(),
            "wrote summary collection"
        );
        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<(), PublishError> {
    fs::create_dir_all(dir).map_err(|source| PublishError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write to `{path}.tmp`, then rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PublishError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    fs::write(&tmp_path, bytes).map_err(|source| PublishError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        PublishError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}
